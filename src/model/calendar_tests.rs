use super::*;

#[test]
fn normalize_months_rewrites_legacy_tokens() {
    let (months, rejected) = normalize_months(2025, &["4", "2025年1月", "202505"]);
    assert_eq!(months, vec!["202501", "202504", "202505"]);
    assert!(rejected.is_empty());
}

#[test]
fn bare_months_resolve_against_fiscal_year() {
    assert_eq!(parse_month_token("1", 2025).as_deref(), Some("202601"));
    assert_eq!(parse_month_token("03", 2025).as_deref(), Some("202603"));
    assert_eq!(parse_month_token("12", 2025).as_deref(), Some("202512"));
    assert_eq!(parse_month_token("4", 2025).as_deref(), Some("202504"));
}

#[test]
fn malformed_tokens_are_rejected() {
    for token in ["0", "13", "202513", "000001", "099912", "2025", "April", "2025年13月", ""] {
        assert_eq!(parse_month_token(token, 2025), None, "token {token:?}");
    }
    let (months, rejected) = normalize_months(2025, &["5", "bogus"]);
    assert_eq!(months, vec!["202505"]);
    assert_eq!(rejected, vec!["bogus"]);
}

#[test]
fn duplicates_collapse_after_normalization() {
    let (months, _) = normalize_months(2025, &["4", "202504", "2025年4月"]);
    assert_eq!(months, vec!["202504"]);
}

#[test]
fn fiscal_window_spans_april_to_march() {
    let months = fiscal_months(2025);
    assert_eq!(months.len(), 12);
    assert_eq!(months.first().map(String::as_str), Some("202504"));
    assert_eq!(months.last().map(String::as_str), Some("202603"));
    assert!(in_fiscal_window("202512", 2025));
    assert!(!in_fiscal_window("202501", 2025));
    assert!(!in_fiscal_window("202604", 2025));
}

#[test]
fn year_must_have_four_digits() {
    assert!(is_valid_year(2025));
    assert!(!is_valid_year(999));
    assert!(!is_valid_year(10000));
    assert!(!is_valid_year(-2025));
}

#[test]
fn bare_months_need_a_valid_fiscal_year() {
    assert_eq!(parse_month_token("1", i64::MAX), None);
    assert_eq!(parse_month_token("4", -1), None);
    assert_eq!(parse_month_token("202601", i64::MAX).as_deref(), Some("202601"));
    assert!(!in_fiscal_window("202601", i64::MAX));
    assert_eq!(fiscal_months(i64::MAX).len(), 12);
}
