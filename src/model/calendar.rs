//! Calendar scope normalization.
//!
//! A fiscal year runs from April of `year` through March of `year + 1`.
//! Months are stored as `YYYYMM` tokens; older documents carry bare month
//! numbers or `YYYY年M月` labels, which are rewritten on load.
use regex::Regex;
use std::sync::OnceLock;

/// First calendar month of the fiscal year.
pub const FISCAL_START_MONTH: u32 = 4;

fn label_regex() -> &'static Regex {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    LABEL.get_or_init(|| Regex::new(r"^(\d{4})年(\d{1,2})月$").expect("regex for month labels"))
}

pub fn is_valid_year(year: i64) -> bool {
    (1000..=9999).contains(&year)
}

/// Parse one month token into canonical `YYYYMM`, resolving bare month
/// numbers against the fiscal `year`.
///
/// Bare months need a valid `year` to resolve against; with an out-of-range
/// year they are rejected and the year itself is reported by validation.
/// `YYYYMM` tokens must carry a four-digit year of their own.
pub fn parse_month_token(token: &str, year: i64) -> Option<String> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }
    if token.chars().all(|c| c.is_ascii_digit()) {
        return match token.len() {
            1 | 2 => {
                let month: u32 = token.parse().ok()?;
                if !(1..=12).contains(&month) || !is_valid_year(year) {
                    return None;
                }
                let resolved_year = if month < FISCAL_START_MONTH {
                    year + 1
                } else {
                    year
                };
                Some(format_token(resolved_year, month))
            }
            6 => {
                let prefix: i64 = token[..4].parse().ok()?;
                let month: u32 = token[4..].parse().ok()?;
                (is_valid_year(prefix) && (1..=12).contains(&month)).then(|| token.to_string())
            }
            _ => None,
        };
    }
    let caps = label_regex().captures(token)?;
    let label_year: i64 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    if !(1..=12).contains(&month) {
        return None;
    }
    Some(format_token(label_year, month))
}

/// Normalize tokens to a sorted, de-duplicated `YYYYMM` list.
///
/// Returns the canonical months and the tokens that could not be parsed.
pub fn normalize_months<S: AsRef<str>>(year: i64, tokens: &[S]) -> (Vec<String>, Vec<String>) {
    let mut months = Vec::new();
    let mut rejected = Vec::new();
    for token in tokens {
        match parse_month_token(token.as_ref(), year) {
            Some(month) => months.push(month),
            None => rejected.push(token.as_ref().to_string()),
        }
    }
    months.sort();
    months.dedup();
    (months, rejected)
}

/// The twelve `YYYYMM` tokens of the fiscal year starting in `year`.
pub fn fiscal_months(year: i64) -> Vec<String> {
    (0..12u32)
        .map(|offset| {
            let month = (FISCAL_START_MONTH - 1 + offset) % 12 + 1;
            let resolved_year = if month < FISCAL_START_MONTH {
                year.saturating_add(1)
            } else {
                year
            };
            format_token(resolved_year, month)
        })
        .collect()
}

pub fn in_fiscal_window(token: &str, year: i64) -> bool {
    is_valid_year(year) && fiscal_months(year).iter().any(|month| month == token)
}

fn format_token(year: i64, month: u32) -> String {
    format!("{year:04}{month:02}")
}

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod tests;
