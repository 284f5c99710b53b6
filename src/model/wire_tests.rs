use super::*;
use serde_json::json;

const LEGACY: &str = r#"{
    "year": 2025,
    "months": [4, "2025年1月", "202505"],
    "roles": {
        "zeta": {"type": "employee", "count": 2},
        "alpha": {"type": "part_timer", "count": 1}
    },
    "daily_requirements": {
        "night": {"normal_min": 1, "normal_max": 2, "friend_min": 0, "friend_max": 1},
        "day": {"normal_min": 2, "normal_max": 2, "friend_min": 1, "friend_max": 1}
    },
    "role_capability": {
        "night": {"primary": ["zeta"], "secondary": ["alpha"]},
        "day": {"primary": ["alpha"], "secondary": [], "third": ["zeta"]}
    },
    "work_constraints": {
        "employee": {"weekly_days_off": 2, "max_consecutive_days": 5, "min_monthly_workdays": 18},
        "part_timer": {"weekly_days_off": 0, "max_consecutive_days": 3, "min_monthly_workdays": 0},
        "dummy": {"weekly_days_off": 0, "max_consecutive_days": 31, "min_monthly_workdays": 0}
    },
    "holiday_calendar": "rokuyou"
}"#;

fn legacy_doc() -> ConfigDocument {
    ConfigDocument::from_json_slice(LEGACY.as_bytes()).expect("parse legacy")
}

fn legacy_json() -> Value {
    serde_json::from_str(LEGACY).expect("legacy json")
}

#[test]
fn missing_order_lists_follow_key_order() {
    let doc = legacy_doc();
    assert_eq!(doc.roles_order(), ["zeta", "alpha"]);
    assert_eq!(doc.requirement_order(), ["night", "day"]);
}

#[test]
fn legacy_months_are_normalized_on_load() {
    let doc = legacy_doc();
    assert_eq!(doc.months(), ["202501", "202504", "202505"]);
}

#[test]
fn out_of_range_year_drops_bare_months_and_fails_validation() {
    let mut value = legacy_json();
    value["year"] = json!(i64::MAX);
    value["months"] = json!(["1", "4", "202604"]);
    let doc = ConfigDocument::from_json_slice(value.to_string().as_bytes()).expect("parse");
    assert_eq!(doc.year(), i64::MAX);
    assert_eq!(doc.months(), ["202604"]);

    let violations = crate::validate::validate(&doc);
    let kinds: Vec<_> = violations.iter().map(|violation| violation.kind).collect();
    assert_eq!(kinds, vec![crate::validate::ViolationKind::InvalidYear]);
}

#[test]
fn unknown_top_level_fields_survive_a_round_trip() {
    let doc = legacy_doc();
    assert_eq!(
        doc.extra_fields().get("holiday_calendar"),
        Some(&json!("rokuyou"))
    );
    let text = doc.to_json_pretty().expect("serialize");
    let reparsed = ConfigDocument::from_json_slice(text.as_bytes()).expect("reparse");
    assert_eq!(reparsed, doc);
    let value: Value = serde_json::from_str(&text).expect("json");
    assert_eq!(value["holiday_calendar"], json!("rokuyou"));
    assert_eq!(value["role_capability"]["day"]["third"], json!(["zeta"]));
}

#[test]
fn maps_are_written_in_order_list_order() {
    let mut doc = legacy_doc();
    doc.reorder(
        crate::model::OrderList::Requirements,
        vec!["day".to_string(), "night".to_string()],
    )
    .expect("reorder");
    let text = doc.to_json_pretty().expect("serialize");
    let day = text.find("\"day\"").expect("day key");
    let night = text.find("\"night\"").expect("night key");
    assert!(day < night, "day should precede night:\n{text}");
    assert!(text.contains("\"requirementOrder\""));
    assert!(text.contains("\"rolesOrder\""));
}

#[test]
fn optimize_headcount_is_omitted_when_unset() {
    let doc = legacy_doc();
    let value = serde_json::to_value(&doc).expect("to value");
    assert!(value.get("optimize_headcount").is_none());

    let mut doc = doc;
    doc.set_optimize_headcount(Some(true));
    let value = serde_json::to_value(&doc).expect("to value");
    assert_eq!(value["optimize_headcount"], json!(true));
}

#[test]
fn missing_required_sections_are_schema_errors() {
    let mut value = legacy_json();
    value
        .as_object_mut()
        .expect("object")
        .remove("work_constraints");
    let err = ConfigDocument::from_json_value(value).expect_err("missing section");
    assert_eq!(err.kind(), "Schema");

    let err = ConfigDocument::from_json_slice(b"{\"year\": \"soon\"}").expect_err("bad year");
    assert_eq!(err.kind(), "Schema");
}

#[test]
fn unknown_worker_type_row_is_rejected() {
    let mut value = legacy_json();
    value["work_constraints"]["contractor"] =
        json!({"weekly_days_off": 1, "max_consecutive_days": 5, "min_monthly_workdays": 10});
    assert!(ConfigDocument::from_json_value(value).is_err());
}

#[test]
fn example_document_round_trips() {
    let doc = ConfigDocument::example();
    let text = doc.to_json_pretty().expect("serialize");
    let reparsed = ConfigDocument::from_json_slice(text.as_bytes()).expect("reparse");
    assert_eq!(reparsed, doc);
}
