use super::*;
use crate::model::{RoleType, Tier};

fn parse(text: &str) -> ConfigDocument {
    ConfigDocument::from_json_slice(text.as_bytes()).expect("parse document")
}

const BROKEN: &str = r#"{
    "year": 2025,
    "months": ["202504", "202604"],
    "roles": {
        "lead": {"type": "employee", "count": 1},
        "spare": {"type": "part_timer", "count": 2}
    },
    "daily_requirements": {
        "desk": {"normal_min": 3, "normal_max": 1, "friend_min": 1, "friend_max": 1},
        "orphan": {"normal_min": 1, "normal_max": 1, "friend_min": 1, "friend_max": 1}
    },
    "role_capability": {
        "desk": {"primary": ["lead", "lead", "ghost"], "secondary": []},
        "stray": {"primary": [], "secondary": []}
    },
    "work_constraints": {
        "employee": {"weekly_days_off": 2, "max_consecutive_days": 0, "min_monthly_workdays": 20},
        "part_timer": {"weekly_days_off": 0, "max_consecutive_days": 3, "min_monthly_workdays": 0},
        "dummy": {"weekly_days_off": 0, "max_consecutive_days": 31, "min_monthly_workdays": 0}
    },
    "rolesOrder": ["lead", "lead", "gone"],
    "requirementOrder": ["desk", "orphan"]
}"#;

#[test]
fn example_document_is_valid() {
    let doc = ConfigDocument::example();
    assert_eq!(validate(&doc), Vec::new());
    let report = review(&doc);
    assert!(report.is_valid());
    assert!(report.warnings.is_empty(), "{:?}", report.warnings);
}

#[test]
fn edited_document_stays_valid() {
    let mut doc = ConfigDocument::example();
    doc.add_role("夜間警備", RoleType::Employee).expect("add role");
    doc.add_daily_requirement("警備").expect("add requirement");
    doc.add_capability("警備", Tier::Primary, "夜間警備").expect("capability");
    doc.delete_role("清掃員").expect("delete role");
    assert_eq!(validate(&doc), Vec::new());
}

#[test]
fn broken_document_reports_every_check_in_order() {
    let doc = parse(BROKEN);
    let kinds: Vec<ViolationKind> = validate(&doc).into_iter().map(|v| v.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ViolationKind::UnknownRoleReference,
            ViolationKind::OrderMismatch,
            ViolationKind::InvalidBand,
            ViolationKind::InvalidConstraint,
            ViolationKind::DuplicateTierEntry,
            ViolationKind::CapabilityMismatch,
            ViolationKind::CapabilityMismatch,
            ViolationKind::MonthOutOfWindow,
        ]
    );
}

#[test]
fn order_mismatch_names_missing_stale_and_duplicated_keys() {
    let doc = parse(BROKEN);
    let violation = validate(&doc)
        .into_iter()
        .find(|v| v.kind == ViolationKind::OrderMismatch)
        .expect("order violation");
    assert_eq!(violation.path, "rolesOrder");
    assert!(violation.message.contains("spare"), "{}", violation.message);
    assert!(violation.message.contains("gone"), "{}", violation.message);
    assert!(violation.message.contains("duplicated"), "{}", violation.message);
}

#[test]
fn review_separates_advisories() {
    let doc = parse(BROKEN);
    let report = review(&doc);
    assert!(!report.is_valid());
    let subjects: Vec<(WarningKind, &str)> = report
        .warnings
        .iter()
        .map(|w| (w.kind, w.subject.as_str()))
        .collect();
    assert_eq!(
        subjects,
        vec![(WarningKind::UnusedRole, "spare")]
    );
}

#[test]
fn unused_roles_follow_roles_order() {
    let mut doc = ConfigDocument::empty(2025);
    doc.add_role("b", RoleType::Employee).expect("b");
    doc.add_role("a", RoleType::Employee).expect("a");
    doc.add_role("c", RoleType::PartTimer).expect("c");
    doc.add_daily_requirement("desk").expect("desk");
    doc.add_capability("desk", Tier::Secondary, "a").expect("cap");
    assert_eq!(unused_roles(&doc), vec!["b".to_string(), "c".to_string()]);
    assert_eq!(validate(&doc), Vec::new(), "unused roles never block");
}

#[test]
fn unfilled_requirement_is_a_warning() {
    let mut doc = ConfigDocument::empty(2025);
    doc.add_daily_requirement("gate").expect("gate");
    let report = review(&doc);
    assert!(report.is_valid());
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].kind, WarningKind::UnfilledRequirement);
}

#[test]
fn invalid_year_is_reported() {
    let text = BROKEN.replace("\"year\": 2025", "\"year\": 25");
    let doc = parse(&text);
    let violations = validate(&doc);
    assert!(violations
        .iter()
        .any(|v| v.kind == ViolationKind::InvalidYear && v.path == "year"));
}
