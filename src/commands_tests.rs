use super::*;
use crate::model::{OrderList, Tier, WorkerType};
use clap::Parser;

fn op(words: &[&str]) -> EditOp {
    let mut argv = vec!["shiftdesk", "edit", "main"];
    argv.extend_from_slice(words);
    match RootArgs::try_parse_from(argv).expect("parse").command {
        Command::Edit(edit) => edit.op,
        other => panic!("unexpected command {other:?}"),
    }
}

fn kind(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<ShiftError>().map(ShiftError::kind)
}

#[test]
fn removing_last_role_reports_unfilled_requirements() {
    let mut doc = ConfigDocument::example();
    let summary = apply_edit(&mut doc, op(&["role", "remove", "霊柩運送員"])).expect("remove");
    assert!(summary.contains("now unfilled: 運送"), "{summary}");
    assert!(doc.role("霊柩運送員").is_none());
}

#[test]
fn duplicate_capability_is_reported_not_failed() {
    let mut doc = ConfigDocument::example();
    let summary = apply_edit(&mut doc, op(&["capability", "add", "売店", "売店従業員"]))
        .expect("duplicate add");
    assert!(summary.contains("nothing changed"), "{summary}");
    let entry = doc.capability("売店").expect("entry");
    assert_eq!(entry.tier(Tier::Primary), ["売店従業員"]);
}

#[test]
fn band_edit_keeps_unspecified_fields() {
    let mut doc = ConfigDocument::example();
    apply_edit(&mut doc, op(&["requirement", "set", "運送", "--normal-max", "3"])).expect("set");
    assert_eq!(
        doc.requirement("運送").copied(),
        Some(DailyRequirement::new(2, 3, 2, 2))
    );

    let before = doc.clone();
    let err = apply_edit(&mut doc, op(&["requirement", "set", "運送", "--normal-max", "1"]))
        .expect_err("inverted band");
    assert_eq!(kind(&err), Some("InvalidBand"));
    assert_eq!(doc, before);
}

#[test]
fn role_set_requires_a_field_and_a_known_role() {
    let mut doc = ConfigDocument::example();
    assert!(apply_edit(&mut doc, op(&["role", "set", "統括"])).is_err());
    let err = apply_edit(&mut doc, op(&["role", "set", "幽霊", "--count", "2"]))
        .expect_err("unknown role");
    assert_eq!(kind(&err), Some("UnknownKey"));

    apply_edit(&mut doc, op(&["role", "set", "統括", "--count", "2", "--type", "part_timer"]))
        .expect("set role");
    let role = doc.role("統括").expect("role");
    assert_eq!(role.count, 2);
    assert_eq!(role.role_type, crate::model::RoleType::PartTimer);
}

#[test]
fn scope_normalizes_month_tokens() {
    let mut doc = ConfigDocument::example();
    let summary = apply_edit(&mut doc, op(&["scope", "--year", "2026", "202605", "4"]))
        .expect("scope");
    assert_eq!(doc.year(), 2026);
    assert_eq!(doc.months(), ["202604", "202605"]);
    assert!(summary.contains("202604, 202605"), "{summary}");
}

#[test]
fn reorder_and_constraint_errors_leave_document_unchanged() {
    let mut doc = ConfigDocument::example();
    let before = doc.clone();
    let err = apply_edit(&mut doc, op(&["reorder", "requirements", "運送", "清掃"]))
        .expect_err("partial permutation");
    assert_eq!(kind(&err), Some("InvalidPermutation"));
    let err = apply_edit(
        &mut doc,
        op(&["constraint", "part_timer", "--max-consecutive-days", "0"]),
    )
    .expect_err("zero consecutive days");
    assert_eq!(kind(&err), Some("InvalidConstraint"));
    assert_eq!(doc, before);

    let mut reversed = doc.order(OrderList::Roles).to_vec();
    reversed.reverse();
    let mut words = vec!["reorder", "roles"];
    words.extend(reversed.iter().map(String::as_str));
    apply_edit(&mut doc, op(&words)).expect("reorder");
    assert_eq!(doc.roles_order(), reversed.as_slice());

    apply_edit(&mut doc, op(&["constraint", "dummy", "--weekly-days-off", "1"])).expect("constraint");
    assert_eq!(doc.work_constraints().get(WorkerType::Dummy).weekly_days_off, 1);
    assert_eq!(
        doc.work_constraints().get(WorkerType::Dummy).max_consecutive_days,
        31
    );
}

#[test]
fn headcount_flag_round_trips() {
    let mut doc = ConfigDocument::example();
    apply_edit(&mut doc, op(&["headcount", "--off"])).expect("off");
    assert_eq!(doc.optimize_headcount(), Some(false));
    apply_edit(&mut doc, op(&["headcount", "--on"])).expect("on");
    assert_eq!(doc.optimize_headcount(), Some(true));
    apply_edit(&mut doc, op(&["headcount", "--unset"])).expect("unset");
    assert_eq!(doc.optimize_headcount(), None);
}
