//! Cross-entity integrity checks for configuration documents.
//!
//! `validate` is pure and collects every blocking violation in check order:
//! - **References**: capability tiers only name existing roles.
//! - **Ordering**: `rolesOrder`/`requirementOrder` are permutations of their key sets.
//! - **Bands**: each requirement has `max >= min` for both day types.
//! - **Constraints**: every worker type allows at least one consecutive day.
//! - **Tiers**: no role appears twice within one tier.
//! - **Scope**: requirements and capability entries pair up 1:1, the year is
//!   four digits, and months fall inside the fiscal window.
//!
//! Unused roles and unfilled requirements are advisory and only surface
//! through [`review`].
use crate::model::{in_fiscal_window, is_valid_year, ConfigDocument, OrderList, Tier, WorkerType};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    UnknownRoleReference,
    OrderMismatch,
    InvalidBand,
    InvalidConstraint,
    DuplicateTierEntry,
    CapabilityMismatch,
    InvalidYear,
    MonthOutOfWindow,
}

/// One blocking finding, located by a dotted path into the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Violation {
    pub kind: ViolationKind,
    pub path: String,
    pub message: String,
}

impl Violation {
    fn new(kind: ViolationKind, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            path: path.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnusedRole,
    UnfilledRequirement,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    pub kind: WarningKind,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub violations: Vec<Violation>,
    pub warnings: Vec<Warning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.violations.is_empty()
    }
}

pub fn validate(doc: &ConfigDocument) -> Vec<Violation> {
    let mut violations = Vec::new();
    check_role_references(doc, &mut violations);
    check_order_lists(doc, &mut violations);
    check_bands(doc, &mut violations);
    check_work_constraints(doc, &mut violations);
    check_tier_duplicates(doc, &mut violations);
    check_scope(doc, &mut violations);
    violations
}

/// Roles no capability tier references, in `rolesOrder` order.
pub fn unused_roles(doc: &ConfigDocument) -> Vec<String> {
    let referenced: BTreeSet<&str> = doc
        .role_capability()
        .values()
        .flat_map(|capability| Tier::ALL.into_iter().flat_map(move |tier| capability.tier(tier)))
        .map(String::as_str)
        .collect();
    let mut unused: Vec<String> = doc
        .roles_order()
        .iter()
        .filter(|name| doc.roles().contains_key(name.as_str()))
        .filter(|name| !referenced.contains(name.as_str()))
        .cloned()
        .collect();
    for name in doc.roles().keys() {
        if !referenced.contains(name.as_str()) && !unused.contains(name) {
            unused.push(name.clone());
        }
    }
    unused
}

/// Blocking violations plus advisory warnings.
pub fn review(doc: &ConfigDocument) -> ValidationReport {
    let mut warnings: Vec<Warning> = unused_roles(doc)
        .into_iter()
        .map(|role| Warning {
            kind: WarningKind::UnusedRole,
            message: format!("role {role:?} is not eligible for any requirement"),
            subject: role,
        })
        .collect();
    for key in doc.requirement_order() {
        if let Some(capability) = doc.capability(key) {
            if capability.is_unfilled() {
                warnings.push(Warning {
                    kind: WarningKind::UnfilledRequirement,
                    subject: key.clone(),
                    message: format!("requirement {key:?} has no eligible role"),
                });
            }
        }
    }
    ValidationReport {
        violations: validate(doc),
        warnings,
    }
}

fn check_role_references(doc: &ConfigDocument, out: &mut Vec<Violation>) {
    for (key, capability) in doc.role_capability() {
        for tier in Tier::ALL {
            for role in capability.tier(tier) {
                if doc.role(role).is_none() {
                    out.push(Violation::new(
                        ViolationKind::UnknownRoleReference,
                        format!("role_capability.{key}.{tier}"),
                        format!("references unknown role {role:?}"),
                    ));
                }
            }
        }
    }
}

fn check_order_lists(doc: &ConfigDocument, out: &mut Vec<Violation>) {
    let role_keys: BTreeSet<&str> = doc.roles().keys().map(String::as_str).collect();
    let requirement_keys: BTreeSet<&str> =
        doc.daily_requirements().keys().map(String::as_str).collect();
    for (list, keys) in [
        (OrderList::Roles, role_keys),
        (OrderList::Requirements, requirement_keys),
    ] {
        if let Some(detail) = crate::model::permutation_mismatch(&keys, doc.order(list)) {
            out.push(Violation::new(
                ViolationKind::OrderMismatch,
                list.as_str(),
                detail,
            ));
        }
    }
}

fn check_bands(doc: &ConfigDocument, out: &mut Vec<Violation>) {
    for (key, band) in doc.daily_requirements() {
        for detail in band.band_errors() {
            out.push(Violation::new(
                ViolationKind::InvalidBand,
                format!("daily_requirements.{key}"),
                detail,
            ));
        }
    }
}

fn check_work_constraints(doc: &ConfigDocument, out: &mut Vec<Violation>) {
    for worker_type in WorkerType::ALL {
        if doc.work_constraints().get(worker_type).max_consecutive_days == 0 {
            out.push(Violation::new(
                ViolationKind::InvalidConstraint,
                format!("work_constraints.{worker_type}.max_consecutive_days"),
                "must be at least 1",
            ));
        }
    }
}

fn check_tier_duplicates(doc: &ConfigDocument, out: &mut Vec<Violation>) {
    for (key, capability) in doc.role_capability() {
        for tier in Tier::ALL {
            let mut seen = BTreeSet::new();
            let mut reported = BTreeSet::new();
            for role in capability.tier(tier) {
                if !seen.insert(role.as_str()) && reported.insert(role.as_str()) {
                    out.push(Violation::new(
                        ViolationKind::DuplicateTierEntry,
                        format!("role_capability.{key}.{tier}"),
                        format!("role {role:?} is listed more than once"),
                    ));
                }
            }
        }
    }
}

fn check_scope(doc: &ConfigDocument, out: &mut Vec<Violation>) {
    for key in doc.daily_requirements().keys() {
        if doc.capability(key).is_none() {
            out.push(Violation::new(
                ViolationKind::CapabilityMismatch,
                format!("role_capability.{key}"),
                "requirement has no capability entry",
            ));
        }
    }
    for key in doc.role_capability().keys() {
        if doc.requirement(key).is_none() {
            out.push(Violation::new(
                ViolationKind::CapabilityMismatch,
                format!("daily_requirements.{key}"),
                "capability entry has no requirement",
            ));
        }
    }
    if !is_valid_year(doc.year()) {
        out.push(Violation::new(
            ViolationKind::InvalidYear,
            "year",
            format!("{} is not a four-digit year", doc.year()),
        ));
        return;
    }
    for month in doc.months() {
        if !in_fiscal_window(month, doc.year()) {
            out.push(Violation::new(
                ViolationKind::MonthOutOfWindow,
                "months",
                format!(
                    "{month} is outside fiscal year {} (April {} to March {})",
                    doc.year(),
                    doc.year(),
                    doc.year() + 1
                ),
            ));
        }
    }
}

#[cfg(test)]
#[path = "validate_tests.rs"]
mod tests;
