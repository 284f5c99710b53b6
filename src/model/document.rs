//! The configuration aggregate and its mutation operations.
//!
//! Roles, requirements, capability entries, and the two ordering lists are
//! kept consistent here: each operation either applies completely or returns
//! an error and leaves the document untouched.
use super::calendar::{is_valid_year, normalize_months};
use super::{
    DailyRequirement, OrderList, Role, RoleCapability, RoleType, Tier, WorkConstraint,
    WorkConstraints, WorkerType,
};
use crate::error::{Result, ShiftError};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};

/// Outcome of adding a role to a capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapabilityAdd {
    Added,
    /// The role was already in the tier; nothing changed.
    Duplicate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigDocument {
    pub(super) year: i64,
    pub(super) months: Vec<String>,
    pub(super) roles: BTreeMap<String, Role>,
    pub(super) daily_requirements: BTreeMap<String, DailyRequirement>,
    pub(super) role_capability: BTreeMap<String, RoleCapability>,
    pub(super) work_constraints: WorkConstraints,
    pub(super) roles_order: Vec<String>,
    pub(super) requirement_order: Vec<String>,
    pub(super) optimize_headcount: Option<bool>,
    pub(super) extra: BTreeMap<String, Value>,
}

impl Default for ConfigDocument {
    fn default() -> Self {
        Self::example()
    }
}

impl ConfigDocument {
    /// A document with no roles or requirements and default work constraints.
    pub fn empty(year: i64) -> Self {
        Self {
            year,
            months: Vec::new(),
            roles: BTreeMap::new(),
            daily_requirements: BTreeMap::new(),
            role_capability: BTreeMap::new(),
            work_constraints: WorkConstraints::default(),
            roles_order: Vec::new(),
            requirement_order: Vec::new(),
            optimize_headcount: None,
            extra: BTreeMap::new(),
        }
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn months(&self) -> &[String] {
        &self.months
    }

    pub fn roles(&self) -> &BTreeMap<String, Role> {
        &self.roles
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.roles.get(name)
    }

    pub fn daily_requirements(&self) -> &BTreeMap<String, DailyRequirement> {
        &self.daily_requirements
    }

    pub fn requirement(&self, key: &str) -> Option<&DailyRequirement> {
        self.daily_requirements.get(key)
    }

    pub fn role_capability(&self) -> &BTreeMap<String, RoleCapability> {
        &self.role_capability
    }

    pub fn capability(&self, key: &str) -> Option<&RoleCapability> {
        self.role_capability.get(key)
    }

    pub fn work_constraints(&self) -> &WorkConstraints {
        &self.work_constraints
    }

    pub fn roles_order(&self) -> &[String] {
        &self.roles_order
    }

    pub fn requirement_order(&self) -> &[String] {
        &self.requirement_order
    }

    pub fn order(&self, list: OrderList) -> &[String] {
        match list {
            OrderList::Roles => &self.roles_order,
            OrderList::Requirements => &self.requirement_order,
        }
    }

    pub fn optimize_headcount(&self) -> Option<bool> {
        self.optimize_headcount
    }

    pub fn set_optimize_headcount(&mut self, value: Option<bool>) {
        self.optimize_headcount = value;
    }

    /// Unknown top-level fields carried through load/save.
    pub fn extra_fields(&self) -> &BTreeMap<String, Value> {
        &self.extra
    }

    pub fn add_role(&mut self, name: &str, role_type: RoleType) -> Result<()> {
        check_key_name(name)?;
        if self.roles.contains_key(name) {
            return Err(ShiftError::duplicate("role", name));
        }
        self.roles.insert(
            name.to_string(),
            Role {
                role_type,
                count: 1,
            },
        );
        self.roles_order.push(name.to_string());
        Ok(())
    }

    /// Remove a role everywhere it is referenced.
    ///
    /// Returns the requirement keys left with no eligible role, which callers
    /// surface as an advisory.
    pub fn delete_role(&mut self, name: &str) -> Result<Vec<String>> {
        if self.roles.remove(name).is_none() {
            return Err(ShiftError::unknown("role", name));
        }
        let mut unfilled = Vec::new();
        for (key, capability) in self.role_capability.iter_mut() {
            let referenced = capability.references(name);
            for tier in Tier::ALL {
                capability.tier_mut(tier).retain(|role| role != name);
            }
            if referenced && capability.is_unfilled() {
                unfilled.push(key.clone());
            }
        }
        self.roles_order.retain(|role| role != name);
        Ok(unfilled)
    }

    /// Rename a role, keeping its position in `rolesOrder` and in every tier.
    pub fn rename_role(&mut self, old: &str, new: &str) -> Result<()> {
        check_key_name(new)?;
        if !self.roles.contains_key(old) {
            return Err(ShiftError::unknown("role", old));
        }
        if old == new {
            return Ok(());
        }
        if self.roles.contains_key(new) {
            return Err(ShiftError::duplicate("role", new));
        }
        if let Some(role) = self.roles.remove(old) {
            self.roles.insert(new.to_string(), role);
        }
        for capability in self.role_capability.values_mut() {
            for tier in Tier::ALL {
                replace_all(capability.tier_mut(tier), old, new);
            }
        }
        replace_all(&mut self.roles_order, old, new);
        Ok(())
    }

    pub fn set_role_type(&mut self, name: &str, role_type: RoleType) -> Result<()> {
        let role = self
            .roles
            .get_mut(name)
            .ok_or_else(|| ShiftError::unknown("role", name))?;
        role.role_type = role_type;
        Ok(())
    }

    pub fn set_role_count(&mut self, name: &str, count: u32) -> Result<()> {
        let role = self
            .roles
            .get_mut(name)
            .ok_or_else(|| ShiftError::unknown("role", name))?;
        role.count = count;
        Ok(())
    }

    pub fn add_daily_requirement(&mut self, key: &str) -> Result<()> {
        check_key_name(key)?;
        if self.daily_requirements.contains_key(key) || self.role_capability.contains_key(key) {
            return Err(ShiftError::duplicate("daily requirement", key));
        }
        self.daily_requirements
            .insert(key.to_string(), DailyRequirement::DEFAULT);
        self.role_capability
            .insert(key.to_string(), RoleCapability::default());
        self.requirement_order.push(key.to_string());
        Ok(())
    }

    pub fn delete_daily_requirement(&mut self, key: &str) -> Result<()> {
        if self.daily_requirements.remove(key).is_none() {
            return Err(ShiftError::unknown("daily requirement", key));
        }
        self.role_capability.remove(key);
        self.requirement_order.retain(|entry| entry != key);
        Ok(())
    }

    /// Rename a requirement together with its capability entry.
    pub fn rename_daily_requirement(&mut self, old: &str, new: &str) -> Result<()> {
        check_key_name(new)?;
        if !self.daily_requirements.contains_key(old) {
            return Err(ShiftError::unknown("daily requirement", old));
        }
        if old == new {
            return Ok(());
        }
        if self.daily_requirements.contains_key(new) || self.role_capability.contains_key(new) {
            return Err(ShiftError::duplicate("daily requirement", new));
        }
        if let Some(requirement) = self.daily_requirements.remove(old) {
            self.daily_requirements.insert(new.to_string(), requirement);
        }
        let capability = self.role_capability.remove(old).unwrap_or_default();
        self.role_capability.insert(new.to_string(), capability);
        replace_all(&mut self.requirement_order, old, new);
        Ok(())
    }

    pub fn set_daily_requirement(&mut self, key: &str, band: DailyRequirement) -> Result<()> {
        let errors = band.band_errors();
        if !errors.is_empty() {
            return Err(ShiftError::InvalidBand {
                key: key.to_string(),
                detail: errors.join("; "),
            });
        }
        let slot = self
            .daily_requirements
            .get_mut(key)
            .ok_or_else(|| ShiftError::unknown("daily requirement", key))?;
        *slot = band;
        Ok(())
    }

    pub fn add_capability(&mut self, key: &str, tier: Tier, role: &str) -> Result<CapabilityAdd> {
        if !self.roles.contains_key(role) {
            return Err(ShiftError::unknown("role", role));
        }
        let capability = self
            .role_capability
            .get_mut(key)
            .ok_or_else(|| ShiftError::unknown("capability entry", key))?;
        let list = capability.tier_mut(tier);
        if list.iter().any(|existing| existing == role) {
            return Ok(CapabilityAdd::Duplicate);
        }
        list.push(role.to_string());
        Ok(CapabilityAdd::Added)
    }

    pub fn remove_capability(&mut self, key: &str, tier: Tier, role: &str) -> Result<()> {
        let capability = self
            .role_capability
            .get_mut(key)
            .ok_or_else(|| ShiftError::unknown("capability entry", key))?;
        let list = capability.tier_mut(tier);
        let before = list.len();
        list.retain(|existing| existing != role);
        if list.len() == before {
            return Err(ShiftError::unknown("capability role", role));
        }
        Ok(())
    }

    /// Replace a tier wholesale, e.g. after a drag-and-drop reorder.
    pub fn set_capability_tier(&mut self, key: &str, tier: Tier, roles: Vec<String>) -> Result<()> {
        if !self.role_capability.contains_key(key) {
            return Err(ShiftError::unknown("capability entry", key));
        }
        {
            let mut seen = BTreeSet::new();
            for role in &roles {
                if !self.roles.contains_key(role) {
                    return Err(ShiftError::unknown("role", role));
                }
                if !seen.insert(role.as_str()) {
                    return Err(ShiftError::DuplicateEntry {
                        requirement: key.to_string(),
                        tier: tier.to_string(),
                        role: role.clone(),
                    });
                }
            }
        }
        if let Some(capability) = self.role_capability.get_mut(key) {
            *capability.tier_mut(tier) = roles;
        }
        Ok(())
    }

    /// Replace an ordering list with a permutation of its current key set.
    pub fn reorder(&mut self, list: OrderList, permutation: Vec<String>) -> Result<()> {
        let keys: BTreeSet<&str> = match list {
            OrderList::Roles => self.roles.keys().map(String::as_str).collect(),
            OrderList::Requirements => self.daily_requirements.keys().map(String::as_str).collect(),
        };
        if let Some(detail) = permutation_mismatch(&keys, &permutation) {
            return Err(ShiftError::InvalidPermutation {
                list: list.to_string(),
                detail,
            });
        }
        match list {
            OrderList::Roles => self.roles_order = permutation,
            OrderList::Requirements => self.requirement_order = permutation,
        }
        Ok(())
    }

    pub fn set_work_constraint(&mut self, worker_type: WorkerType, constraint: WorkConstraint) -> Result<()> {
        if constraint.max_consecutive_days == 0 {
            return Err(ShiftError::InvalidConstraint {
                worker_type: worker_type.to_string(),
                detail: "max_consecutive_days must be at least 1".to_string(),
            });
        }
        *self.work_constraints.get_mut(worker_type) = constraint;
        Ok(())
    }

    /// Set the fiscal year and its months, normalizing legacy month tokens.
    pub fn set_calendar_scope<S: AsRef<str>>(&mut self, year: i64, months: &[S]) -> Result<()> {
        if !is_valid_year(year) {
            return Err(ShiftError::InvalidYear(year));
        }
        let (normalized, rejected) = normalize_months(year, months);
        if let Some(token) = rejected.into_iter().next() {
            return Err(ShiftError::InvalidMonth(token));
        }
        self.year = year;
        self.months = normalized;
        Ok(())
    }
}

fn check_key_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(ShiftError::InvalidName {
            name: name.to_string(),
            reason: "must not be blank",
        });
    }
    Ok(())
}

fn replace_all(list: &mut [String], old: &str, new: &str) {
    for entry in list.iter_mut() {
        if entry == old {
            *entry = new.to_string();
        }
    }
}

/// Describe why `candidate` is not a permutation of `keys`, if it is not.
pub(crate) fn permutation_mismatch(keys: &BTreeSet<&str>, candidate: &[String]) -> Option<String> {
    let mut problems = Vec::new();
    let mut seen = BTreeSet::new();
    let mut duplicates = BTreeSet::new();
    let mut stale = BTreeSet::new();
    for entry in candidate {
        if !seen.insert(entry.as_str()) {
            duplicates.insert(entry.as_str());
        }
        if !keys.contains(entry.as_str()) {
            stale.insert(entry.as_str());
        }
    }
    let missing: Vec<&str> = keys.iter().copied().filter(|key| !seen.contains(key)).collect();
    if !missing.is_empty() {
        problems.push(format!("missing {missing:?}"));
    }
    if !stale.is_empty() {
        problems.push(format!("unknown {:?}", stale.into_iter().collect::<Vec<_>>()));
    }
    if !duplicates.is_empty() {
        problems.push(format!(
            "duplicated {:?}",
            duplicates.into_iter().collect::<Vec<_>>()
        ));
    }
    (!problems.is_empty()).then(|| problems.join(", "))
}

#[cfg(test)]
#[path = "document_tests.rs"]
mod tests;
