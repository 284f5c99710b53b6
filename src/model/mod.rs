//! Configuration document model.
//!
//! The document is the unit of persistence and the input contract of the
//! external scheduling engine, so field names and nesting mirror the JSON
//! shape the engine reads.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub mod calendar;
mod defaults;
mod document;
mod wire;

pub use calendar::{fiscal_months, in_fiscal_window, is_valid_year, normalize_months};
pub use document::{CapabilityAdd, ConfigDocument};
pub(crate) use document::permutation_mismatch;

/// Employment type of a staffed role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleType {
    Employee,
    PartTimer,
}

impl RoleType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleType::Employee => "employee",
            RoleType::PartTimer => "part_timer",
        }
    }

    /// The work-constraint row that governs workers of this type.
    pub fn worker_type(&self) -> WorkerType {
        match self {
            RoleType::Employee => WorkerType::Employee,
            RoleType::PartTimer => WorkerType::PartTimer,
        }
    }
}

impl fmt::Display for RoleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "employee" => Ok(RoleType::Employee),
            "part_timer" => Ok(RoleType::PartTimer),
            other => Err(format!(
                "role type must be \"employee\" or \"part_timer\" (got {other:?})"
            )),
        }
    }
}

/// Worker types that carry a work-constraint row.
///
/// `Dummy` is the placeholder filler the engine uses when real staff run
/// out; no role is ever of this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkerType {
    Employee,
    PartTimer,
    Dummy,
}

impl WorkerType {
    pub const ALL: [WorkerType; 3] = [WorkerType::Employee, WorkerType::PartTimer, WorkerType::Dummy];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkerType::Employee => "employee",
            WorkerType::PartTimer => "part_timer",
            WorkerType::Dummy => "dummy",
        }
    }
}

impl fmt::Display for WorkerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkerType {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "employee" => Ok(WorkerType::Employee),
            "part_timer" => Ok(WorkerType::PartTimer),
            "dummy" => Ok(WorkerType::Dummy),
            other => Err(format!(
                "worker type must be employee, part_timer, or dummy (got {other:?})"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    #[serde(rename = "type")]
    pub role_type: RoleType,
    pub count: u32,
}

/// Staffing band for one duty, on normal days and on "friend" days.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRequirement {
    pub normal_min: u32,
    pub normal_max: u32,
    pub friend_min: u32,
    pub friend_max: u32,
}

impl DailyRequirement {
    /// Band given to a newly added requirement.
    pub const DEFAULT: DailyRequirement = DailyRequirement {
        normal_min: 1,
        normal_max: 1,
        friend_min: 1,
        friend_max: 1,
    };

    pub const fn new(normal_min: u32, normal_max: u32, friend_min: u32, friend_max: u32) -> Self {
        Self {
            normal_min,
            normal_max,
            friend_min,
            friend_max,
        }
    }

    /// Describe every inverted pair, empty when the band is consistent.
    pub fn band_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.normal_max < self.normal_min {
            errors.push(format!(
                "normal_max {} is below normal_min {}",
                self.normal_max, self.normal_min
            ));
        }
        if self.friend_max < self.friend_min {
            errors.push(format!(
                "friend_max {} is below friend_min {}",
                self.friend_max, self.friend_min
            ));
        }
        errors
    }
}

impl Default for DailyRequirement {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Ranked roles eligible to fill one requirement.
///
/// `third` is kept for compatibility with older documents and is never edited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCapability {
    #[serde(default)]
    pub primary: Vec<String>,
    #[serde(default)]
    pub secondary: Vec<String>,
    #[serde(default)]
    pub third: Vec<String>,
}

impl RoleCapability {
    pub fn tier(&self, tier: Tier) -> &[String] {
        match tier {
            Tier::Primary => &self.primary,
            Tier::Secondary => &self.secondary,
        }
    }

    pub(crate) fn tier_mut(&mut self, tier: Tier) -> &mut Vec<String> {
        match tier {
            Tier::Primary => &mut self.primary,
            Tier::Secondary => &mut self.secondary,
        }
    }

    /// True when no role can fill the requirement.
    pub fn is_unfilled(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }

    pub fn references(&self, role: &str) -> bool {
        Tier::ALL.iter().any(|tier| self.tier(*tier).iter().any(|r| r == role))
    }
}

/// Editable capability tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    Primary,
    Secondary,
}

impl Tier {
    pub const ALL: [Tier; 2] = [Tier::Primary, Tier::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "primary" => Ok(Tier::Primary),
            "secondary" => Ok(Tier::Secondary),
            other => Err(format!(
                "tier must be \"primary\" or \"secondary\" (got {other:?})"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkConstraint {
    pub weekly_days_off: u32,
    pub max_consecutive_days: u32,
    pub min_monthly_workdays: u32,
}

impl WorkConstraint {
    pub const fn new(weekly_days_off: u32, max_consecutive_days: u32, min_monthly_workdays: u32) -> Self {
        Self {
            weekly_days_off,
            max_consecutive_days,
            min_monthly_workdays,
        }
    }
}

/// The three fixed work-constraint rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WorkConstraints {
    pub employee: WorkConstraint,
    pub part_timer: WorkConstraint,
    pub dummy: WorkConstraint,
}

impl WorkConstraints {
    pub fn get(&self, worker_type: WorkerType) -> &WorkConstraint {
        match worker_type {
            WorkerType::Employee => &self.employee,
            WorkerType::PartTimer => &self.part_timer,
            WorkerType::Dummy => &self.dummy,
        }
    }

    pub(crate) fn get_mut(&mut self, worker_type: WorkerType) -> &mut WorkConstraint {
        match worker_type {
            WorkerType::Employee => &mut self.employee,
            WorkerType::PartTimer => &mut self.part_timer,
            WorkerType::Dummy => &mut self.dummy,
        }
    }
}

impl Default for WorkConstraints {
    fn default() -> Self {
        Self {
            employee: WorkConstraint::new(2, 7, 20),
            part_timer: WorkConstraint::new(0, 3, 0),
            dummy: WorkConstraint::new(0, 31, 0),
        }
    }
}

/// The two explicit ordering lists of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderList {
    Roles,
    Requirements,
}

impl OrderList {
    /// JSON field name of the list.
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderList::Roles => "rolesOrder",
            OrderList::Requirements => "requirementOrder",
        }
    }
}

impl fmt::Display for OrderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderList {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "rolesOrder" | "roles" => Ok(OrderList::Roles),
            "requirementOrder" | "requirements" => Ok(OrderList::Requirements),
            other => Err(format!(
                "order list must be rolesOrder or requirementOrder (got {other:?})"
            )),
        }
    }
}
