//! Built-in example document used when a new configuration is created.
use super::calendar::fiscal_months;
use super::{ConfigDocument, DailyRequirement, Role, RoleCapability, RoleType, WorkConstraints};
use std::collections::BTreeMap;

const EXAMPLE_YEAR: i64 = 2025;

const EXAMPLE_ROLES: &[(&str, RoleType, u32)] = &[
    ("統括", RoleType::Employee, 1),
    ("副統括", RoleType::Employee, 1),
    ("事務員", RoleType::Employee, 2),
    ("火葬業務統括", RoleType::Employee, 1),
    ("火葬業務副統括", RoleType::Employee, 1),
    ("火葬員", RoleType::Employee, 6),
    ("清掃員", RoleType::Employee, 4),
    ("売店従業員", RoleType::Employee, 3),
    ("霊柩運送員", RoleType::Employee, 3),
    ("パート長", RoleType::PartTimer, 4),
    ("パート短", RoleType::PartTimer, 4),
];

const EXAMPLE_REQUIREMENTS: &[(&str, DailyRequirement, &[&str], &[&str])] = &[
    ("責任者", DailyRequirement::new(1, 1, 1, 1), &["統括"], &["副統括"]),
    ("事務", DailyRequirement::new(1, 2, 1, 2), &["事務員"], &["副統括"]),
    ("囲炉裏", DailyRequirement::new(1, 1, 1, 1), &["火葬業務統括"], &["火葬業務副統括"]),
    ("人火葬", DailyRequirement::new(6, 7, 5, 5), &["火葬員"], &["パート長", "パート短"]),
    ("動物火葬", DailyRequirement::new(1, 2, 1, 2), &["火葬員"], &["パート長", "パート短"]),
    ("運送", DailyRequirement::new(2, 2, 2, 2), &["霊柩運送員"], &[]),
    ("清掃", DailyRequirement::new(2, 2, 2, 2), &["清掃員"], &[]),
    ("売店", DailyRequirement::new(2, 2, 2, 2), &["売店従業員"], &[]),
];

impl ConfigDocument {
    /// The example facility a fresh document starts from.
    pub fn example() -> Self {
        let mut roles = BTreeMap::new();
        let mut roles_order = Vec::new();
        for (name, role_type, count) in EXAMPLE_ROLES {
            roles.insert(
                name.to_string(),
                Role {
                    role_type: *role_type,
                    count: *count,
                },
            );
            roles_order.push(name.to_string());
        }

        let mut daily_requirements = BTreeMap::new();
        let mut role_capability = BTreeMap::new();
        let mut requirement_order = Vec::new();
        for (key, band, primary, secondary) in EXAMPLE_REQUIREMENTS {
            daily_requirements.insert(key.to_string(), *band);
            role_capability.insert(
                key.to_string(),
                RoleCapability {
                    primary: primary.iter().map(|role| role.to_string()).collect(),
                    secondary: secondary.iter().map(|role| role.to_string()).collect(),
                    third: Vec::new(),
                },
            );
            requirement_order.push(key.to_string());
        }

        ConfigDocument {
            year: EXAMPLE_YEAR,
            months: fiscal_months(EXAMPLE_YEAR),
            roles,
            daily_requirements,
            role_capability,
            work_constraints: WorkConstraints::default(),
            roles_order,
            requirement_order,
            optimize_headcount: None,
            extra: BTreeMap::new(),
        }
    }
}
