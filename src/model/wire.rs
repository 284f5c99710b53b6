//! JSON encoding of [`ConfigDocument`].
//!
//! Maps are written in the order of their ordering lists so the persisted
//! file reads the way the operator arranged it. On read, object key order is
//! captured so documents saved without ordering lists still get one.
use super::calendar::normalize_months;
use super::{ConfigDocument, DailyRequirement, Role, RoleCapability, WorkConstraints};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::marker::PhantomData;

/// JSON object entries in document order.
struct Entries<T>(Vec<(String, T)>);

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Entries<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor<T>(PhantomData<T>);

        impl<'de, T: Deserialize<'de>> Visitor<'de> for EntriesVisitor<T> {
            type Value = Entries<T>;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON object")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut entries = Vec::new();
                while let Some((key, value)) = map.next_entry::<String, T>()? {
                    entries.push((key, value));
                }
                Ok(Entries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor(PhantomData))
    }
}

impl<T> Entries<T> {
    /// Split into a keyed map (last duplicate wins) and first-seen key order.
    fn into_parts(self) -> (BTreeMap<String, T>, Vec<String>) {
        let mut map = BTreeMap::new();
        let mut order = Vec::new();
        for (key, value) in self.0 {
            if !map.contains_key(&key) {
                order.push(key.clone());
            }
            map.insert(key, value);
        }
        (map, order)
    }
}

#[derive(Deserialize)]
struct DocumentIn {
    year: i64,
    #[serde(default)]
    months: Vec<Value>,
    roles: Entries<Role>,
    daily_requirements: Entries<DailyRequirement>,
    role_capability: Entries<RoleCapability>,
    work_constraints: WorkConstraints,
    #[serde(rename = "rolesOrder", default)]
    roles_order: Option<Vec<String>>,
    #[serde(rename = "requirementOrder", default)]
    requirement_order: Option<Vec<String>>,
    #[serde(default)]
    optimize_headcount: Option<bool>,
    #[serde(flatten)]
    extra: BTreeMap<String, Value>,
}

impl<'de> Deserialize<'de> for ConfigDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = DocumentIn::deserialize(deserializer)?;
        let tokens: Vec<String> = raw
            .months
            .iter()
            .map(|value| match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            })
            .collect();
        let (months, rejected) = normalize_months(raw.year, &tokens);
        if !rejected.is_empty() {
            tracing::warn!(?rejected, "dropping unrecognized month tokens");
        }
        let (roles, role_keys) = raw.roles.into_parts();
        let (daily_requirements, requirement_keys) = raw.daily_requirements.into_parts();
        let (role_capability, _) = raw.role_capability.into_parts();
        Ok(ConfigDocument {
            year: raw.year,
            months,
            roles,
            daily_requirements,
            role_capability,
            work_constraints: raw.work_constraints,
            roles_order: raw.roles_order.unwrap_or(role_keys),
            requirement_order: raw.requirement_order.unwrap_or(requirement_keys),
            optimize_headcount: raw.optimize_headcount,
            extra: raw.extra,
        })
    }
}

/// A keyed map viewed through an ordering list.
struct Ordered<'a, T> {
    map: &'a BTreeMap<String, T>,
    order: &'a [String],
}

impl<T: Serialize> Serialize for Ordered<'_, T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut out = serializer.serialize_map(Some(self.map.len()))?;
        let mut written = BTreeSet::new();
        for key in self.order {
            if let Some(value) = self.map.get(key) {
                if written.insert(key.as_str()) {
                    out.serialize_entry(key, value)?;
                }
            }
        }
        for (key, value) in self.map {
            if !written.contains(key.as_str()) {
                out.serialize_entry(key, value)?;
            }
        }
        out.end()
    }
}

#[derive(Serialize)]
struct DocumentOut<'a> {
    year: i64,
    months: &'a [String],
    #[serde(skip_serializing_if = "Option::is_none")]
    optimize_headcount: Option<bool>,
    roles: Ordered<'a, Role>,
    daily_requirements: Ordered<'a, DailyRequirement>,
    role_capability: Ordered<'a, RoleCapability>,
    work_constraints: &'a WorkConstraints,
    #[serde(rename = "rolesOrder")]
    roles_order: &'a [String],
    #[serde(rename = "requirementOrder")]
    requirement_order: &'a [String],
    #[serde(flatten)]
    extra: &'a BTreeMap<String, Value>,
}

impl Serialize for ConfigDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        DocumentOut {
            year: self.year,
            months: &self.months,
            optimize_headcount: self.optimize_headcount,
            roles: Ordered {
                map: &self.roles,
                order: &self.roles_order,
            },
            daily_requirements: Ordered {
                map: &self.daily_requirements,
                order: &self.requirement_order,
            },
            role_capability: Ordered {
                map: &self.role_capability,
                order: &self.requirement_order,
            },
            work_constraints: &self.work_constraints,
            roles_order: &self.roles_order,
            requirement_order: &self.requirement_order,
            extra: &self.extra,
        }
        .serialize(serializer)
    }
}

impl ConfigDocument {
    pub fn from_json_slice(bytes: &[u8]) -> crate::error::Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn from_json_value(value: Value) -> crate::error::Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json_pretty(&self) -> crate::error::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

#[cfg(test)]
#[path = "wire_tests.rs"]
mod tests;
