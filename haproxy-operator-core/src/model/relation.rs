use crate::databag::Databag;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Stable numeric id the platform assigns to a relation.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RelationId(u32);

impl RelationId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An edge between this application and a remote one.
///
/// `app_data` and `units` hold what the remote side published; the `local_*`
/// databags hold what this application last published on the relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Relation {
    pub id: RelationId,
    pub endpoint: String,
    pub remote_app: String,
    #[serde(default)]
    pub app_data: Databag,
    #[serde(default)]
    pub units: BTreeMap<String, Databag>,
    #[serde(default)]
    pub local_app_data: Databag,
    #[serde(default)]
    pub local_unit_data: Databag,
}

impl Relation {
    /// Remote units ordered by unit number, so that `app/10` follows `app/9`.
    pub fn ordered_units(&self) -> Vec<(&str, &Databag)> {
        let mut units: Vec<_> = self
            .units
            .iter()
            .map(|(name, data)| (name.as_str(), data))
            .collect();
        units.sort_by_key(|(name, _)| (unit_number(name).unwrap_or(u32::MAX), *name));
        units
    }
}

fn unit_number(unit_name: &str) -> Option<u32> {
    unit_name
        .rsplit_once('/')
        .and_then(|(_, number)| number.parse().ok())
}
