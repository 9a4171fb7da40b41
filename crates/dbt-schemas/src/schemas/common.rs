use crate::schemas::relations::base::Policy;
use crate::schemas::serde::bool_or_string_bool;

use serde::{Deserialize, Serialize};

/// Quoting after project, source and table level `quoting:` configs have been merged
pub type ResolvedQuoting = Policy;

/// A `quoting:` block as written in `dbt_project.yml` or a sources file.
///
/// Unset flags inherit from the enclosing level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DbtQuoting {
    #[serde(
        default,
        deserialize_with = "bool_or_string_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub database: Option<bool>,
    #[serde(
        default,
        deserialize_with = "bool_or_string_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub schema: Option<bool>,
    #[serde(
        default,
        deserialize_with = "bool_or_string_bool",
        skip_serializing_if = "Option::is_none"
    )]
    pub identifier: Option<bool>,
}

impl DbtQuoting {
    pub fn is_empty(&self) -> bool {
        self.database.is_none() && self.schema.is_none() && self.identifier.is_none()
    }

    /// Returns `self` with any flag set in `other` taking precedence
    pub fn merged_with(self, other: DbtQuoting) -> DbtQuoting {
        DbtQuoting {
            database: other.database.or(self.database),
            schema: other.schema.or(self.schema),
            identifier: other.identifier.or(self.identifier),
        }
    }

    pub fn apply_to(&self, base: Policy) -> Policy {
        Policy {
            database: self.database.unwrap_or(base.database),
            schema: self.schema.unwrap_or(base.schema),
            identifier: self.identifier.unwrap_or(base.identifier),
        }
    }
}
