use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The kind of object a relation points at
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    AsRefStr,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
#[serde(rename_all = "snake_case")]
pub enum RelationType {
    Table,
    View,
    #[strum(serialize = "cte")]
    #[serde(rename = "cte")]
    CTE,
    MaterializedView,
    External,
    Ephemeral,
}
