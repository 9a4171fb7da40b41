use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// The type of the adapter.
///
/// Used to identify the specific database adapter being used.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, AsRefStr, EnumString, Deserialize, Serialize,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum AdapterType {
    /// DuckDb
    DuckDb,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_adapter_type_duckdb_to_string() {
        assert_eq!(AdapterType::DuckDb.to_string(), "duckdb");
    }

    #[test]
    fn test_adapter_type_duckdb_from_string() {
        assert_eq!(
            AdapterType::from_str("duckdb").unwrap(),
            AdapterType::DuckDb
        );
        assert_eq!(
            AdapterType::from_str("DUCKDB").unwrap(),
            AdapterType::DuckDb
        );
        assert!(AdapterType::from_str("sqlite").is_err());
    }

    #[test]
    fn test_adapter_type_duckdb_serde() {
        let serialized = serde_json::to_string(&AdapterType::DuckDb).unwrap();
        assert_eq!(serialized, "\"duckdb\"");

        let deserialized: AdapterType = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, AdapterType::DuckDb);
    }
}
