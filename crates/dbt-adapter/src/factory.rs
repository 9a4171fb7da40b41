use std::sync::Arc;

use crate::relation::StaticBaseRelationObject;
use crate::relation::duckdb::DuckdbRelationType;

use dbt_common::adapter::AdapterType;
use dbt_schemas::schemas::common::ResolvedQuoting;
use minijinja::Value;

/// Create a static relation value from an adapter type
/// To be used as api.Relation in the Jinja environment
pub fn create_static_relation(adapter_type: AdapterType, quoting: ResolvedQuoting) -> Value {
    let result = match adapter_type {
        AdapterType::DuckDb => {
            let duckdb_relation_type = DuckdbRelationType(quoting);
            StaticBaseRelationObject::new(Arc::new(duckdb_relation_type))
        }
    };
    Value::from_object(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_static_relation_duckdb() {
        let quoting = ResolvedQuoting {
            database: true,
            schema: false,
            identifier: true,
        };
        let value = create_static_relation(AdapterType::DuckDb, quoting);
        assert!(value.downcast_object_ref::<StaticBaseRelationObject>().is_some());
        assert_eq!(value.to_string(), "<duckdb Relation>");
    }
}
