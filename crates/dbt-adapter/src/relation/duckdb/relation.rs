use super::external_location::resolve_external_location;
use crate::relation::{RelationObject, StaticBaseRelation};

use dbt_common::{ErrorCode, FsResult, fs_err};
use dbt_schemas::dbt_types::RelationType;
use dbt_schemas::schemas::SourceDefinition;
use dbt_schemas::schemas::common::ResolvedQuoting;
use dbt_schemas::schemas::relations::base::{
    BaseRelation, BaseRelationProperties, Policy, RelationOptions, RelationPath,
};
use minijinja::{Error as MinijinjaError, Value};

use std::any::Any;
use std::sync::Arc;

/// A struct representing the DuckDb relation type for use with static methods
#[derive(Clone, Debug)]
pub struct DuckdbRelationType(pub ResolvedQuoting);

impl StaticBaseRelation for DuckdbRelationType {
    fn try_new(
        &self,
        database: Option<String>,
        schema: Option<String>,
        identifier: Option<String>,
        relation_type: Option<RelationType>,
        custom_quoting: Option<ResolvedQuoting>,
    ) -> Result<Value, MinijinjaError> {
        Ok(RelationObject::new(Arc::new(DuckdbRelation::try_new(
            database,
            schema,
            identifier,
            relation_type,
            custom_quoting.unwrap_or(self.0),
        )?))
        .into_value())
    }

    fn create_from_source(
        &self,
        source: &SourceDefinition,
        options: RelationOptions,
    ) -> Result<Value, MinijinjaError> {
        let relation = DuckdbRelation::create_from_source(source, self.0, options)?;
        Ok(relation.as_value())
    }

    fn get_adapter_type(&self) -> String {
        "duckdb".to_string()
    }
}

/// A relation object for duckdb adapter
#[derive(Clone, Debug)]
pub struct DuckdbRelation {
    /// The database, schema, and identifier of the relation
    pub path: RelationPath,
    /// The relation type
    pub relation_type: Option<RelationType>,
    /// Include policy
    pub include_policy: Policy,
    /// Quote policy
    pub quote_policy: Policy,
    /// A file path literal or table function call rendered in place of the name
    external_location: Option<String>,
}

impl DuckdbRelation {
    /// Creates a new DuckDb relation
    pub fn try_new(
        database: Option<String>,
        schema: Option<String>,
        identifier: Option<String>,
        relation_type: Option<RelationType>,
        custom_quoting: ResolvedQuoting,
    ) -> Result<Self, MinijinjaError> {
        Self::try_new_with_policy(
            RelationPath {
                database,
                schema,
                identifier,
            },
            relation_type,
            Policy::enabled(),
            custom_quoting,
        )
    }

    /// Creates a new DuckDb relation
    pub fn try_new_with_policy(
        path: RelationPath,
        relation_type: Option<RelationType>,
        include_policy: Policy,
        quote_policy: Policy,
    ) -> Result<Self, MinijinjaError> {
        // DuckDB has no effective identifier length limit, so we skip the check

        Ok(Self {
            path,
            relation_type,
            include_policy,
            quote_policy,
            external_location: None,
        })
    }

    /// Builds the relation for a declared source.
    ///
    /// Sources whose `meta` (or whose group's `meta`) carries an `external_location` render
    /// as that location instead of `database.schema.identifier`. Quoting starts from the
    /// project default, then the source's own `quoting:`, then `options.quote_policy`.
    #[tracing::instrument(
        skip_all,
        level = "trace",
        fields(source = %source.source_name, table = %source.name)
    )]
    pub fn create_from_source(
        source: &SourceDefinition,
        default_quoting: ResolvedQuoting,
        options: RelationOptions,
    ) -> FsResult<Self> {
        let external_location = resolve_external_location(source)?;
        if let Some(location) = &external_location {
            tracing::debug!(
                source = %source.source_name,
                table = %source.name,
                external_location = %location,
                "resolved external location for source"
            );
        }

        let quote_policy = options
            .quote_policy
            .apply_to(source.quoting.apply_to(default_quoting));

        let relation = Self::try_new_with_policy(
            RelationPath {
                database: source.database.clone(),
                schema: source.schema.clone(),
                identifier: Some(source.identifier.clone()),
            },
            options.relation_type,
            options.include_policy.unwrap_or_else(Policy::enabled),
            quote_policy,
        )?;

        Ok(relation.with_external_location(external_location))
    }

    /// Empty locations are dropped so they can never shadow the name.
    pub fn with_external_location(mut self, external_location: Option<String>) -> Self {
        self.external_location = external_location.filter(|location| !location.is_empty());
        self
    }

    pub fn external_location(&self) -> Option<&str> {
        self.external_location.as_deref()
    }
}

impl BaseRelationProperties for DuckdbRelation {
    fn include_policy(&self) -> Policy {
        self.include_policy
    }

    fn quote_policy(&self) -> Policy {
        self.quote_policy
    }

    fn quote_character(&self) -> char {
        '"'
    }

    fn get_database(&self) -> FsResult<String> {
        self.path.database.clone().ok_or_else(|| {
            fs_err!(
                ErrorCode::InvalidConfig,
                "database is required for duckdb relation",
            )
        })
    }

    fn get_schema(&self) -> FsResult<String> {
        self.path.schema.clone().ok_or_else(|| {
            fs_err!(
                ErrorCode::InvalidConfig,
                "schema is required for duckdb relation",
            )
        })
    }

    fn get_identifier(&self) -> FsResult<String> {
        self.path.identifier.clone().ok_or_else(|| {
            fs_err!(
                ErrorCode::InvalidConfig,
                "identifier is required for duckdb relation",
            )
        })
    }
}

impl BaseRelation for DuckdbRelation {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn path(&self) -> &RelationPath {
        &self.path
    }

    fn relation_type(&self) -> Option<RelationType> {
        self.relation_type
    }

    fn as_value(&self) -> Value {
        RelationObject::new(Arc::new(self.clone())).into_value()
    }

    fn adapter_type(&self) -> Option<String> {
        Some("duckdb".to_string())
    }

    fn include_inner(&self, include_policy: Policy) -> Result<Value, MinijinjaError> {
        let relation = DuckdbRelation::try_new_with_policy(
            self.path.clone(),
            self.relation_type,
            include_policy,
            self.quote_policy,
        )?
        .with_external_location(self.external_location.clone());
        Ok(relation.as_value())
    }

    fn quote_inner(&self, quote_policy: Policy) -> Result<Value, MinijinjaError> {
        let relation = DuckdbRelation::try_new_with_policy(
            self.path.clone(),
            self.relation_type,
            self.include_policy,
            quote_policy,
        )?
        .with_external_location(self.external_location.clone());
        Ok(relation.as_value())
    }

    fn normalize_component(&self, component: &str) -> String {
        component.to_lowercase()
    }

    fn create_relation(
        &self,
        database: Option<String>,
        schema: Option<String>,
        identifier: Option<String>,
        relation_type: Option<RelationType>,
        custom_quoting: Policy,
    ) -> Result<Arc<dyn BaseRelation>, MinijinjaError> {
        Ok(Arc::new(DuckdbRelation::try_new(
            database,
            schema,
            identifier,
            relation_type,
            custom_quoting,
        )?))
    }

    fn adapter_attribute(&self, key: &str) -> Option<Value> {
        match key {
            "external_location" => Some(Value::from(self.external_location.clone())),
            _ => None,
        }
    }

    fn render_self_as_str(&self) -> String {
        match self.external_location() {
            Some(location) => location.to_string(),
            None => self.render_qualified_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dbt_schemas::schemas::DbtSourcesFile;
    use dbt_schemas::schemas::common::DbtQuoting;
    use dbt_schemas::schemas::relations::DEFAULT_RESOLVED_QUOTING;
    use dbt_schemas::schemas::serde::YmlValue;
    use dbt_schemas::schemas::sources::Meta;

    fn meta(location: &str) -> Meta {
        Meta::from([(
            "external_location".to_string(),
            YmlValue::String(location.to_string()),
        )])
    }

    fn source(name: &str, identifier: &str) -> SourceDefinition {
        SourceDefinition {
            source_name: "raw".to_string(),
            name: name.to_string(),
            identifier: identifier.to_string(),
            database: Some("db".to_string()),
            schema: Some("raw".to_string()),
            meta: Meta::new(),
            source_meta: Meta::new(),
            quoting: DbtQuoting::default(),
        }
    }

    fn from_source(source: &SourceDefinition) -> DuckdbRelation {
        DuckdbRelation::create_from_source(
            source,
            DEFAULT_RESOLVED_QUOTING,
            RelationOptions::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_try_new_via_static_base_relation() {
        let relation = DuckdbRelationType(DEFAULT_RESOLVED_QUOTING)
            .try_new(
                Some("db".to_string()),
                Some("main".to_string()),
                Some("my_table".to_string()),
                Some(RelationType::Table),
                Some(DEFAULT_RESOLVED_QUOTING),
            )
            .unwrap();

        let relation = relation.downcast_object::<RelationObject>().unwrap();
        assert_eq!(
            relation.inner().render_self().unwrap().as_str().unwrap(),
            "\"db\".\"main\".\"my_table\""
        );
        assert_eq!(relation.relation_type().unwrap(), RelationType::Table);
    }

    #[test]
    fn test_meta_location_renders_verbatim() {
        let mut source = source("x", "x");
        source.meta = meta("'/data/x.csv'");

        let relation = from_source(&source);
        assert_eq!(relation.external_location(), Some("'/data/x.csv'"));
        assert_eq!(relation.render_self_as_str(), "'/data/x.csv'");
    }

    #[test]
    fn test_source_meta_function_call_is_not_quoted() {
        let mut source = source("s", "t");
        source.source_meta = meta("read_csv('{identifier}.csv')");

        let relation = from_source(&source);
        assert_eq!(relation.render_self_as_str(), "read_csv('t.csv')");
    }

    #[test]
    fn test_source_meta_path_is_quoted() {
        let mut source = source("orders", "orders");
        source.source_meta = meta("/data/{name}.parquet");

        let relation = from_source(&source);
        assert_eq!(relation.render_self_as_str(), "'/data/orders.parquet'");
    }

    #[test]
    fn test_meta_takes_precedence_over_source_meta() {
        let mut source = source("orders", "orders");
        source.meta = meta("/override/orders.csv");
        source.source_meta = meta("/data/{name}.parquet");

        let relation = from_source(&source);
        assert_eq!(relation.render_self_as_str(), "'/override/orders.csv'");
    }

    #[test]
    fn test_no_location_renders_qualified_name() {
        let relation = from_source(&source("orders", "raw_orders"));
        assert_eq!(relation.external_location(), None);
        assert_eq!(
            relation.render_self_as_str(),
            relation.render_qualified_name()
        );
        assert_eq!(relation.render_self_as_str(), "\"db\".\"raw\".\"raw_orders\"");
    }

    #[test]
    fn test_empty_location_falls_back_to_name() {
        let mut source = source("orders", "orders");
        source.source_meta = meta("");

        let relation = from_source(&source);
        assert_eq!(relation.external_location(), None);
        assert_eq!(relation.render_self_as_str(), "\"db\".\"raw\".\"orders\"");
    }

    #[test]
    fn test_bad_template_is_fmt_error() {
        let mut source = source("orders", "orders");
        source.source_meta = meta("/data/{table}.csv");

        let err = DuckdbRelation::create_from_source(
            &source,
            DEFAULT_RESOLVED_QUOTING,
            RelationOptions::default(),
        )
        .unwrap_err();
        assert_eq!(err.code(), ErrorCode::FmtError);
    }

    #[test]
    fn test_create_from_source_quoting_layers() {
        let mut source = source("Orders", "Orders");
        source.quoting = DbtQuoting {
            database: Some(false),
            schema: Some(false),
            identifier: None,
        };

        let relation = DuckdbRelation::create_from_source(
            &source,
            DEFAULT_RESOLVED_QUOTING,
            RelationOptions {
                relation_type: Some(RelationType::View),
                include_policy: None,
                quote_policy: DbtQuoting {
                    identifier: Some(false),
                    ..Default::default()
                },
            },
        )
        .unwrap();

        assert_eq!(relation.render_self_as_str(), "db.raw.Orders");
        assert_eq!(relation.relation_type(), Some(RelationType::View));
    }

    #[test]
    fn test_create_from_source_include_policy() {
        let relation = DuckdbRelation::create_from_source(
            &source("orders", "orders"),
            DEFAULT_RESOLVED_QUOTING,
            RelationOptions {
                include_policy: Some(Policy {
                    database: false,
                    schema: true,
                    identifier: true,
                }),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(relation.render_self_as_str(), "\"raw\".\"orders\"");
    }

    #[test]
    fn test_include_keeps_external_location() {
        let mut source = source("orders", "orders");
        source.source_meta = meta("/data/{name}.parquet");
        let relation = from_source(&source);

        let included = relation
            .include_inner(Policy {
                database: false,
                schema: false,
                identifier: true,
            })
            .unwrap();
        assert_eq!(included.to_string(), "'/data/orders.parquet'");
    }

    #[test]
    fn test_quote_inner_changes_name_but_not_location() {
        let plain = from_source(&source("Orders", "Orders"));
        let unquoted = plain.quote_inner(Policy::disabled()).unwrap();
        assert_eq!(unquoted.to_string(), "db.raw.Orders");

        let mut source = source("orders", "orders");
        source.source_meta = meta("/data/{name}.parquet");
        let external = from_source(&source).quote_inner(Policy::disabled()).unwrap();
        assert_eq!(external.to_string(), "'/data/orders.parquet'");
    }

    #[test]
    fn test_external_location_attribute() {
        let mut source = source("orders", "orders");
        source.source_meta = meta("/data/{name}.parquet");

        let relation = from_source(&source);
        assert_eq!(
            relation
                .adapter_attribute("external_location")
                .unwrap()
                .as_str(),
            Some("'/data/orders.parquet'")
        );
        assert!(relation.adapter_attribute("unknown").is_none());

        let plain = from_source(&self::source("orders", "orders"));
        assert!(plain.adapter_attribute("external_location").unwrap().is_none());
    }

    #[test]
    fn test_with_external_location_drops_empty() {
        let relation = DuckdbRelation::try_new(
            Some("db".to_string()),
            Some("main".to_string()),
            Some("t".to_string()),
            None,
            DEFAULT_RESOLVED_QUOTING,
        )
        .unwrap()
        .with_external_location(Some(String::new()));

        assert_eq!(relation.external_location(), None);
        assert_eq!(relation.render_self_as_str(), "\"db\".\"main\".\"t\"");
    }

    #[test]
    fn test_create_from_sources_file() {
        let file = DbtSourcesFile::from_yaml_str(
            r#"
sources:
  - name: lake
    meta:
      external_location: "s3://bucket/{name}/*.parquet"
    tables:
      - name: events
      - name: users
        meta:
          external_location: "read_json_auto('s3://bucket/users.json')"
"#,
        )
        .unwrap();

        let rendered: Vec<String> = file
            .definitions()
            .iter()
            .map(|source| from_source(source).render_self_as_str())
            .collect();
        assert_eq!(
            rendered,
            vec![
                "'s3://bucket/events/*.parquet'".to_string(),
                "read_json_auto('s3://bucket/users.json')".to_string(),
            ]
        );
    }

    #[test]
    fn test_duckdb_relation_adapter_type() {
        let relation_type = DuckdbRelationType(DEFAULT_RESOLVED_QUOTING);
        assert_eq!(relation_type.get_adapter_type(), "duckdb");
    }

    #[test]
    fn test_normalize_component_lowercase() {
        let relation = DuckdbRelation::try_new(
            Some("DB".to_string()),
            Some("SCHEMA".to_string()),
            Some("TABLE".to_string()),
            Some(RelationType::Table),
            DEFAULT_RESOLVED_QUOTING,
        )
        .unwrap();

        assert_eq!(relation.normalize_component("MixedCase"), "mixedcase");
        assert_eq!(relation.quote_character(), '"');
    }

    #[test]
    fn test_get_identifier_missing() {
        let relation = DuckdbRelation::try_new_with_policy(
            RelationPath {
                database: Some("db".to_string()),
                schema: Some("schema".to_string()),
                identifier: None,
            },
            Some(RelationType::Table),
            Policy::enabled(),
            DEFAULT_RESOLVED_QUOTING,
        )
        .unwrap();

        assert_eq!(relation.get_database().unwrap(), "db");
        assert_eq!(
            relation.get_identifier().unwrap_err().code(),
            ErrorCode::InvalidConfig
        );
    }

    #[test]
    fn test_create_relation() {
        let relation = from_source(&source("orders", "orders"));
        let new_relation = relation
            .create_relation(
                Some("new_db".to_string()),
                Some("new_schema".to_string()),
                Some("new_table".to_string()),
                Some(RelationType::View),
                DEFAULT_RESOLVED_QUOTING,
            )
            .unwrap();

        assert_eq!(new_relation.relation_type(), Some(RelationType::View));
        assert_eq!(
            new_relation.render_self_as_str(),
            "\"new_db\".\"new_schema\".\"new_table\""
        );
    }

    #[test]
    fn test_as_any() {
        let relation = from_source(&source("orders", "orders"));
        assert!(relation.as_any().downcast_ref::<DuckdbRelation>().is_some());
    }
}
