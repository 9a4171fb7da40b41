//! Sources as declared in `sources:` YAML blocks, and the flattened per-table
//! [`SourceDefinition`] that relations are built from.

use crate::schemas::common::DbtQuoting;
use crate::schemas::serde::{YmlValue, typed_struct_from_yaml_file, typed_struct_from_yaml_str};

use dbt_common::{ErrorCode, FsError, FsResult, fs_err};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use std::path::Path;

/// The meta key that points a source at a file or table function instead of a table
pub const EXTERNAL_LOCATION_KEY: &str = "external_location";

/// Free-form `meta:` mapping, kept in declaration order
pub type Meta = IndexMap<String, YmlValue>;

/// A YAML file containing a top level `sources:` list. Other top level keys are ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbtSourcesFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<YmlValue>,
    #[serde(default)]
    pub sources: Vec<DbtSource>,
}

impl DbtSourcesFile {
    pub fn from_yaml_str(yaml: &str) -> FsResult<Self> {
        typed_struct_from_yaml_str(yaml, None)
    }

    pub fn from_path(path: &Path) -> FsResult<Self> {
        typed_struct_from_yaml_file(path)
    }

    pub fn definitions(&self) -> Vec<SourceDefinition> {
        self.sources.iter().flat_map(DbtSource::definitions).collect()
    }

    /// Looks up a table the way `source('source_name', 'table_name')` does
    pub fn find(&self, source_name: &str, table_name: &str) -> Option<SourceDefinition> {
        let source = self.sources.iter().find(|source| source.name == source_name)?;
        let table = source.tables.iter().find(|table| table.name == table_name)?;
        Some(SourceDefinition::from_parts(source, table))
    }
}

/// One entry of the `sources:` list
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DbtSource {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub quoting: DbtQuoting,
    #[serde(default)]
    pub tables: Vec<SourceTable>,
}

impl DbtSource {
    pub fn definitions(&self) -> Vec<SourceDefinition> {
        self.tables
            .iter()
            .map(|table| SourceDefinition::from_parts(self, table))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceTable {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub meta: Meta,
    #[serde(default)]
    pub quoting: DbtQuoting,
}

/// A single source table with everything inherited from its group filled in.
///
/// `meta` belongs to the table, `source_meta` to the group it was declared in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RawSourceDefinition")]
pub struct SourceDefinition {
    pub source_name: String,
    pub name: String,
    pub identifier: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub meta: Meta,
    pub source_meta: Meta,
    pub quoting: DbtQuoting,
}

impl SourceDefinition {
    fn from_parts(source: &DbtSource, table: &SourceTable) -> Self {
        Self {
            source_name: source.name.clone(),
            name: table.name.clone(),
            identifier: table.identifier.clone().unwrap_or_else(|| table.name.clone()),
            database: source.database.clone(),
            schema: Some(source.schema.clone().unwrap_or_else(|| source.name.clone())),
            meta: table.meta.clone(),
            source_meta: source.meta.clone(),
            quoting: source.quoting.merged_with(table.quoting),
        }
    }

    /// `external_location` from the table's own meta, verbatim.
    ///
    /// A present key always shadows the group level. Falsy YAML values (`~`, `false`, `0`,
    /// empty collections) resolve to `""`, meaning no override.
    pub fn meta_external_location(&self) -> FsResult<Option<&str>> {
        match self.meta.get(EXTERNAL_LOCATION_KEY) {
            None => Ok(None),
            Some(YmlValue::String(location)) => Ok(Some(location.as_str())),
            Some(value) if is_falsy(value) => Ok(Some("")),
            Some(other) => Err(self.not_a_string("meta", other)),
        }
    }

    /// `external_location` from the group's meta, still an unexpanded template.
    ///
    /// Unlike the table level, anything but a string is rejected here since it can not be
    /// expanded.
    pub fn source_meta_external_location(&self) -> FsResult<Option<&str>> {
        match self.source_meta.get(EXTERNAL_LOCATION_KEY) {
            None => Ok(None),
            Some(YmlValue::String(template)) => Ok(Some(template.as_str())),
            Some(other) => Err(self.not_a_string("source meta", other)),
        }
    }

    fn not_a_string(&self, which: &str, value: &YmlValue) -> Box<FsError> {
        fs_err!(
            ErrorCode::InvalidConfig,
            "'{EXTERNAL_LOCATION_KEY}' in the {which} of source '{}.{}' must be a string, got: {}",
            self.source_name,
            self.name,
            serde_yaml::to_string(value).unwrap_or_default().trim_end()
        )
    }
}

fn is_falsy(value: &YmlValue) -> bool {
    match value {
        YmlValue::Null => true,
        YmlValue::Bool(b) => !b,
        YmlValue::Number(n) => n.as_f64() == Some(0.0),
        YmlValue::String(s) => s.is_empty(),
        YmlValue::Sequence(seq) => seq.is_empty(),
        YmlValue::Mapping(map) => map.is_empty(),
        YmlValue::Tagged(tagged) => is_falsy(&tagged.value),
    }
}

/// Wire form of a [`SourceDefinition`] where inherited fields may be omitted
#[derive(Deserialize)]
struct RawSourceDefinition {
    #[serde(default)]
    source_name: String,
    name: String,
    #[serde(default)]
    identifier: Option<String>,
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    schema: Option<String>,
    #[serde(default)]
    meta: Meta,
    #[serde(default)]
    source_meta: Meta,
    #[serde(default)]
    quoting: DbtQuoting,
}

impl From<RawSourceDefinition> for SourceDefinition {
    fn from(raw: RawSourceDefinition) -> Self {
        let schema = match raw.schema {
            Some(schema) => Some(schema),
            None if !raw.source_name.is_empty() => Some(raw.source_name.clone()),
            None => None,
        };
        Self {
            identifier: raw.identifier.unwrap_or_else(|| raw.name.clone()),
            source_name: raw.source_name,
            name: raw.name,
            database: raw.database,
            schema,
            meta: raw.meta,
            source_meta: raw.source_meta,
            quoting: raw.quoting,
        }
    }
}
