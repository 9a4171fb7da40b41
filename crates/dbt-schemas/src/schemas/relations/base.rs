//! The adapter-independent half of a relation: naming parts, policies and the default
//! rendering. Adapters implement [`BaseRelation`] and override what differs.

use crate::dbt_types::RelationType;
use crate::schemas::common::DbtQuoting;

use dbt_common::FsResult;
use minijinja::value::{Kwargs, from_args};
use minijinja::{Error as MinijinjaError, Value};
use serde::{Deserialize, Serialize};

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Per-part flags, used both for which parts to include and which parts to quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Policy {
    pub database: bool,
    pub schema: bool,
    pub identifier: bool,
}

impl Policy {
    pub const fn enabled() -> Self {
        Self {
            database: true,
            schema: true,
            identifier: true,
        }
    }

    pub const fn disabled() -> Self {
        Self {
            database: false,
            schema: false,
            identifier: false,
        }
    }
}

impl Default for Policy {
    fn default() -> Self {
        Self::enabled()
    }
}

/// The database, schema, and identifier of a relation
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationPath {
    pub database: Option<String>,
    pub schema: Option<String>,
    pub identifier: Option<String>,
}

/// Extra parameters forwarded when a relation is built from a source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RelationOptions {
    pub relation_type: Option<RelationType>,
    /// Defaults to including every part
    pub include_policy: Option<Policy>,
    /// Applied on top of the quoting the source resolved to
    pub quote_policy: DbtQuoting,
}

pub trait BaseRelationProperties {
    fn include_policy(&self) -> Policy;

    fn quote_policy(&self) -> Policy;

    fn quote_character(&self) -> char;

    fn get_database(&self) -> FsResult<String>;

    fn get_schema(&self) -> FsResult<String>;

    fn get_identifier(&self) -> FsResult<String>;
}

pub trait BaseRelation: BaseRelationProperties + Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;

    fn path(&self) -> &RelationPath;

    fn relation_type(&self) -> Option<RelationType>;

    /// Wraps this relation so it can be handed to Jinja
    fn as_value(&self) -> Value;

    fn adapter_type(&self) -> Option<String>;

    /// Builds a copy of this relation with a different include policy
    fn include_inner(&self, include_policy: Policy) -> Result<Value, MinijinjaError>;

    /// Builds a copy of this relation with a different quote policy
    fn quote_inner(&self, quote_policy: Policy) -> Result<Value, MinijinjaError>;

    fn normalize_component(&self, component: &str) -> String;

    fn create_relation(
        &self,
        database: Option<String>,
        schema: Option<String>,
        identifier: Option<String>,
        relation_type: Option<RelationType>,
        custom_quoting: Policy,
    ) -> Result<Arc<dyn BaseRelation>, MinijinjaError>;

    /// Attributes only some adapters know about, looked up by name from Jinja
    fn adapter_attribute(&self, _key: &str) -> Option<Value> {
        None
    }

    fn database(&self) -> Value {
        Value::from(self.path().database.clone())
    }

    fn schema(&self) -> Value {
        Value::from(self.path().schema.clone())
    }

    fn identifier(&self) -> Value {
        Value::from(self.path().identifier.clone())
    }

    fn quoted(&self, part: &str) -> String {
        let quote = self.quote_character();
        format!("{quote}{part}{quote}")
    }

    /// `database.schema.identifier`, keeping only included parts that are set and quoting
    /// the ones the quote policy asks for.
    fn render_qualified_name(&self) -> String {
        let path = self.path();
        let include = self.include_policy();
        let quote = self.quote_policy();

        [
            (path.database.as_deref(), include.database, quote.database),
            (path.schema.as_deref(), include.schema, quote.schema),
            (path.identifier.as_deref(), include.identifier, quote.identifier),
        ]
        .into_iter()
        .filter_map(|(part, included, quoted)| match part {
            Some(part) if included => Some(if quoted {
                self.quoted(part)
            } else {
                part.to_string()
            }),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(".")
    }

    /// The string used to reference this relation in generated SQL
    fn render_self_as_str(&self) -> String {
        self.render_qualified_name()
    }

    fn render_self(&self) -> Result<Value, MinijinjaError> {
        Ok(Value::from(self.render_self_as_str()))
    }

    fn is_table(&self) -> bool {
        self.relation_type() == Some(RelationType::Table)
    }

    fn is_view(&self) -> bool {
        self.relation_type() == Some(RelationType::View)
    }

    fn is_cte(&self) -> bool {
        self.relation_type() == Some(RelationType::CTE)
    }

    /// `relation.include(database=false)` from Jinja; unset parts keep their current value
    fn include(&self, args: &[Value]) -> Result<Value, MinijinjaError> {
        let policy = policy_from_args(args, self.include_policy())?;
        self.include_inner(policy)
    }

    /// `relation.quote(identifier=false)` from Jinja; unset parts keep their current value
    fn quote(&self, args: &[Value]) -> Result<Value, MinijinjaError> {
        let policy = policy_from_args(args, self.quote_policy())?;
        self.quote_inner(policy)
    }
}

/// Reads `(database, schema, identifier)` flags, positional or by keyword, over `current`
fn policy_from_args(args: &[Value], current: Policy) -> Result<Policy, MinijinjaError> {
    let (database, schema, identifier, kwargs): (
        Option<bool>,
        Option<bool>,
        Option<bool>,
        Kwargs,
    ) = from_args(args)?;

    let policy = Policy {
        database: kwargs
            .get::<Option<bool>>("database")?
            .or(database)
            .unwrap_or(current.database),
        schema: kwargs
            .get::<Option<bool>>("schema")?
            .or(schema)
            .unwrap_or(current.schema),
        identifier: kwargs
            .get::<Option<bool>>("identifier")?
            .or(identifier)
            .unwrap_or(current.identifier),
    };
    kwargs.assert_all_used()?;
    Ok(policy)
}
