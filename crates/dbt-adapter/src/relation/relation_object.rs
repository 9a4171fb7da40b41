use dbt_common::{ErrorCode, FsError};
use dbt_schemas::dbt_types::RelationType;
use dbt_schemas::schemas::SourceDefinition;
use dbt_schemas::schemas::common::{DbtQuoting, ResolvedQuoting};
use dbt_schemas::schemas::relations::base::{
    BaseRelation, BaseRelationProperties, Policy, RelationOptions,
};
use dbt_schemas::schemas::serde::minijinja_value_to_typed_struct;
use minijinja::value::{Kwargs, Object, ObjectRepr, from_args};
use minijinja::{Error as MinijinjaError, ErrorKind as MinijinjaErrorKind, State, Value};

use std::fmt;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// A Jinja-facing wrapper around a relation.
///
/// Renders as the relation's SQL string, so `{{ relation }}` in a model is all it takes to
/// reference it.
#[derive(Clone, Debug)]
pub struct RelationObject(Arc<dyn BaseRelation>);

impl RelationObject {
    pub fn new(relation: Arc<dyn BaseRelation>) -> Self {
        Self(relation)
    }

    pub fn inner(&self) -> Arc<dyn BaseRelation> {
        self.0.clone()
    }

    pub fn into_value(self) -> Value {
        Value::from_object(self)
    }
}

impl Deref for RelationObject {
    type Target = dyn BaseRelation;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl Object for RelationObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn get_value(self: &Arc<Self>, key: &Value) -> Option<Value> {
        match key.as_str()? {
            "database" => Some(self.database()),
            "schema" => Some(self.schema()),
            "identifier" | "name" => Some(self.identifier()),
            "type" => Some(Value::from(
                self.relation_type().map(|relation_type| relation_type.to_string()),
            )),
            "is_table" => Some(Value::from(self.is_table())),
            "is_view" => Some(Value::from(self.is_view())),
            "is_cte" => Some(Value::from(self.is_cte())),
            "quote_policy" => Some(Value::from_serialize(self.quote_policy())),
            "include_policy" => Some(Value::from_serialize(self.include_policy())),
            key => self.adapter_attribute(key),
        }
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, MinijinjaError> {
        match method {
            "render" => {
                expect_no_args(method, args)?;
                self.render_self()
            }
            "include" => self.include(args),
            "quote" => self.quote(args),
            _ => Err(MinijinjaError::new(
                MinijinjaErrorKind::UnknownMethod,
                format!("relation has no method named '{method}'"),
            )),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.render_self_as_str())
    }
}

/// The static side of a relation type, exposed to Jinja as `api.Relation`
pub trait StaticBaseRelation: fmt::Debug + Send + Sync {
    /// Create a new relation from the given parameters
    fn try_new(
        &self,
        database: Option<String>,
        schema: Option<String>,
        identifier: Option<String>,
        relation_type: Option<RelationType>,
        custom_quoting: Option<ResolvedQuoting>,
    ) -> Result<Value, MinijinjaError>;

    /// Create a relation that references a declared source
    fn create_from_source(
        &self,
        source: &SourceDefinition,
        options: RelationOptions,
    ) -> Result<Value, MinijinjaError>;

    fn get_adapter_type(&self) -> String;
}

/// Jinja object wrapping a [`StaticBaseRelation`]
#[derive(Clone, Debug)]
pub struct StaticBaseRelationObject(Arc<dyn StaticBaseRelation>);

impl StaticBaseRelationObject {
    pub fn new(relation_type: Arc<dyn StaticBaseRelation>) -> Self {
        Self(relation_type)
    }

    /// `api.Relation.create(database=, schema=, identifier=, type=, quote_policy=)`
    fn create(&self, args: &[Value]) -> Result<Value, MinijinjaError> {
        let (database, schema, identifier, kwargs): (
            Option<String>,
            Option<String>,
            Option<String>,
            Kwargs,
        ) = from_args(args)?;

        let database = kwargs.get::<Option<String>>("database")?.or(database);
        let schema = kwargs.get::<Option<String>>("schema")?.or(schema);
        let identifier = kwargs.get::<Option<String>>("identifier")?.or(identifier);
        let relation_type = relation_type_from_kwargs(&kwargs)?;
        let custom_quoting = match kwargs.get::<Option<Value>>("quote_policy")? {
            Some(value) => Some(policy_from_value(&value, "quote_policy")?),
            None => None,
        };
        kwargs.assert_all_used()?;

        self.0
            .try_new(database, schema, identifier, relation_type, custom_quoting)
    }

    /// `api.Relation.create_from_source(source, type=, quote_policy=, include_policy=)`
    fn create_from_source(&self, args: &[Value]) -> Result<Value, MinijinjaError> {
        let (source, kwargs): (Value, Kwargs) = from_args(args)?;
        let source: SourceDefinition = minijinja_value_to_typed_struct(&source)
            .map_err(|e| invalid_argument("source", &e))?;
        let options = relation_options_from_kwargs(&kwargs)?;
        kwargs.assert_all_used()?;

        self.0.create_from_source(&source, options)
    }
}

impl Object for StaticBaseRelationObject {
    fn repr(self: &Arc<Self>) -> ObjectRepr {
        ObjectRepr::Plain
    }

    fn call_method(
        self: &Arc<Self>,
        _state: &State<'_, '_>,
        method: &str,
        args: &[Value],
    ) -> Result<Value, MinijinjaError> {
        match method {
            "create" => self.create(args),
            "create_from_source" => self.create_from_source(args),
            "get_adapter_type" => {
                expect_no_args(method, args)?;
                Ok(Value::from(self.0.get_adapter_type()))
            }
            _ => Err(MinijinjaError::new(
                MinijinjaErrorKind::UnknownMethod,
                format!("api.Relation has no method named '{method}'"),
            )),
        }
    }

    fn render(self: &Arc<Self>, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} Relation>", self.0.get_adapter_type())
    }
}

/// Reads the `type`, `quote_policy` and `include_policy` keyword arguments.
///
/// Policies may be partial; `include_policy` fills the gaps with "include".
pub fn relation_options_from_kwargs(kwargs: &Kwargs) -> Result<RelationOptions, MinijinjaError> {
    let relation_type = relation_type_from_kwargs(kwargs)?;
    let quote_policy = match kwargs.get::<Option<Value>>("quote_policy")? {
        Some(value) => partial_policy_from_value(&value, "quote_policy")?,
        None => DbtQuoting::default(),
    };
    let include_policy = match kwargs.get::<Option<Value>>("include_policy")? {
        Some(value) => Some(
            partial_policy_from_value(&value, "include_policy")?.apply_to(Policy::enabled()),
        ),
        None => None,
    };

    Ok(RelationOptions {
        relation_type,
        include_policy,
        quote_policy,
    })
}

fn relation_type_from_kwargs(kwargs: &Kwargs) -> Result<Option<RelationType>, MinijinjaError> {
    kwargs
        .get::<Option<&str>>("type")?
        .map(|relation_type| {
            RelationType::from_str(relation_type).map_err(|_| {
                MinijinjaError::new(
                    MinijinjaErrorKind::InvalidOperation,
                    format!("unknown relation type '{relation_type}'"),
                )
            })
        })
        .transpose()
}

fn expect_no_args(method: &str, args: &[Value]) -> Result<(), MinijinjaError> {
    if args.is_empty() {
        Ok(())
    } else {
        Err(MinijinjaError::new(
            MinijinjaErrorKind::TooManyArguments,
            format!("{method}() takes no arguments"),
        ))
    }
}

fn partial_policy_from_value(value: &Value, arg: &str) -> Result<DbtQuoting, MinijinjaError> {
    minijinja_value_to_typed_struct(value).map_err(|e| invalid_argument(arg, &e))
}

fn policy_from_value(value: &Value, arg: &str) -> Result<Policy, MinijinjaError> {
    Ok(partial_policy_from_value(value, arg)?.apply_to(Policy::enabled()))
}

fn invalid_argument(arg: &str, err: &FsError) -> MinijinjaError {
    let err = FsError::new(
        ErrorCode::InvalidArgument,
        format!("invalid '{arg}' argument: {}", err.message()),
    );
    MinijinjaError::new(MinijinjaErrorKind::InvalidOperation, err.to_string())
}
