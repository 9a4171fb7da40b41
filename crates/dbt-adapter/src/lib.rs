//! The dbt adapter layer.

pub mod factory;
pub mod relation;

pub use factory::create_static_relation;
pub use relation::{RelationObject, StaticBaseRelation, StaticBaseRelationObject};
