//! Relation implementations for different data warehouses.

pub mod duckdb;

mod relation_object;
pub use relation_object::{
    RelationObject, StaticBaseRelation, StaticBaseRelationObject, relation_options_from_kwargs,
};
