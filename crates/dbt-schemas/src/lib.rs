//! Schemas shared between the dbt loader and the adapters.

pub mod dbt_types;
pub mod schemas;
