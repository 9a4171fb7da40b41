mod external_location;
mod relation;

pub use external_location::{quote_external_location, resolve_external_location};
pub use relation::{DuckdbRelation, DuckdbRelationType};
