pub mod common;
pub mod relations;
pub mod serde;
pub mod sources;

pub use sources::{DbtSource, DbtSourcesFile, SourceDefinition, SourceTable};
