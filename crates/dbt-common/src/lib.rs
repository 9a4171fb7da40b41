//! Common building blocks shared by the dbt crates: error codes, logging setup and
//! Python-compatible string formatting.

#[macro_use]
pub mod macros;

pub mod adapter;
pub mod error;
pub mod logging;
pub mod pyformat;

pub use error::{ErrorCode, FsError, FsResult};
