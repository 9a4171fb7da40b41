pub mod base;

use crate::schemas::common::ResolvedQuoting;

/// Every part of a relation name is quoted unless the project says otherwise
pub const DEFAULT_RESOLVED_QUOTING: ResolvedQuoting = ResolvedQuoting {
    database: true,
    schema: true,
    identifier: true,
};
