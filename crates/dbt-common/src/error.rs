use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{AsRefStr, Display};

/// Error codes surfaced to users.
///
/// The numeric value of each code is stable and is what gets printed as `dbtNNNN`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, AsRefStr, Serialize, Deserialize,
)]
#[repr(u16)]
pub enum ErrorCode {
    Generic = 1,
    InvalidConfig = 2,
    InvalidArgument = 3,
    SerializationError = 4,
    FmtError = 5,
    IoError = 6,
    JinjaError = 7,
    Unexpected = 999,
}

impl ErrorCode {
    pub const fn as_u16(self) -> u16 {
        self as u16
    }
}

/// The error type returned by fallible operations across the dbt crates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FsError {
    pub code: ErrorCode,
    pub msg: String,
}

/// Errors are boxed so that `Result`s stay small on the happy path.
pub type FsResult<T, E = Box<FsError>> = Result<T, E>;

impl FsError {
    pub fn new(code: ErrorCode, msg: impl Into<String>) -> Self {
        Self {
            code,
            msg: msg.into(),
        }
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.msg
    }
}

impl fmt::Display for FsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dbt{:04}: {}", self.code.as_u16(), self.msg)
    }
}

impl std::error::Error for FsError {}

impl From<Box<FsError>> for minijinja::Error {
    fn from(err: Box<FsError>) -> Self {
        minijinja::Error::new(minijinja::ErrorKind::InvalidOperation, err.to_string())
    }
}

impl From<minijinja::Error> for Box<FsError> {
    fn from(err: minijinja::Error) -> Self {
        Box::new(FsError::new(ErrorCode::JinjaError, err.to_string()))
    }
}
