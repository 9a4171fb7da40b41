//! Logger setup for binaries and tests.
//!
//! Library code only emits `tracing` events; installing a subscriber is left to whoever
//! drives the crates.

use crate::{ErrorCode, FsResult};
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// The environment variable that overrides the configured log filter.
pub const DBT_LOG_ENV: &str = "DBT_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone)]
pub struct FsLogConfig {
    pub max_level: LevelFilter,
    pub format: LogFormat,
    /// Route output through the test harness capture instead of stderr
    pub test_writer: bool,
}

impl Default for FsLogConfig {
    fn default() -> Self {
        Self {
            max_level: LevelFilter::INFO,
            format: LogFormat::Text,
            test_writer: false,
        }
    }
}

impl FsLogConfig {
    pub fn for_tests() -> Self {
        Self {
            max_level: LevelFilter::TRACE,
            format: LogFormat::Text,
            test_writer: true,
        }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::builder()
            .with_default_directive(self.max_level.into())
            .with_env_var(DBT_LOG_ENV)
            .from_env_lossy()
    }
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_logger(config: FsLogConfig) -> FsResult<()> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(config.env_filter())
        .with_target(true);

    let result = match (config.format, config.test_writer) {
        (LogFormat::Text, false) => builder.try_init(),
        (LogFormat::Text, true) => builder.with_test_writer().try_init(),
        (LogFormat::Json, false) => builder.json().try_init(),
        (LogFormat::Json, true) => builder.json().with_test_writer().try_init(),
    };

    result.map_err(|e| fs_err!(ErrorCode::Generic, "Failed to initialize logger: {e}"))
}
