//! CLI-specific error types
//!
//! All CLI errors end the process with a non-zero status.

use std::fmt;
use std::io;

use crate::model::ConfigError;
use crate::store::StoreError;
use crate::trail::TrailError;

/// CLI error codes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliErrorCode {
    /// Configuration file error
    ConfigError,
    /// I/O error (stdout, log file)
    IoError,
    /// Malformed command argument
    InvalidArgument,
    /// Version log failed verification
    CorruptedLog,
    /// Reading history failed
    TrailError,
}

impl CliErrorCode {
    /// Get the error code string
    pub fn code(&self) -> &'static str {
        match self {
            Self::ConfigError => "AEROTRAIL_CLI_CONFIG_ERROR",
            Self::IoError => "AEROTRAIL_CLI_IO_ERROR",
            Self::InvalidArgument => "AEROTRAIL_CLI_INVALID_ARGUMENT",
            Self::CorruptedLog => "AEROTRAIL_CLI_CORRUPTED_LOG",
            Self::TrailError => "AEROTRAIL_CLI_TRAIL_ERROR",
        }
    }
}

/// CLI error
#[derive(Debug)]
pub struct CliError {
    code: CliErrorCode,
    message: String,
}

impl CliError {
    /// Create a new CLI error
    pub fn new(code: CliErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Config error
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::ConfigError, msg)
    }

    /// I/O error
    pub fn io_error(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::IoError, msg)
    }

    /// Invalid argument
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::new(CliErrorCode::InvalidArgument, msg)
    }

    /// No version log given on the command line or in the configuration
    pub fn missing_log_path() -> Self {
        Self::config_error("No version log given. Pass --log or set log_path in the configuration.")
    }

    /// Get the error code
    pub fn code(&self) -> &CliErrorCode {
        &self.code
    }

    /// Get the error code string
    pub fn code_str(&self) -> &'static str {
        self.code.code()
    }

    /// Get the error message
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.code(), self.message)
    }
}

impl std::error::Error for CliError {}

impl From<io::Error> for CliError {
    fn from(e: io::Error) -> Self {
        Self::io_error(e.to_string())
    }
}

impl From<serde_json::Error> for CliError {
    fn from(e: serde_json::Error) -> Self {
        Self::io_error(format!("JSON error: {}", e))
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        Self::config_error(e.to_string())
    }
}

impl From<StoreError> for CliError {
    fn from(e: StoreError) -> Self {
        if e.is_corruption() {
            Self::new(CliErrorCode::CorruptedLog, e.to_string())
        } else {
            Self::io_error(e.to_string())
        }
    }
}

impl From<TrailError> for CliError {
    fn from(e: TrailError) -> Self {
        match e {
            TrailError::Configuration(e) => e.into(),
            TrailError::StoreUnavailable(e) => e.into(),
            other => Self::new(CliErrorCode::TrailError, format!("{}: {}", other.code(), other)),
        }
    }
}

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;
