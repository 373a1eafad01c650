//! Error handling for the migration tool
//!
//! The taxonomy mirrors how failures are scoped during a run:
//! - `Transport`: network/gRPC/HTTP failures, contained at the nearest
//!   per-resource boundary
//! - `Validation`: a single record failed translation, that record is skipped
//! - `Protocol`: a paginated response is inconsistent; fatal for the load,
//!   because continuing would silently under-migrate
//! - `Config`/`Io`: fatal bootstrap problems

use thiserror::Error;

/// Migration tool error type
#[derive(Error, Debug)]
pub enum MigrateError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network, gRPC or HTTP transport errors
    #[error("Transport error: {0}")]
    Transport(String),

    /// A source record failed business-rule validation during translation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A server response violated the expected pagination/shape contract
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Input/Output operation errors
    #[error("IO error: {0}")]
    Io(String),
}

impl MigrateError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}

impl From<tonic::Status> for MigrateError {
    fn from(status: tonic::Status) -> Self {
        Self::Transport(format!("{}: {}", status.code(), status.message()))
    }
}

impl From<tonic::transport::Error> for MigrateError {
    fn from(err: tonic::transport::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<reqwest::Error> for MigrateError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

impl From<std::io::Error> for MigrateError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for MigrateError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(format!("unexpected response shape: {err}"))
    }
}

/// Result type alias for the migration tool
pub type Result<T> = std::result::Result<T, MigrateError>;
