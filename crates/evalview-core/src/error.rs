use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::session::ChannelError;

/// Operator input rejected before any request is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Please enter a JOB_ID")]
    EmptyJobId,

    #[error("Invalid JOB_ID format. Expected UUID format.")]
    MalformedJobId { input: String },

    /// Drill-down needs a job that was successfully retrieved first.
    #[error("no results are loaded; fetch a job before opening details")]
    NoCurrentJob,
}

/// Top-level error type for the evalview-core library.
#[derive(Debug, Error)]
pub enum EvalviewError {
    /// Configuration read, parse or validation error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Local validation of operator input.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// HTTP API transport or decode failure.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Duplex terminal channel failure.
    #[error("channel error: {0}")]
    Channel(#[from] ChannelError),

    /// Wraps `std::io::Error`.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the library.
pub type Result<T> = std::result::Result<T, EvalviewError>;
