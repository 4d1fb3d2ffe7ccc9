//! Error types.
//!
//! Three layers, from innermost to outermost:
//!
//! - [`EstimateError`]: a single estimate failed. Always converted into a
//!   failure response at the estimator boundary; never fatal.
//! - [`ArtifactError`]: the artifact bundle could not be loaded or is
//!   inconsistent. Fatal at start-up.
//! - [`AppError`]: process-level error carrying the exit code for `main`.

use std::path::PathBuf;

use thiserror::Error;

/// Per-request failure taxonomy.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    /// The request body is not a JSON object.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("field `{field}` has the wrong type: {message}")]
    TypeConversion { field: &'static str, message: String },

    /// Parsed fine, but outside the domain the model accepts.
    #[error("field `{field}` is out of range: {message}")]
    InvalidValue { field: &'static str, message: String },

    #[error("inference failed: {0}")]
    Inference(String),
}

impl EstimateError {
    pub(crate) fn type_conversion(field: &'static str, message: impl Into<String>) -> Self {
        Self::TypeConversion {
            field,
            message: message.into(),
        }
    }

    pub(crate) fn invalid_value(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field,
            message: message.into(),
        }
    }
}

/// Failure while loading or validating the artifact bundle.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to read artifact '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse artifact '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid artifact bundle: {0}")]
    Invalid(String),
}

impl ArtifactError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}

/// Process-level error with the exit code `main` should return.
#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

impl From<ArtifactError> for AppError {
    fn from(err: ArtifactError) -> Self {
        AppError::new(2, format!("Failed to load artifacts: {err}"))
    }
}
