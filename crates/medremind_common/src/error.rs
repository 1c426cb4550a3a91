// --- File: crates/medremind_common/src/error.rs ---
use thiserror::Error;

/// The base error type surfaced by MedRemind HTTP handlers.
///
/// Crate-specific errors convert into this type at the handler boundary.
#[derive(Error, Debug)]
pub enum MedremindError {
    /// Error occurred due to missing or invalid configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Error occurred during validation
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Error occurred during database operation
    #[error("Database error: {0}")]
    DatabaseError(String),

    /// Error occurred during external service call
    #[error("External service error: {service_name} - {message}")]
    ExternalServiceError {
        service_name: String,
        message: String,
    },

    /// Error occurred due to an internal error
    #[error("Internal error: {0}")]
    InternalError(String),
}

/// A trait for converting errors to HTTP status codes.
pub trait HttpStatusCode {
    /// Returns the HTTP status code for this error.
    fn status_code(&self) -> u16;
}

impl HttpStatusCode for MedremindError {
    fn status_code(&self) -> u16 {
        match self {
            MedremindError::ConfigError(_) => 500,
            MedremindError::ValidationError(_) => 400,
            MedremindError::DatabaseError(_) => 500,
            MedremindError::ExternalServiceError { .. } => 502,
            MedremindError::InternalError(_) => 500,
        }
    }
}
