//! Errors raised by the push delivery pipeline
//!
//! Only [`PushError::TransientTransport`] is retried. Per-token rejections in
//! an otherwise successful gateway response are not errors at all; they are
//! reported as [`DeliveryOutcome`](crate::models::DeliveryOutcome)s.

use medremind_common::MedremindError;
use medremind_db::DbError;
use std::error::Error as StdError;
use thiserror::Error;

/// Service name used when surfacing gateway failures over HTTP
pub const GATEWAY_SERVICE_NAME: &str = "expo-push";

/// Errors that can occur while dispatching push notifications
#[derive(Error, Debug)]
pub enum PushError {
    /// The connection was interrupted before a response was obtained
    #[error("Transient transport error: {0}")]
    TransientTransport(String),

    /// Any other transport or client failure (DNS, refused connection, invalid request)
    #[error("Transport error: {0}")]
    Transport(String),

    /// The gateway answered with a non-success HTTP status
    #[error("Push gateway rejected the request with status {status}: {message}")]
    Gateway { status: u16, message: String },

    /// The gateway answered, but the body is not a push ticket list
    #[error("Invalid push gateway response: {0}")]
    InvalidResponse(String),

    /// Reading or writing device registrations failed
    #[error("Device store error: {0}")]
    Store(#[from] DbError),

    /// The caller supplied an unusable request
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Missing or invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl PushError {
    /// Whether a failed gateway call may be attempted again
    pub fn is_transient(&self) -> bool {
        matches!(self, PushError::TransientTransport(_))
    }

    /// Classifies a reqwest failure as transient or permanent.
    ///
    /// Timeouts and connections closed or reset before a complete response
    /// are transient. DNS failures, refused connections and everything else
    /// are permanent.
    pub fn from_transport(err: reqwest::Error) -> Self {
        let message = err.to_string();

        if err.is_builder() || err.is_connect() || err.is_redirect() {
            return PushError::Transport(message);
        }
        if err.is_timeout() || is_interrupted(&err) {
            return PushError::TransientTransport(message);
        }
        PushError::Transport(message)
    }
}

/// Walks the error chain looking for a connection interrupted mid-exchange
fn is_interrupted(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            if is_interrupted_io_kind(io.kind()) {
                return true;
            }
        }
        if is_interrupted_message(&e.to_string()) {
            return true;
        }
        current = e.source();
    }
    false
}

pub(crate) fn is_interrupted_io_kind(kind: std::io::ErrorKind) -> bool {
    use std::io::ErrorKind;
    matches!(
        kind,
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
            | ErrorKind::Interrupted
    )
}

pub(crate) fn is_interrupted_message(message: &str) -> bool {
    let message = message.to_ascii_lowercase();
    [
        "connection closed before message completed",
        "connection closed",
        "connection reset",
        "operation was canceled",
        "unexpected end of file",
        "premature close",
        "aborted",
    ]
    .iter()
    .any(|needle| message.contains(needle))
}

impl From<PushError> for MedremindError {
    fn from(err: PushError) -> Self {
        let message = err.to_string();
        match err {
            PushError::TransientTransport(_)
            | PushError::Transport(_)
            | PushError::Gateway { .. }
            | PushError::InvalidResponse(_) => MedremindError::ExternalServiceError {
                service_name: GATEWAY_SERVICE_NAME.to_string(),
                message,
            },
            PushError::Store(e) => MedremindError::DatabaseError(e.to_string()),
            PushError::InvalidRequest(m) => MedremindError::ValidationError(m),
            PushError::Config(m) => MedremindError::ConfigError(m),
        }
    }
}
