//! Error taxonomy for storage operations

use hyper::StatusCode;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, R2Error>;

/// Errors surfaced by [`R2Client`](crate::r2::R2Client) operations.
///
/// Nothing is retried internally; [`R2Error::is_retryable`] tells callers
/// which failures are worth retrying as a whole operation.
#[derive(Error, Debug)]
pub enum R2Error {
    /// Caller-supplied input rejected before any signing or network work.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Canonical request construction was internally inconsistent.
    /// A programming defect, not a runtime condition to retry.
    #[error("request signing failed: {0}")]
    Signing(String),

    /// The storage backend rejected the request, or the transport failed.
    #[error("storage operation failed: {0}")]
    Storage(#[from] StorageFailure),
}

/// Underlying cause of a failed storage round trip.
#[derive(Error, Debug)]
pub enum StorageFailure {
    /// Backend answered with a non-2xx status.
    #[error("unexpected status {status}: {message}")]
    Response { status: StatusCode, message: String },

    /// The request never completed: DNS, connect, TLS, or timeout.
    #[error(transparent)]
    Transport(#[from] TransportError),
}

/// Transport-level failures, kept distinct so callers can tell a rejected
/// request from one that never reached the backend.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request build failed: {0}")]
    Build(#[from] hyper::http::Error),

    #[error("connection failed: {0}")]
    Connect(#[from] hyper_util::client::legacy::Error),

    #[error("response body read failed: {0}")]
    Body(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),
}

impl R2Error {
    /// Whether a caller-driven retry of the whole operation is worthwhile.
    ///
    /// PUT and DELETE are idempotent by key, so throttling and transport
    /// failures are safe to retry. Client-side rejections and local defects
    /// are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            R2Error::Validation(_) | R2Error::Signing(_) => false,
            R2Error::Storage(StorageFailure::Response { status, .. }) => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            R2Error::Storage(StorageFailure::Transport(err)) => {
                !matches!(err, TransportError::Build(_))
            }
        }
    }
}

impl From<TransportError> for R2Error {
    fn from(err: TransportError) -> Self {
        R2Error::Storage(StorageFailure::Transport(err))
    }
}
