//! Unified error handling for userdesk-core
//!
//! All transport failures are classified into a closed set of error kinds
//! at the API client boundary. Code above the client branches on the enum
//! variant, never on raw `reqwest` error shapes or message strings.

use thiserror::Error;

/// Core error type for userdesk-core
#[derive(Error, Debug)]
pub enum Error {
    /// Backend is unreachable: no response, timeout, or refused connection.
    /// Surfaced as a persistent status indicator, never a one-shot message.
    #[error("Cannot connect to backend server")]
    Connection,

    /// The backend rejected the credentials (HTTP 401). The session has
    /// already been cleared by the time this is returned.
    #[error("Session expired or unauthorized")]
    Auth,

    /// The backend rejected the request payload (HTTP 400). Carries the
    /// backend-provided message for inline display near the failing form.
    #[error("{0}")]
    Validation(String),

    /// Any other failure. Carries the backend message when one exists,
    /// otherwise a generic fallback. Never fatal to the application.
    #[error("{0}")]
    Unexpected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for userdesk-core
pub type Result<T> = std::result::Result<T, Error>;

/// Fallback message when the backend provides none
pub const GENERIC_ERROR_MESSAGE: &str = "An unexpected error occurred";

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create an unexpected error
    pub fn unexpected(msg: impl Into<String>) -> Self {
        Error::Unexpected(msg.into())
    }

    /// True when the failure means the backend could not be reached at all.
    /// Callers use this to drive the connection banner instead of a toast.
    pub fn is_connection(&self) -> bool {
        matches!(self, Error::Connection)
    }

    /// True when the failure is a global authentication failure (401).
    pub fn is_auth(&self) -> bool {
        matches!(self, Error::Auth)
    }
}

/// Classify a transport-level failure from reqwest.
///
/// A failure with no HTTP response behind it (timeout, refused connection,
/// DNS error, dropped socket) is a connection error. A body-decode failure
/// also carries no status, but the backend did answer, so it stays a
/// request error. Everything else that still managed to fail inside
/// reqwest is unexpected.
pub(crate) fn classify_transport(err: reqwest::Error) -> Error {
    if err.is_decode() {
        log::debug!("undecodable response body: {}", err);
        return Error::Unexpected(GENERIC_ERROR_MESSAGE.to_string());
    }
    if err.is_timeout() || err.is_connect() || err.status().is_none() {
        log::debug!("transport failure classified as connection error: {}", err);
        Error::Connection
    } else {
        Error::Unexpected(err.to_string())
    }
}
