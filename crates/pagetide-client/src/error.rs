//! Error types for client operations

use serde_json::Value;

use crate::transport::TransportError;

/// Errors from client operations.
///
/// Only one condition is recovered locally (an expired token, renewed and
/// replayed once by the request layer); everything else propagates to the
/// caller of the originating operation unchanged.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid configuration, rejected at construction time.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A required identifier was missing. Detected before any network call.
    #[error("validation failed: {0}")]
    Validation(String),

    /// The network call failed outright; no HTTP response was obtained.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A response with status >= 400 that is not an expiry signal.
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: Value },

    /// The replayed request reported an expired token again. Terminal — no
    /// further retries.
    #[error("token still expired after renewal (HTTP {status}): {body}")]
    AuthExpiry { status: u16, body: Value },

    /// Token acquisition failed; the cached token set is unchanged.
    #[error("authentication failed: {0}")]
    Auth(#[from] pagetide_auth::Error),

    /// A response body did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, Error>;
