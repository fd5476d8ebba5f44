//! Error types for token operations

/// Errors from token endpoint and manager operations.
///
/// `Clone` because a failed single-flight acquisition is fanned out to every
/// caller awaiting the same in-flight attempt.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token endpoint returned {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("malformed token response: {0}")]
    MalformedResponse(String),
}

/// Result alias for token operations.
pub type Result<T> = std::result::Result<T, Error>;
