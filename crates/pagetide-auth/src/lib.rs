//! OAuth2 token acquisition and lifecycle management
//!
//! Provides the token endpoint grants (client credentials, refresh token,
//! resource owner password) and the [`TokenManager`], which caches the
//! current token set, deduplicates concurrent acquisitions into one
//! in-flight request, and carries refresh tokens across renewals. This
//! crate is a standalone library with no knowledge of the resource API —
//! the request layer lives in `pagetide-client`.
//!
//! Token flow:
//! 1. The embedding application builds a [`TokenFetcher`] (usually via
//!    [`client_credentials_fetcher`] or [`password_fetcher`])
//! 2. `TokenManager::get_token()` returns the cached set, or joins/starts
//!    the single in-flight acquisition
//! 3. A response carrying a `refresh_token` overwrites the stored one,
//!    which is handed to the fetcher on the next acquisition
//! 4. The request layer calls `TokenManager::invalidate()` when the server
//!    reports an expired token, forcing the next call to acquire anew

pub mod error;
pub mod fetcher;
pub mod manager;
pub mod secret;
pub mod token;

pub use error::{Error, Result};
pub use fetcher::{AppCredentials, client_credentials_fetcher, password_fetcher};
pub use manager::{TokenFetcher, TokenManager};
pub use secret::Secret;
pub use token::{TokenSet, client_credentials_grant, password_grant, refresh_token_grant};
