//! Client for a paginated, OAuth2-protected REST API
//!
//! Maps CRUD-style operations (get, index, post, put, delete) onto HTTP
//! verbs, attaches bearer tokens from a `pagetide-auth` [`TokenManager`],
//! transparently repairs expired tokens (renew once, replay once), and
//! aggregates multi-page listings into one ordered result set.
//!
//! Request flow:
//! 1. A verb method builds a [`Request`] from the [`ClientConfig`] URL rules
//! 2. `TokenManager::get_token()` supplies the bearer token (cache hit or
//!    single-flight acquisition)
//! 3. The request goes out through the [`Transport`] collaborator
//! 4. A 401 with body `{"error": "invalid_grant"}` invalidates the cached
//!    token, re-acquires, and replays the identical request exactly once
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use pagetide_auth::{AppCredentials, TokenManager, client_credentials_fetcher};
//! use pagetide_client::{Client, ClientConfig, HttpTransport};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::new("https://api.example.com/v2")?;
//! let http = reqwest::Client::new();
//! let fetcher = client_credentials_fetcher(
//!     http.clone(),
//!     AppCredentials {
//!         token_url: config.token_url(),
//!         client_id: "my-client".into(),
//!         client_secret: "shh".into(),
//!     },
//! );
//! let client = Client::new(
//!     config,
//!     Arc::new(TokenManager::new(fetcher)),
//!     Arc::new(HttpTransport::new(http)),
//! );
//!
//! let widgets = client
//!     .index_all("widgets", &[("sort".into(), "name".into())])
//!     .await?;
//! println!("{} widgets", widgets.len());
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod pagination;
pub mod transport;

pub use client::Client;
pub use config::ClientConfig;
pub use error::{Error, Result};
pub use pagination::{ListPage, Pagination};
pub use transport::{HttpTransport, Request, Response, Transport, TransportError};
