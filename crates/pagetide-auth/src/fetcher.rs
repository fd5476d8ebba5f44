//! Ready-made token fetch strategies
//!
//! A [`TokenFetcher`] closes over everything a grant needs so the
//! [`TokenManager`](crate::manager::TokenManager) can stay ignorant of
//! grant shapes. Two strategies cover the common wirings:
//! - [`client_credentials_fetcher`] always performs the client credentials
//!   grant (such tokens are typically not refreshable)
//! - [`password_fetcher`] performs the password grant on first acquisition
//!   and switches to the refresh token grant once a refresh token is stored

use std::sync::Arc;

use futures::FutureExt;

use crate::manager::TokenFetcher;
use crate::secret::Secret;
use crate::token::{client_credentials_grant, password_grant, refresh_token_grant};

/// Client application identity shared by every grant.
#[derive(Clone)]
pub struct AppCredentials {
    /// Absolute URL of the token endpoint.
    pub token_url: String,
    pub client_id: String,
    pub client_secret: Secret<String>,
}

/// Fetcher performing the `client_credentials` grant on every acquisition.
pub fn client_credentials_fetcher(http: reqwest::Client, app: AppCredentials) -> TokenFetcher {
    Arc::new(move |_refresh| {
        let http = http.clone();
        let app = app.clone();
        async move {
            client_credentials_grant(&http, &app.token_url, &app.client_id, &app.client_secret)
                .await
        }
        .boxed()
    })
}

/// Fetcher performing the `password` grant initially and the `refresh_token`
/// grant whenever a stored refresh token is available.
///
/// This is the refresh-based strategy: a refresh token carried over from an
/// earlier acquisition (or an external seed) replaces the user's password as
/// grant input on renewals.
pub fn password_fetcher(
    http: reqwest::Client,
    app: AppCredentials,
    username: String,
    password: Secret<String>,
    scope: Option<String>,
    extra: Vec<(String, String)>,
) -> TokenFetcher {
    Arc::new(move |refresh| {
        let http = http.clone();
        let app = app.clone();
        let username = username.clone();
        let password = password.clone();
        let scope = scope.clone();
        let extra = extra.clone();
        async move {
            match refresh {
                Some(refresh) => {
                    refresh_token_grant(
                        &http,
                        &app.token_url,
                        &app.client_id,
                        &app.client_secret,
                        &refresh,
                        scope.as_deref(),
                    )
                    .await
                }
                None => {
                    password_grant(
                        &http,
                        &app.token_url,
                        &app.client_id,
                        &app.client_secret,
                        &username,
                        &password,
                        scope.as_deref(),
                        &extra,
                    )
                    .await
                }
            }
        }
        .boxed()
    })
}
