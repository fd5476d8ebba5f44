//! Token endpoint grants
//!
//! The three OAuth2 grant shapes this client speaks, all as form-encoded
//! POSTs against the configured token endpoint:
//! 1. `client_credentials` — service-to-service acquisition
//! 2. `refresh_token` — silent renewal using a previously issued refresh token
//! 3. `password` — resource owner credentials, with optional extra form fields
//!
//! Every successful response must carry an `access_token`; its absence is a
//! protocol violation and surfaces as [`Error::MalformedResponse`].

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::secret::Secret;

/// The current bearer token plus the refresh token it arrived with, if any.
///
/// Immutable once constructed: a renewal produces a new `TokenSet`, it never
/// mutates the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSet {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

/// Wire shape of a token endpoint response, before validation.
#[derive(Deserialize)]
struct RawTokenResponse {
    access_token: Option<String>,
    refresh_token: Option<String>,
}

/// Obtain tokens with the `client_credentials` grant.
pub async fn client_credentials_grant(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &Secret<String>,
) -> Result<TokenSet> {
    debug!(token_url, "requesting client_credentials grant");
    post_grant(
        client,
        token_url,
        &[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret.reveal()),
        ],
    )
    .await
}

/// Renew tokens with the `refresh_token` grant.
pub async fn refresh_token_grant(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &Secret<String>,
    refresh_token: &str,
    scope: Option<&str>,
) -> Result<TokenSet> {
    debug!(token_url, "requesting refresh_token grant");
    let mut form = vec![
        ("grant_type", "refresh_token"),
        ("client_id", client_id),
        ("client_secret", client_secret.reveal()),
        ("refresh_token", refresh_token),
    ];
    if let Some(scope) = scope {
        form.push(("scope", scope));
    }
    post_grant(client, token_url, &form).await
}

/// Obtain tokens with the resource owner `password` grant.
///
/// `extra` fields are merged into the form body as-is, for token endpoints
/// that need vendor-specific parameters alongside the standard ones.
pub async fn password_grant(
    client: &reqwest::Client,
    token_url: &str,
    client_id: &str,
    client_secret: &Secret<String>,
    username: &str,
    password: &Secret<String>,
    scope: Option<&str>,
    extra: &[(String, String)],
) -> Result<TokenSet> {
    debug!(token_url, username, "requesting password grant");
    let mut form = vec![
        ("grant_type", "password"),
        ("client_id", client_id),
        ("client_secret", client_secret.reveal()),
        ("username", username),
        ("password", password.reveal()),
    ];
    for (key, value) in extra {
        form.push((key.as_str(), value.as_str()));
    }
    if let Some(scope) = scope {
        form.push(("scope", scope));
    }
    post_grant(client, token_url, &form).await
}

/// POST a form-encoded grant and validate the JSON response.
async fn post_grant(
    client: &reqwest::Client,
    token_url: &str,
    form: &[(&str, &str)],
) -> Result<TokenSet> {
    let response = client
        .post(token_url)
        .form(form)
        .send()
        .await
        .map_err(|e| Error::Http(format!("token request failed: {e}")))?;

    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| Error::Http(format!("reading token response failed: {e}")))?;

    if !status.is_success() {
        return Err(Error::TokenEndpoint {
            status: status.as_u16(),
            body,
        });
    }

    let raw: RawTokenResponse = serde_json::from_str(&body)
        .map_err(|e| Error::MalformedResponse(format!("invalid JSON from token endpoint: {e}")))?;

    match raw.access_token {
        Some(access_token) => Ok(TokenSet {
            access_token,
            refresh_token: raw.refresh_token,
        }),
        None => Err(Error::MalformedResponse(
            "response is missing access_token".into(),
        )),
    }
}
