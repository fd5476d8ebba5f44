//! Authenticated request issuing and verb mapping
//!
//! Every operation acquires a bearer token from the [`TokenManager`], issues
//! the request through the [`Transport`], and runs the expired-token repair
//! protocol: a 401 whose body carries `{"error": "invalid_grant"}` (the
//! canonical expiry signal, as opposed to other 401s such as bad
//! credentials) invalidates the cached token, forces one re-acquisition,
//! and replays the identical request exactly once. A second expiry on the
//! replay is terminal, which keeps a misconfigured server from inducing an
//! infinite renew/replay loop.

use std::sync::Arc;

use reqwest::Method;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use serde_json::Value;
use tracing::{debug, warn};

use pagetide_auth::TokenManager;

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::transport::{Request, Response, Transport};

/// Body error code distinguishing an expired token from other 401s.
const INVALID_GRANT: &str = "invalid_grant";

/// Single-tenant client for one resource API behind one credential set.
pub struct Client {
    config: ClientConfig,
    tokens: Arc<TokenManager>,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(
        config: ClientConfig,
        tokens: Arc<TokenManager>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            config,
            tokens,
            transport,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The token manager backing this client, for seeding or invalidating
    /// tokens externally.
    pub fn tokens(&self) -> &Arc<TokenManager> {
        &self.tokens
    }

    /// Fetch a single resource by id. Fails with a validation error before
    /// any network call when `id` is empty.
    pub async fn get(
        &self,
        resource: &str,
        id: &str,
        params: &[(String, String)],
    ) -> Result<Response> {
        if id.is_empty() {
            return Err(Error::Validation("an id is required".into()));
        }
        let request = Request::new(Method::GET, self.config.url_for(resource, Some(id), params)?);
        self.send_authorized(request).await
    }

    /// Like [`get`], but unwraps the `result` member of the response body.
    ///
    /// [`get`]: Client::get
    pub async fn get_result(
        &self,
        resource: &str,
        id: &str,
        params: &[(String, String)],
    ) -> Result<Value> {
        let response = self.get(resource, id, params).await?;
        match response.body.get("result") {
            Some(result) => Ok(result.clone()),
            None => Err(Error::Decode("response body has no result member".into())),
        }
    }

    /// Fetch one page of a listing.
    pub async fn index(&self, resource: &str, params: &[(String, String)]) -> Result<Response> {
        let request = Request::new(Method::GET, self.config.url_for(resource, None, params)?);
        self.send_authorized(request).await
    }

    /// Create a resource.
    pub async fn post(&self, resource: &str, body: Value) -> Result<Response> {
        let request = Request::new(Method::POST, self.config.url_for(resource, None, &[])?)
            .with_body(body);
        self.send_authorized(request).await
    }

    /// Replace a resource by id. Fails with a validation error before any
    /// network call when `id` is empty.
    pub async fn put(&self, resource: &str, id: &str, body: Value) -> Result<Response> {
        if id.is_empty() {
            return Err(Error::Validation("an id is required".into()));
        }
        let request = Request::new(Method::PUT, self.config.url_for(resource, Some(id), &[])?)
            .with_body(body);
        self.send_authorized(request).await
    }

    /// Delete a resource by id.
    pub async fn delete(&self, resource: &str, id: &str) -> Result<Response> {
        let request = Request::new(Method::DELETE, self.config.url_for(resource, Some(id), &[])?);
        self.send_authorized(request).await
    }

    /// Delete by a filter-parameters body instead of an id, for
    /// bulk/conditional deletion.
    pub async fn delete_by_params(&self, resource: &str, body: Value) -> Result<Response> {
        let request = Request::new(Method::DELETE, self.config.url_for(resource, None, &[])?)
            .with_body(body);
        self.send_authorized(request).await
    }

    /// Attach the current bearer token, issue the request, and repair an
    /// expired token by renewing and replaying exactly once.
    pub(crate) async fn send_authorized(&self, mut request: Request) -> Result<Response> {
        let tokens = self.tokens.get_token().await?;
        set_bearer(&mut request, &tokens.access_token)?;
        let response = self.transport.issue(request.clone()).await?;

        if !is_expired_token(&response) {
            return check_status(response);
        }

        debug!(url = %request.url, "server reported an expired token, renewing and replaying");
        self.tokens.invalidate().await;
        let tokens = self.tokens.get_token().await?;
        set_bearer(&mut request, &tokens.access_token)?;
        let response = self.transport.issue(request).await?;

        if is_expired_token(&response) {
            warn!(status = response.status, "replay still reports an expired token, giving up");
            return Err(Error::AuthExpiry {
                status: response.status,
                body: response.body,
            });
        }
        check_status(response)
    }
}

fn set_bearer(request: &mut Request, access_token: &str) -> Result<()> {
    let value = HeaderValue::from_str(&format!("Bearer {access_token}")).map_err(|_| {
        Error::Auth(pagetide_auth::Error::MalformedResponse(
            "access token is not a valid header value".into(),
        ))
    })?;
    request.headers.insert(AUTHORIZATION, value);
    Ok(())
}

fn check_status(response: Response) -> Result<Response> {
    if response.status >= 400 {
        return Err(Error::Http {
            status: response.status,
            body: response.body,
        });
    }
    Ok(response)
}

/// Whether a response is the canonical expiry signal: status 401 with a body
/// (object, or JSON delivered inside a string) carrying
/// `{"error": "invalid_grant"}`. Unparsable string bodies are not an expiry
/// signal.
fn is_expired_token(response: &Response) -> bool {
    if response.status != 401 {
        return false;
    }
    let parsed;
    let body = match &response.body {
        Value::String(text) => match serde_json::from_str::<Value>(text) {
            Ok(value) => {
                parsed = value;
                &parsed
            }
            Err(_) => return false,
        },
        other => other,
    };
    body.get("error").and_then(Value::as_str) == Some(INVALID_GRANT)
}
