//! Client configuration
//!
//! Typed replacement for a loose settings bag: required values are validated
//! at construction rather than failing deep inside a request path.

use url::Url;

use crate::error::{Error, Result};

/// Default page size for listing aggregation.
pub const DEFAULT_MAX_LIMIT: usize = 500;

/// Default token endpoint path, relative to the base URL.
pub const DEFAULT_TOKEN_ENDPOINT: &str = "token";

/// Validated client settings: base URL, page size, token endpoint path.
///
/// Held by one [`Client`](crate::Client) instance; set once at construction,
/// read thereafter.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    base_url: Url,
    max_limit: usize,
    token_endpoint: String,
}

impl ClientConfig {
    /// Build a configuration around the API base URL.
    ///
    /// The URL must be absolute with an http(s) scheme. Trailing slashes are
    /// irrelevant; request URLs are joined uniformly either way.
    pub fn new(base_url: &str) -> Result<Self> {
        let url = Url::parse(base_url)
            .map_err(|e| Error::Config(format!("invalid base URL {base_url:?}: {e}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::Config(format!(
                "base URL must use http or https, got {}",
                url.scheme()
            )));
        }
        Ok(Self {
            base_url: url,
            max_limit: DEFAULT_MAX_LIMIT,
            token_endpoint: DEFAULT_TOKEN_ENDPOINT.to_owned(),
        })
    }

    /// Override the page size used by listing aggregation. Must be non-zero.
    pub fn with_max_limit(mut self, max_limit: usize) -> Result<Self> {
        if max_limit == 0 {
            return Err(Error::Config("max page size must be greater than 0".into()));
        }
        self.max_limit = max_limit;
        Ok(self)
    }

    /// Override the token endpoint path (relative to the base URL).
    pub fn with_token_endpoint(mut self, endpoint: &str) -> Self {
        self.token_endpoint = endpoint.trim_matches('/').to_owned();
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn max_limit(&self) -> usize {
        self.max_limit
    }

    /// Absolute URL of the token endpoint, for wiring grant fetchers.
    pub fn token_url(&self) -> String {
        format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            self.token_endpoint
        )
    }

    /// Build a request URL: `base/resource[/id][?query]`.
    ///
    /// An empty id is treated as absent, matching how the verbs address a
    /// whole collection.
    pub(crate) fn url_for(
        &self,
        resource: &str,
        id: Option<&str>,
        params: &[(String, String)],
    ) -> Result<Url> {
        let mut raw = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            resource.trim_matches('/')
        );
        if let Some(id) = id.filter(|id| !id.is_empty()) {
            raw.push('/');
            raw.push_str(id);
        }
        let mut url = Url::parse(&raw)
            .map_err(|e| Error::Config(format!("invalid request URL {raw:?}: {e}")))?;
        if !params.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(params.iter().map(|(k, v)| (k.as_str(), v.as_str())));
        }
        Ok(url)
    }
}
