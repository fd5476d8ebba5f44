//! Multi-page listing aggregation
//!
//! One probing request at offset 0 learns the total; the remaining pages are
//! issued concurrently (they no longer depend on each other once the total
//! is known) and joined in offset order, so the aggregate never depends on
//! network completion order. Any page failure fails the whole aggregation —
//! no partial results.

use futures::future;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, Result};

/// Paging envelope carried by every list response.
#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

/// One decoded page of a listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ListPage {
    pub pagination: Pagination,
    pub result: Vec<Value>,
}

impl ListPage {
    fn from_body(body: Value) -> Result<Self> {
        serde_json::from_value(body)
            .map_err(|e| Error::Decode(format!("not a paginated list response: {e}")))
    }
}

impl Client {
    /// Fetch every page of a listing and flatten the results in offset order.
    ///
    /// Caller-supplied `offset`/`limit` parameters are overridden by the
    /// aggregator's own paging: the probe always starts at offset 0 with the
    /// configured page size.
    pub async fn index_all(
        &self,
        resource: &str,
        params: &[(String, String)],
    ) -> Result<Vec<Value>> {
        let limit = self.config().max_limit();
        let first = self.index_page(resource, params, 0, limit).await?;
        let total = first.pagination.total;

        let remaining: Vec<_> = (limit..total)
            .step_by(limit)
            .map(|offset| self.index_page(resource, params, offset, limit))
            .collect();
        debug!(resource, total, pages = remaining.len() + 1, "aggregating listing");

        let rest = future::try_join_all(remaining).await?;

        let mut records = first.result;
        for page in rest {
            records.extend(page.result);
        }
        Ok(records)
    }

    async fn index_page(
        &self,
        resource: &str,
        params: &[(String, String)],
        offset: usize,
        limit: usize,
    ) -> Result<ListPage> {
        // Aggregator paging wins over any caller-supplied offset/limit.
        let mut merged: Vec<(String, String)> = params
            .iter()
            .filter(|(key, _)| key.as_str() != "offset" && key.as_str() != "limit")
            .cloned()
            .collect();
        merged.push(("offset".into(), offset.to_string()));
        merged.push(("limit".into(), limit.to_string()));

        let response = self.index(resource, &merged).await?;
        ListPage::from_body(response.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::transport::Request;
    use crate::transport::mock::{MockTransport, Reply};
    use futures::FutureExt;
    use pagetide_auth::{TokenFetcher, TokenManager, TokenSet};
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn test_client(transport: Arc<MockTransport>, max_limit: usize) -> Client {
        let fetcher: TokenFetcher = Arc::new(|_refresh| {
            async {
                Ok(TokenSet {
                    access_token: "at-1".into(),
                    refresh_token: None,
                })
            }
            .boxed()
        });
        let config = ClientConfig::new("https://api.example.com")
            .unwrap()
            .with_max_limit(max_limit)
            .unwrap();
        Client::new(config, Arc::new(TokenManager::new(fetcher)), transport)
    }

    fn query(request: &Request, key: &str) -> Option<String> {
        request
            .url
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
    }

    fn page(total: usize, offset: usize, limit: usize, count: usize) -> Value {
        let result: Vec<Value> = (0..count)
            .map(|i| json!(format!("r{offset}-{i}")))
            .collect();
        json!({
            "pagination": {"total": total, "offset": offset, "limit": limit},
            "result": result,
        })
    }

    #[tokio::test(start_paused = true)]
    async fn pages_are_flattened_in_offset_order() {
        // 1200 records at limit 500: offsets 0, 500, 1000. The middle page
        // is the slowest, so completion order differs from offset order.
        let transport = Arc::new(MockTransport::new(|_, request| {
            match query(request, "offset").unwrap().as_str() {
                "0" => Reply::status(200, page(1200, 0, 500, 2)),
                "500" => Reply::status(200, page(1200, 500, 500, 2))
                    .after(Duration::from_millis(50)),
                "1000" => Reply::status(200, page(1200, 1000, 500, 2))
                    .after(Duration::from_millis(10)),
                other => panic!("unexpected offset {other}"),
            }
        }));
        let client = test_client(Arc::clone(&transport), 500);

        let records = client.index_all("widgets", &[]).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 3);
        let offsets: Vec<Option<String>> = calls.iter().map(|c| query(c, "offset")).collect();
        assert_eq!(
            offsets,
            vec![Some("0".into()), Some("500".into()), Some("1000".into())]
        );
        assert_eq!(
            records,
            vec![
                json!("r0-0"),
                json!("r0-1"),
                json!("r500-0"),
                json!("r500-1"),
                json!("r1000-0"),
                json!("r1000-1"),
            ]
        );
    }

    #[tokio::test]
    async fn empty_listing_is_a_single_probe() {
        let transport = Arc::new(MockTransport::new(|_, _| {
            Reply::status(200, page(0, 0, 500, 0))
        }));
        let client = test_client(Arc::clone(&transport), 500);

        let records = client.index_all("widgets", &[]).await.unwrap();

        assert!(records.is_empty());
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn single_page_when_total_fits_the_limit() {
        let transport = Arc::new(MockTransport::new(|_, _| {
            Reply::status(200, page(3, 0, 500, 3))
        }));
        let client = test_client(Arc::clone(&transport), 500);

        let records = client.index_all("widgets", &[]).await.unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn caller_paging_parameters_are_overridden() {
        let transport = Arc::new(MockTransport::new(|_, _| {
            Reply::status(200, page(1, 0, 2, 1))
        }));
        let client = test_client(Arc::clone(&transport), 2);

        client
            .index_all(
                "widgets",
                &[
                    ("offset".into(), "9999".into()),
                    ("limit".into(), "7".into()),
                    ("state".into(), "active".into()),
                ],
            )
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(query(&calls[0], "offset").as_deref(), Some("0"));
        assert_eq!(query(&calls[0], "limit").as_deref(), Some("2"));
        assert_eq!(query(&calls[0], "state").as_deref(), Some("active"));
        // The caller's paging values must not survive as duplicates.
        let offsets = calls[0]
            .url
            .query_pairs()
            .filter(|(k, _)| k == "offset")
            .count();
        assert_eq!(offsets, 1);
    }

    #[tokio::test]
    async fn filter_parameters_reach_every_page() {
        let transport = Arc::new(MockTransport::new(|_, request| {
            let offset: usize = query(request, "offset").unwrap().parse().unwrap();
            Reply::status(200, page(4, offset, 2, 2))
        }));
        let client = test_client(Arc::clone(&transport), 2);

        client
            .index_all("widgets", &[("state".into(), "active".into())])
            .await
            .unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 2);
        for call in &calls {
            assert_eq!(query(call, "state").as_deref(), Some("active"));
        }
    }

    #[tokio::test]
    async fn one_failed_page_fails_the_whole_aggregation() {
        let transport = Arc::new(MockTransport::new(|_, request| {
            match query(request, "offset").unwrap().as_str() {
                "0" => Reply::status(200, page(4, 0, 2, 2)),
                _ => Reply::status(500, json!({"error": "boom"})),
            }
        }));
        let client = test_client(Arc::clone(&transport), 2);

        let err = client.index_all("widgets", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Http { status: 500, .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn malformed_list_body_is_a_decode_error() {
        let transport = Arc::new(MockTransport::new(|_, _| {
            Reply::status(200, json!({"result": {"not": "a list"}}))
        }));
        let client = test_client(Arc::clone(&transport), 500);

        let err = client.index_all("widgets", &[]).await.unwrap_err();
        assert!(matches!(err, Error::Decode(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn custom_page_size_drives_the_offsets() {
        let transport = Arc::new(MockTransport::new(|_, request| {
            let offset: usize = query(request, "offset").unwrap().parse().unwrap();
            let count = if offset < 4 { 2 } else { 1 };
            Reply::status(200, page(5, offset, 2, count))
        }));
        let client = test_client(Arc::clone(&transport), 2);

        let records = client.index_all("widgets", &[]).await.unwrap();

        assert_eq!(records.len(), 5);
        let calls = transport.calls();
        let offsets: Vec<String> = calls.iter().filter_map(|c| query(c, "offset")).collect();
        assert_eq!(offsets, vec!["0", "2", "4"]);
    }
}
