//! HTTP snapshot source.
//!
//! # Invariants
//! - Every request carries a fresh `t=<epoch ms>` query parameter and
//!   `Cache-Control: no-cache`, so intermediary caches are bypassed.
//! - Only 2xx responses are parsed.

use crate::remote::{RemoteDocument, RemoteError, RemoteResult, SnapshotSource};
use chrono::Utc;
use log::{info, warn};
use reqwest::header::CACHE_CONTROL;
use reqwest::{Client, Url};
use std::time::Instant;

const CACHE_BUST_PARAM: &str = "t";

/// Fetches the snapshot document from a fixed URL.
#[derive(Debug, Clone)]
pub struct HttpSnapshotSource {
    client: Client,
    url: Url,
}

impl HttpSnapshotSource {
    /// # Errors
    /// - `RemoteError::InvalidUrl` when `url` does not parse.
    pub fn new(url: &str) -> RemoteResult<Self> {
        Self::with_client(Client::new(), url)
    }

    pub fn with_client(client: Client, url: &str) -> RemoteResult<Self> {
        let url = Url::parse(url.trim())
            .map_err(|err| RemoteError::InvalidUrl(format!("{url}: {err}")))?;
        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    fn cache_busted_url(&self) -> Url {
        let mut url = self.url.clone();
        url.query_pairs_mut().append_pair(
            CACHE_BUST_PARAM,
            &Utc::now().timestamp_millis().to_string(),
        );
        url
    }

    async fn fetch_inner(&self) -> RemoteResult<RemoteDocument> {
        let response = self
            .client
            .get(self.cache_busted_url())
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await
            .map_err(|err| RemoteError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|err| RemoteError::Network(err.to_string()))?;
        RemoteDocument::from_json(&body)
    }
}

impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> RemoteResult<RemoteDocument> {
        let started_at = Instant::now();
        let result = self.fetch_inner().await;
        match &result {
            Ok(_) => info!(
                "event=remote_fetch module=remote status=ok duration_ms={}",
                started_at.elapsed().as_millis()
            ),
            Err(err) => warn!(
                "event=remote_fetch module=remote status=error duration_ms={} error={err}",
                started_at.elapsed().as_millis()
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::HttpSnapshotSource;
    use crate::remote::RemoteError;

    #[test]
    fn rejects_unparseable_url() {
        let err = HttpSnapshotSource::new("not a url").unwrap_err();
        assert!(matches!(err, RemoteError::InvalidUrl(_)));
    }

    #[test]
    fn cache_busting_keeps_existing_query() {
        let source = HttpSnapshotSource::new("http://localhost:9/tracker.json?v=2").unwrap();
        let url = source.cache_busted_url();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert_eq!(pairs[0], ("v".to_string(), "2".to_string()));
        assert_eq!(pairs[1].0, "t");
        assert!(!pairs[1].1.is_empty());
    }
}
