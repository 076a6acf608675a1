//! API client for the recommendation feed.
//!
//! [`RemoteSource`] is the seam the pipeline fetches through; [`AppClient`]
//! implements it against the app feed endpoint with reqwest.

use crate::error::{AttemptError, Result};
use crate::types::FeedResponse;
use async_trait::async_trait;
use log::debug;
use rand::Rng;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub const HOST_APP: &str = "https://app.bilibili.com";
const FEED_PATH: &str = "/x/v2/feed/index";
const USER_AGENT: &str = "Mozilla/5.0 BiliDroid/7.0.0 (bbcallen@gmail.com)";

/// One page worth of recommendations from the remote endpoint.
///
/// Implementations report transport trouble as [`AttemptError`] and hand
/// back the decoded envelope otherwise; classifying the envelope is the
/// caller's job.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch_page(&self, page: u32) -> std::result::Result<FeedResponse, AttemptError>;
}

/// reqwest-backed client for the app feed.
#[derive(Debug, Clone)]
pub struct AppClient {
    client: reqwest::Client,
    host: String,
    access_key: Option<String>,
}

impl AppClient {
    pub fn new(access_key: Option<String>) -> Result<Self> {
        Self::with_host(HOST_APP, access_key)
    }

    /// Build a client against a different host, e.g. a local mirror.
    pub fn with_host(host: &str, access_key: Option<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            host: host.trim_end_matches('/').to_string(),
            access_key,
        })
    }

    fn query(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![
            ("build", "1".to_string()),
            ("mobi_app", "android".to_string()),
            ("idx", feed_idx()),
        ];
        if let Some(key) = &self.access_key {
            params.push(("access_key", key.clone()));
        }
        params
    }
}

/// Feed cursor the endpoint expects: unix seconds, a zero, then three
/// random digits.
fn feed_idx() -> String {
    let secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs();
    let salt: u32 = rand::rng().random_range(0..1000);
    format!("{}0{:03}", secs, salt)
}

#[async_trait]
impl RemoteSource for AppClient {
    async fn fetch_page(&self, page: u32) -> std::result::Result<FeedResponse, AttemptError> {
        // the app feed is cursorless; page only tags the request in logs
        debug!("Requesting feed page {}", page);

        let resp = self
            .client
            .get(format!("{}{}", self.host, FEED_PATH))
            .query(&self.query())
            .send()
            .await?
            .error_for_status()?;

        let body = resp.text().await?;
        serde_json::from_str::<FeedResponse>(&body)
            .map_err(|e| AttemptError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feed_idx_shape() {
        let idx = feed_idx();
        assert!(idx.chars().all(|c| c.is_ascii_digit()));
        // seconds (10 digits today) + '0' + 3 salt digits
        assert!(idx.len() >= 14);
        assert_eq!(&idx[idx.len() - 4..idx.len() - 3], "0");
    }

    #[test]
    fn test_query_includes_access_key_when_set() {
        let client = AppClient::with_host("http://localhost/", Some("k".to_string())).unwrap();
        let query = client.query();
        assert!(query.contains(&("access_key", "k".to_string())));
        assert!(query.contains(&("mobi_app", "android".to_string())));
        assert_eq!(client.host, "http://localhost");
    }

    #[test]
    fn test_client_setup_errors_are_network_errors() {
        let err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let err: crate::error::FeedError = err.into();
        assert!(matches!(err, crate::error::FeedError::Network(_)));
        assert!(err.to_string().starts_with("Network error"));
    }

    #[test]
    fn test_query_without_access_key() {
        let client = AppClient::new(None).unwrap();
        assert!(!client.query().iter().any(|(k, _)| *k == "access_key"));
    }
}
