//! HTTP implementation of [`Upstream`] for Invidious-compatible APIs.
//!
//! The client only speaks HTTP: it builds URLs, attaches the locale
//! parameters, checks the status, and decodes JSON.  Everything else
//! (admission control, per-call timeouts, parsing) is done by the engine.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use super::{SearchKind, Upstream};
use crate::config::UpstreamConfig;
use crate::error::FetchError;

/// Connect timeout; the per-call budget is enforced by the engine.
const CONNECT_TIMEOUT_SECS: u64 = 5;

/// User agent string sent with every request.
const USER_AGENT: &str = concat!("livescroll-tube/", env!("CARGO_PKG_VERSION"));

/// An Invidious (or API-compatible) instance.
pub struct InvidiousClient {
    client: Client,
    base_url: String,
    hl: String,
    region: String,
}

impl InvidiousClient {
    /// Create a client for the instance at `base_url`.
    ///
    /// # Arguments
    ///
    /// * `base_url`: scheme and host of the instance (e.g.
    ///   `http://127.0.0.1:3000`); a trailing `/` is ignored.
    /// * `hl`, `region`: locale parameters attached to every request so
    ///   metadata comes back in a consistent language.
    pub fn new(base_url: &str, hl: &str, region: &str) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hl: hl.to_string(),
            region: region.to_string(),
        })
    }

    pub fn from_config(config: &UpstreamConfig) -> Result<Self> {
        Self::new(&config.base_url, &config.hl, &config.region)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, FetchError> {
        let url = format!("{}/api/v1/{}", self.base_url, path);

        let resp = self
            .client
            .get(&url)
            .query(&[("hl", self.hl.as_str()), ("region", self.region.as_str())])
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            tracing::debug!(%url, %status, "upstream returned non-success status");
            return Err(FetchError::Status(status.as_u16()));
        }

        Ok(resp.json::<Value>().await?)
    }
}

/// Percent-encode a single path segment (channel and video ids).
fn segment(id: &str) -> String {
    urlencoding::encode(id).into_owned()
}

#[async_trait]
impl Upstream for InvidiousClient {
    async fn search(&self, query: &str, kind: SearchKind) -> Result<Value, FetchError> {
        self.get_json("search", &[("q", query), ("type", kind.as_str())])
            .await
    }

    async fn channel_videos(&self, channel_id: &str) -> Result<Value, FetchError> {
        self.get_json(&format!("channels/{}/videos", segment(channel_id)), &[])
            .await
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Value, FetchError> {
        self.get_json(&format!("channels/{}", segment(channel_id)), &[])
            .await
    }

    async fn trending(&self, category: &str) -> Result<Value, FetchError> {
        self.get_json("trending", &[("type", category)]).await
    }

    async fn video_details(&self, video_id: &str) -> Result<Value, FetchError> {
        self.get_json(&format!("videos/{}", segment(video_id)), &[])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = InvidiousClient::new("http://127.0.0.1:3000/", "fr", "FR").unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:3000");
    }

    #[test]
    fn path_segments_are_escaped() {
        assert_eq!(segment("UCabc_-1"), "UCabc_-1");
        assert_eq!(segment("a/b c"), "a%2Fb%20c");
    }
}
