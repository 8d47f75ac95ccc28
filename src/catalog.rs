//! Browse calls outside the subscription feed: search, trending, channel
//! info and playback lookup.
//!
//! These go through the same [`RequestGate`] as the feed so that browsing
//! while a pass is running cannot push the upstream over the limit.  Like the
//! fetcher, every call degrades to an empty result instead of failing.

use std::sync::Arc;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::FetchError;
use crate::gate::RequestGate;
use crate::source::payload::{array_entries, parse_channel, parse_channel_hits, parse_items};
use crate::source::{Channel, Item, SearchKind, Upstream, VideoDetails};

/// Query used when the trending endpoint is unavailable.
const TRENDING_FALLBACK_QUERY: &str = "trending";

pub struct Catalog {
    upstream: Arc<dyn Upstream>,
    gate: Arc<RequestGate>,
    request_timeout: Duration,
    trending_timeout: Duration,
}

impl Catalog {
    pub fn new(upstream: Arc<dyn Upstream>, gate: Arc<RequestGate>, config: &UpstreamConfig) -> Self {
        Self {
            upstream,
            gate,
            request_timeout: config.request_timeout(),
            trending_timeout: config.trending_timeout(),
        }
    }

    /// Videos matching `query`; empty on any failure.
    pub async fn search_videos(&self, query: &str) -> Vec<Item> {
        let result = self
            .gate
            .admit_with_timeout(self.request_timeout, self.upstream.search(query, SearchKind::Video))
            .await
            .and_then(array_entries);

        match result {
            Ok(entries) => parse_items(entries, ""),
            Err(e) => {
                tracing::warn!(query, error = %e, "video search failed");
                Vec::new()
            }
        }
    }

    /// Channels matching `query`; empty on any failure.
    pub async fn search_channels(&self, query: &str) -> Vec<Channel> {
        let result = self
            .gate
            .admit_with_timeout(self.request_timeout, self.upstream.search(query, SearchKind::Channel))
            .await
            .and_then(parse_channel_hits);

        result.unwrap_or_else(|e| {
            tracing::warn!(query, error = %e, "channel search failed");
            Vec::new()
        })
    }

    /// Trending videos in `category`.
    ///
    /// The trending endpoint is slow and often disabled on public instances,
    /// so any failure falls back to a plain search for "trending".
    pub async fn trending(&self, category: &str) -> Vec<Item> {
        let result = self
            .gate
            .admit_with_timeout(self.trending_timeout, self.upstream.trending(category))
            .await
            .and_then(array_entries);

        match result {
            Ok(entries) => parse_items(entries, ""),
            Err(e) => {
                tracing::warn!(category, error = %e, "trending unavailable, falling back to search");
                self.search_videos(TRENDING_FALLBACK_QUERY).await
            }
        }
    }

    pub async fn channel_info(&self, channel_id: &str) -> Option<Channel> {
        let result = self
            .gate
            .admit_with_timeout(self.request_timeout, self.upstream.channel_info(channel_id))
            .await
            .and_then(parse_channel);

        result
            .map_err(|e| tracing::warn!(source = channel_id, error = %e, "channel info failed"))
            .ok()
    }

    pub async fn video_details(&self, video_id: &str) -> Option<VideoDetails> {
        let result: Result<VideoDetails, FetchError> = self
            .gate
            .admit_with_timeout(self.request_timeout, self.upstream.video_details(video_id))
            .await
            .and_then(VideoDetails::from_json);

        result
            .map_err(|e| tracing::warn!(video = video_id, error = %e, "video details failed"))
            .ok()
    }

    /// Best proxied playback URL for `video_id`.
    pub async fn stream_url(&self, video_id: &str) -> Option<String> {
        self.video_details(video_id).await?.best_stream_url()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
