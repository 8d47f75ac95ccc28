//! Per-channel item listing.
//!
//! The fetcher never fails outward.  Each attempt is admitted through the
//! shared [`RequestGate`] and bounded by the listing timeout; transient
//! failures get one retry.  Whatever still fails is logged and reported as an
//! empty list.

use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::gate::RequestGate;
use crate::source::payload::{listing_entries, parse_items};
use crate::source::{Item, Upstream};

/// Extra attempts after the first for a transient failure.
const RETRY_BUDGET: u32 = 1;

/// Result of fetching one channel, kept for logging and status reports.
///
/// Consumers that only want items use [`FetchOutcome::into_items`], which
/// folds a failure into an empty list.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    Fetched(Vec<Item>),
    Failed(FetchError),
}

impl FetchOutcome {
    pub fn into_items(self) -> Vec<Item> {
        match self {
            FetchOutcome::Fetched(items) => items,
            FetchOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// Fetches the item listing of a resolved channel.
#[derive(Clone)]
pub struct SourceFetcher {
    upstream: Arc<dyn Upstream>,
    gate: Arc<RequestGate>,
    timeout: Duration,
}

impl SourceFetcher {
    pub fn new(upstream: Arc<dyn Upstream>, gate: Arc<RequestGate>, timeout: Duration) -> Self {
        Self { upstream, gate, timeout }
    }

    /// Items of `channel_id`, or an empty list if the channel could not be
    /// fetched.
    pub async fn fetch_items(&self, channel_id: &str) -> Vec<Item> {
        self.fetch_outcome(channel_id).await.into_items()
    }

    /// Like [`fetch_items`](Self::fetch_items) but keeps the failure reason.
    pub async fn fetch_outcome(&self, channel_id: &str) -> FetchOutcome {
        let mut attempt = 0;
        loop {
            match self.attempt(channel_id).await {
                Ok(items) => {
                    tracing::debug!(source = channel_id, count = items.len(), "fetched channel");
                    return FetchOutcome::Fetched(items);
                }
                Err(e) if e.is_transient() && attempt < RETRY_BUDGET => {
                    attempt += 1;
                    tracing::debug!(source = channel_id, error = %e, attempt, "retrying channel fetch");
                }
                Err(e) => {
                    tracing::warn!(source = channel_id, error = %e, "channel fetch failed");
                    return FetchOutcome::Failed(e);
                }
            }
        }
    }

    async fn attempt(&self, channel_id: &str) -> Result<Vec<Item>, FetchError> {
        let body = self
            .gate
            .admit_with_timeout(self.timeout, self.upstream.channel_videos(channel_id))
            .await?;
        Ok(parse_items(listing_entries(body)?, channel_id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
