//! Multi-channel feed aggregation.
//!
//! One pass resolves and fetches every subscription concurrently (all calls
//! share one [`RequestGate`]), then merges the per-channel lists into a
//! single feed:
//!
//! ```text
//! sources ─► resolve (alias only) ─► fetch ─┐
//! sources ─► resolve (alias only) ─► fetch ─┼─► window ─► dedup ─► sort ─► cap
//! sources ─► resolve (alias only) ─► fetch ─┘
//! ```
//!
//! A pass never fails.  A channel that cannot be resolved or fetched simply
//! contributes nothing; [`FeedPass::sources`] records why, for the status bar
//! and the log.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::config::{FeedConfig, UpstreamConfig};
use crate::error::FetchError;
use crate::fetcher::{FetchOutcome, SourceFetcher};
use crate::gate::RequestGate;
use crate::resolver::SourceResolver;
use crate::source::{Item, Source, Upstream};
use crate::store::SubscriptionStore;

/// Window and cap applied to the merged feed.
#[derive(Debug, Clone, Copy)]
pub struct FeedSettings {
    pub window: chrono::Duration,
    pub cap: usize,
}

impl Default for FeedSettings {
    fn default() -> Self {
        Self::from(&FeedConfig::default())
    }
}

impl From<&FeedConfig> for FeedSettings {
    fn from(config: &FeedConfig) -> Self {
        Self {
            window: config.window(),
            cap: config.max_items,
        }
    }
}

/// What happened to one source during a pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceStatus {
    /// Listing fetched; `count` items before windowing and dedup.
    Fetched { count: usize },
    /// The alias did not resolve to a channel id.
    Unresolved,
    Failed(FetchError),
}

#[derive(Debug, Clone, PartialEq)]
pub struct SourceReport {
    pub display_name: String,
    pub source_ref: String,
    pub resolved_id: Option<String>,
    pub status: SourceStatus,
}

/// Result of one aggregation pass.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedPass {
    /// Ranked, deduplicated, windowed and capped.
    pub items: Vec<Item>,
    /// One entry per input source, in input order.
    pub sources: Vec<SourceReport>,
}

impl FeedPass {
    pub fn healthy_sources(&self) -> usize {
        self.sources
            .iter()
            .filter(|s| matches!(s.status, SourceStatus::Fetched { .. }))
            .count()
    }

    pub fn failed_sources(&self) -> usize {
        self.sources.len() - self.healthy_sources()
    }
}

/// Fans out over all subscriptions and merges the results.
pub struct FeedAggregator {
    resolver: SourceResolver,
    fetcher: SourceFetcher,
    store: Arc<dyn SubscriptionStore>,
}

impl FeedAggregator {
    pub fn new(
        upstream: Arc<dyn Upstream>,
        gate: Arc<RequestGate>,
        store: Arc<dyn SubscriptionStore>,
        config: &UpstreamConfig,
    ) -> Self {
        Self {
            resolver: SourceResolver::new(
                Arc::clone(&upstream),
                Arc::clone(&gate),
                config.request_timeout(),
            ),
            fetcher: SourceFetcher::new(upstream, gate, config.listing_timeout()),
            store,
        }
    }

    /// The merged feed for `sources`.  Never fails; see [`merge_feed`].
    pub async fn aggregate(&self, sources: &[Source], window: chrono::Duration, cap: usize) -> Vec<Item> {
        self.aggregate_with_report(sources, window, cap).await.items
    }

    /// Like [`aggregate`](Self::aggregate), plus a status per source.
    pub async fn aggregate_with_report(
        &self,
        sources: &[Source],
        window: chrono::Duration,
        cap: usize,
    ) -> FeedPass {
        // All sources are driven from this one task; they interleave at
        // network awaits and the gate bounds how many are on the wire.
        let collected =
            futures::future::join_all(sources.iter().map(|s| self.collect_source(s))).await;

        let (reports, batches): (Vec<_>, Vec<_>) = collected.into_iter().unzip();
        let items = merge_feed(batches, Utc::now(), window, cap);

        let pass = FeedPass { items, sources: reports };
        tracing::info!(
            sources = pass.sources.len(),
            failed = pass.failed_sources(),
            items = pass.items.len(),
            "aggregation pass complete"
        );
        pass
    }

    /// Aggregate the store's current subscriptions.
    pub async fn refresh(&self, settings: &FeedSettings) -> FeedPass {
        let sources = self.store.subscriptions();
        self.aggregate_with_report(&sources, settings.window, settings.cap)
            .await
    }

    /// Store writes may hit the disk, so they run off the async workers.
    async fn remember_resolved(&self, alias: &str, id: &str) {
        let store = Arc::clone(&self.store);
        let (owned_alias, owned_id) = (alias.to_string(), id.to_string());
        let write = tokio::task::spawn_blocking(move || store.set_resolved_id(&owned_alias, &owned_id));
        match write.await {
            Ok(true) => tracing::debug!(source = alias, id, "stored resolved id"),
            Ok(false) => {}
            Err(e) => tracing::warn!(source = alias, error = %e, "storing resolved id failed"),
        }
    }

    async fn collect_source(&self, source: &Source) -> (SourceReport, Vec<Item>) {
        let mut report = SourceReport {
            display_name: source.display_name.clone(),
            source_ref: source.source_ref.clone(),
            resolved_id: source.resolved_id.clone(),
            status: SourceStatus::Unresolved,
        };

        let channel_id = match &source.resolved_id {
            Some(id) => id.clone(),
            None => match self.resolver.resolve(&source.source_ref).await {
                Some(id) => {
                    if id != source.source_ref {
                        self.remember_resolved(&source.source_ref, &id).await;
                    }
                    report.resolved_id = Some(id.clone());
                    id
                }
                None => return (report, Vec::new()),
            },
        };

        match self.fetcher.fetch_outcome(&channel_id).await {
            FetchOutcome::Fetched(items) => {
                report.status = SourceStatus::Fetched { count: items.len() };
                (report, items)
            }
            FetchOutcome::Failed(e) => {
                report.status = SourceStatus::Failed(e);
                (report, Vec::new())
            }
        }
    }
}

/// Merge per-source item lists into one feed.
///
/// 1. Drop items that are undated or not younger than `window` at `now`.
/// 2. Keep the first occurrence of each item id.
/// 3. Stable sort, newest first.
/// 4. Keep at most `cap` items.
///
/// Batches are consumed in order, so "first occurrence" is decided by the
/// position of the source in the input.  The sort makes the final order
/// independent of that except among equal timestamps.
pub fn merge_feed(
    batches: Vec<Vec<Item>>,
    now: DateTime<Utc>,
    window: chrono::Duration,
    cap: usize,
) -> Vec<Item> {
    let mut seen = HashSet::new();
    let mut items: Vec<Item> = batches
        .into_iter()
        .flatten()
        .filter(|item| item.is_within(now, window))
        .filter(|item| seen.insert(item.id.clone()))
        .collect();

    items.sort_by(Item::newest_first);
    items.truncate(cap);
    items
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
