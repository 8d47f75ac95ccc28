//! Alias → stable channel id resolution.
//!
//! Subscriptions imported from bookmarks or typed by hand often carry a
//! handle (`@name`) or a plain channel name instead of a `UC…` id.  Channel
//! listings need the id, so aliases are looked up via channel search first.
//! Persisting the result is the caller's job (see
//! [`SubscriptionStore::set_resolved_id`](crate::store::SubscriptionStore::set_resolved_id)).

use std::sync::Arc;
use std::time::Duration;

use crate::error::FetchError;
use crate::gate::RequestGate;
use crate::source::payload::parse_channel_hits;
use crate::source::{SearchKind, Upstream};

/// Whether `source_ref` already has the shape of a stable channel id.
pub fn is_stable_id(source_ref: &str) -> bool {
    source_ref.len() > 2
        && source_ref.starts_with("UC")
        && source_ref
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Maps source references to stable channel ids.
#[derive(Clone)]
pub struct SourceResolver {
    upstream: Arc<dyn Upstream>,
    gate: Arc<RequestGate>,
    timeout: Duration,
}

impl SourceResolver {
    pub fn new(upstream: Arc<dyn Upstream>, gate: Arc<RequestGate>, timeout: Duration) -> Self {
        Self { upstream, gate, timeout }
    }

    /// Resolve `source_ref` to a stable channel id.
    ///
    /// Stable ids come back unchanged without a network call.  Aliases are
    /// percent-decoded and searched; if a `@handle` finds nothing, the bare
    /// name is tried once.  Returns `None` when nothing matches or every
    /// lookup failed.
    pub async fn resolve(&self, source_ref: &str) -> Option<String> {
        if is_stable_id(source_ref) {
            return Some(source_ref.to_string());
        }

        let decoded = urlencoding::decode(source_ref)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| source_ref.to_string());
        let alias = decoded.trim();
        if alias.is_empty() {
            return None;
        }
        if is_stable_id(alias) {
            return Some(alias.to_string());
        }

        let mut candidates = vec![alias];
        if let Some(bare) = alias.strip_prefix('@').filter(|b| !b.is_empty()) {
            candidates.push(bare);
        }

        for query in candidates {
            match self.lookup(query).await {
                Ok(Some(id)) => {
                    tracing::info!(source = source_ref, %id, "resolved alias");
                    return Some(id);
                }
                Ok(None) => tracing::debug!(source = source_ref, query, "no channel matched"),
                Err(e) => tracing::debug!(source = source_ref, query, error = %e, "alias lookup failed"),
            }
        }

        let err = FetchError::UnresolvableSource(source_ref.to_string());
        tracing::warn!(source = source_ref, error = %err, "giving up on alias");
        None
    }

    async fn lookup(&self, query: &str) -> Result<Option<String>, FetchError> {
        let body = self
            .gate
            .admit_with_timeout(self.timeout, self.upstream.search(query, SearchKind::Channel))
            .await?;
        Ok(parse_channel_hits(body)?.into_iter().next().map(|c| c.id))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
