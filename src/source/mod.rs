//! Upstream data source abstraction layer.
//!
//! This module defines the [`Upstream`] trait and the common data types
//! ([`Item`], [`Source`], [`Channel`]).  The HTTP implementation lives in
//! [`invidious`]; defensive JSON parsing lives in [`payload`].
//!
//! ## For contributors: adding a new upstream
//!
//! 1. Create a new file in this directory (e.g. `piped.rs`).
//! 2. Define a client struct and implement [`Upstream`] for it.  Each method
//!    returns the raw JSON body; do not parse or filter here.
//! 3. Re-export your struct in the `pub use` block below.
//! 4. Construct it in `main.rs` instead of `InvidiousClient`.
//!
//! Gating, timeouts, retries, parsing and URL rewriting are handled by the
//! engine, so a new upstream only has to speak HTTP.

mod invidious;
mod item;
pub mod payload;
mod stream;
#[cfg(test)]
pub(crate) mod testing;

pub use invidious::InvidiousClient;
pub use item::{Channel, Item, Source, Thumbnail};
pub use stream::{StreamFormat, VideoDetails};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::FetchError;

/// What a search should return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Video,
    Channel,
}

impl SearchKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SearchKind::Video => "video",
            SearchKind::Channel => "channel",
        }
    }
}

/// Read access to a YouTube-compatible API.
///
/// Implementations perform one HTTP request per call and return the decoded
/// JSON body.  Non-success statuses map to [`FetchError::Status`].  Callers
/// wrap every call in the shared [`RequestGate`](crate::gate::RequestGate),
/// so implementations must not add their own concurrency limits.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// `GET /api/v1/search?q=…&type=…`
    async fn search(&self, query: &str, kind: SearchKind) -> Result<Value, FetchError>;

    /// `GET /api/v1/channels/{id}/videos`; either an array or `{ videos: [...] }`.
    async fn channel_videos(&self, channel_id: &str) -> Result<Value, FetchError>;

    /// `GET /api/v1/channels/{id}`
    async fn channel_info(&self, channel_id: &str) -> Result<Value, FetchError>;

    /// `GET /api/v1/trending?type=…`
    async fn trending(&self, category: &str) -> Result<Value, FetchError>;

    /// `GET /api/v1/videos/{id}`
    async fn video_details(&self, video_id: &str) -> Result<Value, FetchError>;
}
