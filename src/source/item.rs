//! The core data types shared across the engine.
//!
//! `Item` is a single video from any channel listing, search, or trending
//! response.  `Source` is a subscription record.  `Channel` is what channel
//! search and channel-info calls return.
//!
//! ## For contributors
//!
//! Upstream JSON never reaches these types directly; it goes through
//! [`super::payload`] first, which drops malformed entries and rewrites media
//! URLs.  Anything constructed here is therefore safe to render.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// One image rendition of a thumbnail or avatar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thumbnail {
    /// Host-relative when the upstream URL was a known media path.
    pub url: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
}

/// A single video, normalised from any upstream listing.
///
/// ## Sorting
///
/// Use [`Item::newest_first`] with a stable sort to rank a feed: newer items
/// come first and items with equal timestamps keep their relative order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Upstream video id; unique across all channels.
    pub id: String,

    /// Human-readable title.
    pub title: String,

    /// Channel display name.
    pub author: String,

    /// Stable id of the channel this item belongs to.
    pub source_id: String,

    /// Publication instant.
    ///
    /// `None` when the upstream gave no date or one we could not parse; such
    /// items never make it into the aggregated feed.
    pub published: Option<DateTime<Utc>>,

    pub view_count: u64,

    pub duration_seconds: u64,

    pub thumbnails: Vec<Thumbnail>,
}

impl Item {
    /// Comparator for reverse-chronological order.
    pub fn newest_first(a: &Item, b: &Item) -> Ordering {
        // `b` first so that `Some(newer) > Some(older)` gives newest-first.
        // `None` is less than `Some(_)`, so undated items sink to the bottom.
        b.published.cmp(&a.published)
    }

    /// Whether the item was published less than `window` before `now`.
    /// Undated items are never recent.
    pub fn is_within(&self, now: DateTime<Utc>, window: chrono::Duration) -> bool {
        self.published.is_some_and(|p| now - p < window)
    }
}

/// A subscribed channel.
///
/// `source_ref` is whatever the user or an import supplied: a stable channel
/// id (`UC…`) or an alias such as `@handle`.  `resolved_id` is filled in the
/// first time the alias resolves and never overwritten after that.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub display_name: String,
    pub source_ref: String,
    #[serde(default)]
    pub resolved_id: Option<String>,
    #[serde(default)]
    pub thumbnails: Vec<Thumbnail>,
}

impl Source {
    pub fn new(display_name: impl Into<String>, source_ref: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            source_ref: source_ref.into(),
            resolved_id: None,
            thumbnails: Vec::new(),
        }
    }

    /// Subscription record for a channel returned by search or channel info.
    pub fn from_channel(channel: &Channel) -> Self {
        Self {
            display_name: channel.name.clone(),
            source_ref: channel.id.clone(),
            resolved_id: None,
            thumbnails: channel.thumbnails.clone(),
        }
    }
}

/// A channel as returned by channel search or the channel-info endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub thumbnails: Vec<Thumbnail>,
    pub sub_count: Option<u64>,
}
