//! livescroll-tube: subscription feed engine for YouTube-compatible APIs.
//!
//! ## Architecture overview
//!
//! ```text
//!                     ┌─────────────┐
//!  store ──sources──► │  aggregate  │ ──FeedPass──► viewer (bin)
//!                     └─────────────┘
//!                       │         │
//!                 ┌──────────┐ ┌─────────┐
//!                 │ resolver │ │ fetcher │     catalog (search, trending,
//!                 └──────────┘ └─────────┘      playback lookup)
//!                       │         │                 │
//!                       ▼         ▼                 ▼
//!                 ┌──────────────────────────────────────┐
//!                 │        gate (RequestGate)             │
//!                 └──────────────────────────────────────┘
//!                                  │
//!                       source::Upstream (HTTP)
//! ```
//!
//! * **`gate`**: bounds concurrently running upstream requests (FIFO).
//! * **`resolver`**: maps `@handle` aliases to stable `UC…` channel ids.
//! * **`fetcher`**: one channel's listing, with timeout and a single retry.
//! * **`aggregate`**: fans out over all subscriptions and merges the
//!   results into a windowed, deduplicated, ranked and capped feed.
//! * **`normalize`**: rewrites upstream media URLs for the local proxy.
//! * **`source/`**: the `Upstream` trait, its Invidious implementation, the
//!   shared data types, and defensive payload parsing.
//! * **`store`**: subscriptions, resolved ids and watch state.
//! * **`catalog`**: search, trending, channel info and stream lookup.
//! * **`config`**: TOML configuration.

pub mod aggregate;
pub mod catalog;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod gate;
pub mod normalize;
pub mod resolver;
pub mod source;
pub mod store;

pub use aggregate::{FeedAggregator, FeedPass, FeedSettings, SourceReport, SourceStatus};
pub use error::FetchError;
pub use gate::RequestGate;
