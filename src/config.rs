use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Config file read when no path is given on the command line.
pub const DEFAULT_CONFIG_PATH: &str = "livescroll-tube.toml";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub feed: FeedConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_hl")]
    pub hl: String,
    #[serde(default = "default_region")]
    pub region: String,
    /// Ceiling on simultaneously running upstream requests.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
    /// Budget for search, channel-info and video-details calls.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
    /// Budget for a channel's video listing, which can be slow.
    #[serde(default = "default_listing_timeout")]
    pub listing_timeout_ms: u64,
    #[serde(default = "default_trending_timeout")]
    pub trending_timeout_ms: u64,
}

fn default_base_url() -> String { "http://127.0.0.1:3000".to_string() }
fn default_hl() -> String { "fr".to_string() }
fn default_region() -> String { "FR".to_string() }
fn default_max_concurrency() -> usize { 3 }
fn default_request_timeout() -> u64 { 10_000 }
fn default_listing_timeout() -> u64 { 20_000 }
fn default_trending_timeout() -> u64 { 20_000 }

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            hl: default_hl(),
            region: default_region(),
            max_concurrency: default_max_concurrency(),
            request_timeout_ms: default_request_timeout(),
            listing_timeout_ms: default_listing_timeout(),
            trending_timeout_ms: default_trending_timeout(),
        }
    }
}

impl UpstreamConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn listing_timeout(&self) -> Duration {
        Duration::from_millis(self.listing_timeout_ms)
    }

    pub fn trending_timeout(&self) -> Duration {
        Duration::from_millis(self.trending_timeout_ms)
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Items older than this are left out of the feed.
    #[serde(default = "default_window_days")]
    pub window_days: i64,
    #[serde(default = "default_max_items")]
    pub max_items: usize,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_s: u64,
}

/// Upper bound for `window_days` (about a century).
pub const MAX_WINDOW_DAYS: i64 = 36_500;

fn default_window_days() -> i64 { 30 }
fn default_max_items() -> usize { 80 }
fn default_poll_interval() -> u64 { 600 }

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            max_items: default_max_items(),
            poll_interval_s: default_poll_interval(),
        }
    }
}

impl FeedConfig {
    pub fn window(&self) -> chrono::Duration {
        chrono::Duration::try_days(self.window_days.clamp(0, MAX_WINDOW_DAYS))
            .unwrap_or_else(chrono::Duration::zero)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_s.max(1))
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf { PathBuf::from("subscriptions.json") }

impl Default for StoreConfig {
    fn default() -> Self {
        Self { path: default_store_path() }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    /// Like [`Config::load`], but a missing file yields the defaults.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).with_context(|| "Failed to parse config TOML")?;
        if !(0..=MAX_WINDOW_DAYS).contains(&config.feed.window_days) {
            bail!(
                "feed.window_days must be between 0 and {MAX_WINDOW_DAYS}, got {}",
                config.feed.window_days
            );
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config.upstream.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.upstream.max_concurrency, 3);
        assert_eq!(config.upstream.listing_timeout(), Duration::from_secs(20));
        assert_eq!(config.feed.window(), chrono::Duration::days(30));
        assert_eq!(config.feed.max_items, 80);
        assert_eq!(config.store.path, PathBuf::from("subscriptions.json"));
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = Config::parse(
            r#"
            [upstream]
            base_url = "https://invidious.example"
            max_concurrency = 6

            [feed]
            max_items = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.upstream.base_url, "https://invidious.example");
        assert_eq!(config.upstream.max_concurrency, 6);
        assert_eq!(config.upstream.hl, "fr");
        assert_eq!(config.upstream.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.feed.max_items, 50);
        assert_eq!(config.feed.window_days, 30);
    }

    #[test]
    fn out_of_range_window_is_rejected() {
        let err = Config::parse("[feed]\nwindow_days = 9223372036854775807\n").unwrap_err();
        assert!(err.to_string().contains("window_days"));
        assert!(Config::parse("[feed]\nwindow_days = -1\n").is_err());
    }

    #[test]
    fn window_is_clamped_when_built_directly() {
        let feed = FeedConfig { window_days: i64::MAX, ..FeedConfig::default() };
        assert_eq!(feed.window(), chrono::Duration::days(MAX_WINDOW_DAYS));

        let feed = FeedConfig { window_days: -3, ..FeedConfig::default() };
        assert_eq!(feed.window(), chrono::Duration::zero());
    }

    #[test]
    fn invalid_toml_is_an_error() {
        assert!(Config::parse("[upstream\nbase_url = 1").is_err());
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_default(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.feed.poll_interval(), Duration::from_secs(600));
    }

    #[test]
    fn load_reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("livescroll-tube.toml");
        std::fs::write(&path, "[store]\npath = \"/tmp/subs.json\"\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.store.path, PathBuf::from("/tmp/subs.json"));
    }
}
