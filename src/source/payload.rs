//! Defensive parsing of upstream JSON.
//!
//! The upstream payload shape is not fully trusted.  A response whose top
//! level is the wrong shape is a [`FetchError::MalformedPayload`]; individual
//! entries that are missing an id or title are dropped and the rest are
//! kept.  Optional numeric fields of an unexpected type read as zero.
//!
//! All functions here are pure (no I/O) so tests can feed them literal JSON.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;

use super::{Channel, Item, Thumbnail};
use crate::error::FetchError;
use crate::normalize::normalize_url;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawThumbnail {
    url: Option<String>,
    width: Option<Value>,
    height: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawItem {
    #[serde(alias = "itemId")]
    video_id: Option<String>,
    title: Option<String>,
    author: Option<String>,
    author_id: Option<String>,
    #[serde(alias = "publishedAt")]
    published: Option<Value>,
    view_count: Option<Value>,
    #[serde(alias = "durationSeconds")]
    length_seconds: Option<Value>,
    #[serde(default, alias = "thumbnails")]
    video_thumbnails: Vec<RawThumbnail>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawChannel {
    author_id: Option<String>,
    author: Option<String>,
    #[serde(default)]
    author_thumbnails: Vec<RawThumbnail>,
    sub_count: Option<u64>,
}

/// Extract the entry array from a channel listing.
///
/// Accepts either a bare array or an object carrying the array under
/// `videos` (or `items`).
pub fn listing_entries(body: Value) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(entries) => Ok(entries),
        Value::Object(mut map) => match map.remove("videos").or_else(|| map.remove("items")) {
            Some(Value::Array(entries)) => Ok(entries),
            _ => Err(FetchError::MalformedPayload(
                "object without a videos array".into(),
            )),
        },
        other => Err(FetchError::MalformedPayload(format!(
            "expected array or object, got {}",
            json_kind(&other)
        ))),
    }
}

/// Require a top-level JSON array (search and trending responses).
pub fn array_entries(body: Value) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(entries) => Ok(entries),
        other => Err(FetchError::MalformedPayload(format!(
            "expected array, got {}",
            json_kind(&other)
        ))),
    }
}

/// Convert raw entries into [`Item`]s, dropping anything unusable.
///
/// `default_source` fills `source_id` for entries without an `authorId`
/// (channel listings sometimes omit it).
pub fn parse_items(entries: Vec<Value>, default_source: &str) -> Vec<Item> {
    let total = entries.len();
    let items: Vec<Item> = entries
        .into_iter()
        .filter_map(|entry| item_from_value(entry, default_source))
        .collect();

    if items.len() < total {
        tracing::debug!(
            dropped = total - items.len(),
            kept = items.len(),
            "dropped malformed listing entries"
        );
    }
    items
}

fn item_from_value(entry: Value, default_source: &str) -> Option<Item> {
    let raw: RawItem = serde_json::from_value(entry).ok()?;

    let id = non_empty(raw.video_id)?;
    let title = non_empty(raw.title)?;

    Some(Item {
        id,
        title,
        author: raw.author.unwrap_or_default(),
        source_id: non_empty(raw.author_id).unwrap_or_else(|| default_source.to_string()),
        published: raw.published.as_ref().and_then(parse_published),
        view_count: lenient_u64(raw.view_count.as_ref()),
        duration_seconds: lenient_u64(raw.length_seconds.as_ref()),
        thumbnails: convert_thumbnails(raw.video_thumbnails),
    })
}

/// Parse the channel hits of a `type=channel` search.
pub fn parse_channel_hits(body: Value) -> Result<Vec<Channel>, FetchError> {
    Ok(array_entries(body)?
        .into_iter()
        .filter_map(channel_from_value)
        .collect())
}

/// Parse a channel-info response.
pub fn parse_channel(body: Value) -> Result<Channel, FetchError> {
    channel_from_value(body)
        .ok_or_else(|| FetchError::MalformedPayload("channel without an authorId".into()))
}

fn channel_from_value(entry: Value) -> Option<Channel> {
    let raw: RawChannel = serde_json::from_value(entry).ok()?;
    let id = non_empty(raw.author_id)?;
    Some(Channel {
        name: raw.author.unwrap_or_else(|| id.clone()),
        id,
        thumbnails: convert_thumbnails(raw.author_thumbnails),
        sub_count: raw.sub_count,
    })
}

/// Interpret an upstream publish time.
///
/// Accepts unix seconds (as a number or numeric string), RFC 3339, RFC 2822,
/// and ISO 8601 date-times or dates without an offset (read as UTC).  Zero,
/// empty and unparseable values mean "unknown".
pub fn parse_published(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::Number(n) => {
            let secs = n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64))?;
            from_unix(secs)
        }
        Value::String(s) => {
            let s = s.trim();
            if let Ok(secs) = s.parse::<i64>() {
                return from_unix(secs);
            }
            if let Ok(dt) = DateTime::parse_from_rfc3339(s).or_else(|_| DateTime::parse_from_rfc2822(s)) {
                return Some(dt.with_timezone(&Utc));
            }
            NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f"))
                .ok()
                .or_else(|| {
                    NaiveDate::parse_from_str(s, "%Y-%m-%d")
                        .ok()
                        .and_then(|d| d.and_hms_opt(0, 0, 0))
                })
                .map(|naive| naive.and_utc())
        }
        _ => None,
    }
}

/// A count from a number, float or numeric string; anything else is 0.
fn lenient_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
                .unwrap_or(0)
        }
        _ => 0,
    }
}

fn from_unix(secs: i64) -> Option<DateTime<Utc>> {
    if secs <= 0 {
        return None;
    }
    Utc.timestamp_opt(secs, 0).single()
}

fn convert_thumbnails(raw: Vec<RawThumbnail>) -> Vec<Thumbnail> {
    raw.into_iter()
        .filter_map(|t| {
            let url = non_empty(t.url)?;
            Some(Thumbnail {
                url: normalize_url(&url),
                width: u32::try_from(lenient_u64(t.width.as_ref())).unwrap_or(0),
                height: u32::try_from(lenient_u64(t.height.as_ref())).unwrap_or(0),
            })
        })
        .collect()
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
