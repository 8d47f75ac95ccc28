//! Playback URL selection from a video-details response.

use serde::Deserialize;
use serde_json::Value;

use crate::error::FetchError;
use crate::normalize::normalize_url;

/// Itags tried in order: 720p and 360p muxed first, then DASH video-only.
const PRIORITY_ITAGS: &[&str] = &["22", "18", "137", "136", "135", "134"];

/// The parts of a video-details response needed to pick a stream.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoDetails {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub hls_url: Option<String>,
    #[serde(default)]
    pub dash_url: Option<String>,
    #[serde(default)]
    pub format_streams: Vec<StreamFormat>,
    #[serde(default)]
    pub adaptive_formats: Vec<StreamFormat>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StreamFormat {
    /// A string on Invidious, a number on some mirrors.
    #[serde(default)]
    pub itag: Option<Value>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub container: Option<String>,
}

impl StreamFormat {
    fn itag_is(&self, wanted: &str) -> bool {
        match &self.itag {
            Some(Value::String(s)) => s == wanted,
            Some(Value::Number(n)) => n.to_string() == wanted,
            _ => false,
        }
    }

    fn playable_url(&self) -> Option<&str> {
        self.url.as_deref().filter(|u| !u.is_empty())
    }
}

impl VideoDetails {
    pub fn from_json(body: Value) -> Result<Self, FetchError> {
        Ok(serde_json::from_value(body)?)
    }

    /// Pick the most dependable playback URL, already proxied.
    ///
    /// Order: HLS manifest, then muxed/adaptive streams by
    /// [`PRIORITY_ITAGS`], then the DASH manifest, then any MP4 stream, then
    /// whatever stream comes first.
    pub fn best_stream_url(&self) -> Option<String> {
        if let Some(hls) = self.hls_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(normalize_url(hls));
        }

        let formats: Vec<&StreamFormat> = self
            .format_streams
            .iter()
            .chain(self.adaptive_formats.iter())
            .collect();

        for itag in PRIORITY_ITAGS {
            if let Some(url) = formats
                .iter()
                .find(|f| f.itag_is(itag))
                .and_then(|f| f.playable_url())
            {
                return Some(normalize_url(url));
            }
        }

        if let Some(dash) = self.dash_url.as_deref().filter(|u| !u.is_empty()) {
            return Some(normalize_url(dash));
        }

        if let Some(url) = formats
            .iter()
            .filter(|f| f.container.as_deref() == Some("mp4"))
            .find_map(|f| f.playable_url())
        {
            return Some(normalize_url(url));
        }

        formats
            .first()
            .and_then(|f| f.playable_url())
            .map(normalize_url)
    }
}
