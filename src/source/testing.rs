//! Test doubles for the engine.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::{Item, SearchKind, Upstream};
use crate::error::FetchError;

/// Shorthand constructor for tests.
pub fn make_item(id: &str, published: Option<DateTime<Utc>>) -> Item {
    Item {
        id: id.to_string(),
        title: format!("Video {id}"),
        author: "test".to_string(),
        source_id: "UCtest".to_string(),
        published,
        view_count: 0,
        duration_seconds: 0,
        thumbnails: Vec::new(),
    }
}

/// JSON listing entry as the upstream would send it.
pub fn video_json(id: &str, published: DateTime<Utc>) -> Value {
    json!({
        "videoId": id,
        "title": format!("Video {id}"),
        "author": "test",
        "published": published.timestamp(),
        "videoThumbnails": [{ "url": format!("https://i.ytimg.com/vi/{id}/mqdefault.jpg") }]
    })
}

/// How a scripted endpoint answers.
#[derive(Debug, Clone)]
pub enum Reply {
    Json(Value),
    Fail(FetchError),
    /// Answer with `Value` after sleeping.
    Delayed(Duration, Value),
    /// Never answer.
    Hang,
}

/// An [`Upstream`] that answers from a script and records every call.
///
/// Unscripted keys answer with an empty array.  Replies for a key can be a
/// queue: each call pops the front until one reply is left, which then
/// repeats.
#[derive(Default)]
pub struct ScriptedUpstream {
    searches: Mutex<HashMap<String, Vec<Reply>>>,
    videos: Mutex<HashMap<String, Vec<Reply>>>,
    others: Mutex<HashMap<String, Vec<Reply>>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedUpstream {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_search(self, query: &str, reply: Reply) -> Self {
        push(&self.searches, query, reply);
        self
    }

    pub fn on_videos(self, channel_id: &str, reply: Reply) -> Self {
        push(&self.videos, channel_id, reply);
        self
    }

    /// Script `channel_info`, `trending` and `video_details` by the key
    /// `"channel:{id}"`, `"trending:{category}"` or `"video:{id}"`.
    pub fn on_other(self, key: &str, reply: Reply) -> Self {
        push(&self.others, key, reply);
        self
    }

    /// Every call so far, formatted as `"{endpoint}:{argument}"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    async fn answer(
        &self,
        table: &Mutex<HashMap<String, Vec<Reply>>>,
        key: &str,
        call: String,
    ) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(call);
        let reply = {
            let mut table = table.lock().unwrap();
            match table.get_mut(key) {
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) => queue[0].clone(),
                None => Reply::Json(json!([])),
            }
        };
        match reply {
            Reply::Json(v) => Ok(v),
            Reply::Fail(e) => Err(e),
            Reply::Delayed(d, v) => {
                tokio::time::sleep(d).await;
                Ok(v)
            }
            Reply::Hang => std::future::pending().await,
        }
    }
}

fn push(table: &Mutex<HashMap<String, Vec<Reply>>>, key: &str, reply: Reply) {
    table
        .lock()
        .unwrap()
        .entry(key.to_string())
        .or_default()
        .push(reply);
}

#[async_trait]
impl Upstream for ScriptedUpstream {
    async fn search(&self, query: &str, kind: SearchKind) -> Result<Value, FetchError> {
        self.answer(&self.searches, query, format!("search:{}:{query}", kind.as_str()))
            .await
    }

    async fn channel_videos(&self, channel_id: &str) -> Result<Value, FetchError> {
        self.answer(&self.videos, channel_id, format!("videos:{channel_id}"))
            .await
    }

    async fn channel_info(&self, channel_id: &str) -> Result<Value, FetchError> {
        let key = format!("channel:{channel_id}");
        self.answer(&self.others, &key, key.clone()).await
    }

    async fn trending(&self, category: &str) -> Result<Value, FetchError> {
        let key = format!("trending:{category}");
        self.answer(&self.others, &key, key.clone()).await
    }

    async fn video_details(&self, video_id: &str) -> Result<Value, FetchError> {
        let key = format!("video:{video_id}");
        self.answer(&self.others, &key, key.clone()).await
    }
}
