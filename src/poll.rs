//! Background feed polling.
//!
//! Runs on the tokio runtime, periodically running an aggregation pass and
//! sending results to the UI thread over an unbounded channel.  Stream URL
//! lookups requested from the UI are answered on the same channel.
//!
//! ## For contributors
//!
//! Every pass carries a sequence number.  The UI keeps only the newest pass
//! it has seen, so a slow pass finishing after a newer one is ignored.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::sync::Notify;

use livescroll_tube::catalog::Catalog;
use livescroll_tube::{FeedAggregator, FeedPass, FeedSettings};

/// Messages sent from background tasks to the UI thread.
pub enum PollMsg {
    /// An aggregation pass finished.
    Feed { seq: u64, pass: FeedPass },
    /// Result of a stream lookup for `item_id`.
    StreamUrl { item_id: String, url: Option<String> },
}

/// Handle the UI uses to talk to the background tasks.
pub struct Poller {
    tx: UnboundedSender<PollMsg>,
    refresh: Arc<Notify>,
    catalog: Arc<Catalog>,
}

impl Poller {
    /// Start the next pass now instead of waiting for the interval.
    pub fn refresh_now(&self) {
        self.refresh.notify_one();
    }

    /// Look up a playback URL in the background.
    pub fn lookup_stream(&self, item_id: String) {
        let tx = self.tx.clone();
        let catalog = Arc::clone(&self.catalog);
        tokio::spawn(async move {
            let url = catalog.stream_url(&item_id).await;
            let _ = tx.send(PollMsg::StreamUrl { item_id, url });
        });
    }
}

/// Spawn the background polling task.
///
/// Must be called from within a tokio runtime context.  Returns the handle
/// and a receiver that the main loop should drain on every tick.  The task
/// stops once the receiver is dropped.
pub fn spawn(
    aggregator: Arc<FeedAggregator>,
    catalog: Arc<Catalog>,
    settings: FeedSettings,
    interval: Duration,
) -> (Poller, UnboundedReceiver<PollMsg>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let refresh = Arc::new(Notify::new());

    let poll_tx = tx.clone();
    let poll_refresh = Arc::clone(&refresh);
    tokio::spawn(async move {
        let mut seq = 0u64;
        loop {
            seq += 1;
            let pass = aggregator.refresh(&settings).await;
            // If the receiver is gone the UI has exited; stop polling.
            if poll_tx.send(PollMsg::Feed { seq, pass }).is_err() {
                return;
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = poll_refresh.notified() => {}
            }
        }
    });

    (Poller { tx, refresh, catalog }, rx)
}
