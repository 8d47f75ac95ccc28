use std::collections::HashSet;

use ratatui::widgets::ListState;

use livescroll_tube::source::Item;
use livescroll_tube::FeedPass;

pub struct App {
    /// Items of the newest aggregation pass, already ranked.
    pub items: Vec<Item>,
    /// Ids of items the user has marked as watched.
    pub watched: HashSet<String>,
    /// List selection state for scrolling.
    pub list_state: ListState,
    /// Whether the user has requested to quit.
    pub quit: bool,
    /// Last poll status message.
    pub status: String,
    /// Sequence number of the pass currently shown (0 = none yet).
    shown_pass: u64,
}

impl App {
    pub fn new(watched: HashSet<String>) -> Self {
        Self {
            items: Vec::new(),
            watched,
            list_state: ListState::default(),
            quit: false,
            status: "Starting…".into(),
            shown_pass: 0,
        }
    }

    /// Replace the feed with the result of pass `seq`.
    ///
    /// Each pass is a complete feed, so nothing is merged with the previous
    /// one.  Passes older than the one on screen are discarded.  Returns
    /// whether the pass was applied.
    pub fn apply_pass(&mut self, seq: u64, pass: FeedPass) -> bool {
        if seq <= self.shown_pass {
            return false;
        }
        self.shown_pass = seq;

        // Keep the cursor on the same video if it is still in the feed.
        let selected_id = self.selected_item().map(|i| i.id.clone());

        self.status = if pass.sources.is_empty() {
            "No subscriptions".to_string()
        } else if pass.failed_sources() == 0 {
            format!("{} channels", pass.sources.len())
        } else {
            format!(
                "{}/{} channels ({} unavailable)",
                pass.healthy_sources(),
                pass.sources.len(),
                pass.failed_sources()
            )
        };
        self.items = pass.items;

        let selection = match selected_id {
            Some(id) => self.items.iter().position(|i| i.id == id).or(Some(0)),
            None => None,
        };
        self.list_state
            .select(selection.filter(|_| !self.items.is_empty()));
        true
    }

    pub fn selected_item(&self) -> Option<&Item> {
        self.list_state.selected().and_then(|i| self.items.get(i))
    }

    pub fn is_watched(&self, item: &Item) -> bool {
        self.watched.contains(&item.id)
    }

    /// Mark the selected item as watched.  Returns its id if it was not
    /// watched before, so the caller can persist the change.
    pub fn mark_selected_watched(&mut self) -> Option<String> {
        let id = self.selected_item()?.id.clone();
        self.watched.insert(id.clone()).then_some(id)
    }

    /// Show the result of a playback lookup in the status bar.
    pub fn show_stream(&mut self, item_id: &str, url: Option<String>) {
        let title = self
            .items
            .iter()
            .find(|i| i.id == item_id)
            .map_or(item_id, |i| i.title.as_str());
        self.status = match url {
            Some(url) => format!("{title}: {url}"),
            None => format!("{title}: no playable stream"),
        };
    }

    // -- navigation ----------------------------------------------------------

    pub fn select_next(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => (i + 1).min(self.items.len() - 1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_previous(&mut self) {
        if self.items.is_empty() {
            return;
        }
        let i = match self.list_state.selected() {
            Some(i) => i.saturating_sub(1),
            None => 0,
        };
        self.list_state.select(Some(i));
    }

    pub fn select_first(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(0));
        }
    }

    pub fn select_last(&mut self) {
        if !self.items.is_empty() {
            self.list_state.select(Some(self.items.len() - 1));
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use livescroll_tube::{FetchError, SourceReport, SourceStatus};

    pub fn make_item(id: &str, title: &str, published: Option<chrono::DateTime<Utc>>) -> Item {
        Item {
            id: id.to_string(),
            title: title.to_string(),
            author: "Test Channel".to_string(),
            source_id: "UCtest".to_string(),
            published,
            view_count: 0,
            duration_seconds: 0,
            thumbnails: Vec::new(),
        }
    }

    fn report(name: &str, status: SourceStatus) -> SourceReport {
        SourceReport {
            display_name: name.to_string(),
            source_ref: name.to_string(),
            resolved_id: None,
            status,
        }
    }

    pub fn sample_pass() -> FeedPass {
        FeedPass {
            items: vec![
                make_item("3", "New", Some(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())),
                make_item("2", "Mid", Some(Utc.with_ymd_and_hms(2025, 12, 20, 0, 0, 0).unwrap())),
                make_item("1", "Old", Some(Utc.with_ymd_and_hms(2025, 12, 10, 0, 0, 0).unwrap())),
            ],
            sources: vec![
                report("UCa", SourceStatus::Fetched { count: 3 }),
                report("UCb", SourceStatus::Failed(FetchError::Status(500))),
            ],
        }
    }

    // -- construction --------------------------------------------------------

    #[test]
    fn new_app_starts_empty() {
        let app = App::new(HashSet::new());
        assert!(app.items.is_empty());
        assert!(!app.quit);
        assert!(app.list_state.selected().is_none());
    }

    // -- apply_pass ----------------------------------------------------------

    #[test]
    fn apply_pass_replaces_items_and_reports_health() {
        let mut app = App::new(HashSet::new());
        assert!(app.apply_pass(1, sample_pass()));

        assert_eq!(app.items.len(), 3);
        assert_eq!(app.items[0].id, "3");
        assert_eq!(app.status, "1/2 channels (1 unavailable)");
    }

    #[test]
    fn apply_pass_does_not_merge_with_previous_feed() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());
        app.apply_pass(
            2,
            FeedPass {
                items: vec![make_item("9", "Only", None)],
                sources: vec![report("UCa", SourceStatus::Fetched { count: 1 })],
            },
        );

        assert_eq!(app.items.len(), 1);
        assert_eq!(app.status, "1 channels");
    }

    #[test]
    fn stale_pass_is_discarded() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(2, sample_pass());
        assert!(!app.apply_pass(1, FeedPass::default()));
        assert!(!app.apply_pass(2, FeedPass::default()));
        assert_eq!(app.items.len(), 3);
    }

    #[test]
    fn empty_subscription_list_is_reported() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, FeedPass::default());
        assert_eq!(app.status, "No subscriptions");
    }

    #[test]
    fn selection_follows_item_across_passes() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());
        app.select_last(); // item "1"

        let mut next = sample_pass();
        next.items.insert(0, make_item("4", "Newer", None));
        app.apply_pass(2, next);

        assert_eq!(app.selected_item().map(|i| i.id.as_str()), Some("1"));
    }

    #[test]
    fn selection_resets_when_item_disappears() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());
        app.select_last();

        let mut next = sample_pass();
        next.items.pop();
        app.apply_pass(2, next);
        assert_eq!(app.list_state.selected(), Some(0));

        app.apply_pass(3, FeedPass::default());
        assert_eq!(app.list_state.selected(), None);
    }

    // -- watched -------------------------------------------------------------

    #[test]
    fn mark_selected_watched_reports_new_marks_only() {
        let mut app = App::new(HashSet::new());
        assert_eq!(app.mark_selected_watched(), None, "nothing selected");

        app.apply_pass(1, sample_pass());
        app.select_first();
        assert_eq!(app.mark_selected_watched().as_deref(), Some("3"));
        assert_eq!(app.mark_selected_watched(), None, "already watched");
        assert!(app.is_watched(&app.items[0]));
    }

    #[test]
    fn show_stream_uses_item_title() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());

        app.show_stream("2", Some("/videoplayback?itag=22".into()));
        assert_eq!(app.status, "Mid: /videoplayback?itag=22");

        app.show_stream("gone", None);
        assert_eq!(app.status, "gone: no playable stream");
    }

    // -- navigation ----------------------------------------------------------

    #[test]
    fn navigation_on_empty_is_noop() {
        let mut app = App::new(HashSet::new());
        app.select_next();
        app.select_previous();
        app.select_first();
        app.select_last();
        assert!(app.list_state.selected().is_none());
    }

    #[test]
    fn select_next_starts_at_zero_then_advances() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(0));

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(1));

        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn select_next_clamps_at_last_item() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());

        app.select_last();
        app.select_next();
        assert_eq!(app.list_state.selected(), Some(2));
    }

    #[test]
    fn select_previous_clamps_at_zero() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());

        app.select_first();
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(0));
    }

    #[test]
    fn select_previous_moves_up() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());

        app.select_last(); // index 2
        app.select_previous();
        assert_eq!(app.list_state.selected(), Some(1));
    }
}
