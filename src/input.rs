//! Keyboard input handling.
//!
//! Maps terminal key events to [`App`] mutations.  Keys that need the
//! background tasks or the store return an [`Action`] for the main loop to
//! carry out.
//!
//! ## For contributors
//!
//! To add a new keybinding:
//!
//! 1. Add a method on [`App`] for the action (if one doesn't exist), or a
//!    variant on [`Action`] if it has to leave the UI thread.
//! 2. Add a `KeyCode` match arm in [`handle_key_event`].
//! 3. Update the help text in `ui::draw_status_bar`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::app::App;

/// Work the main loop has to do on behalf of a keypress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Run an aggregation pass now.
    Refresh,
    /// Persist the watched mark for this video id.
    MarkWatched(String),
    /// Look up a playback URL for this video id.
    OpenStream(String),
}

/// Process a single key event, updating app state accordingly.
///
/// Only reacts to key-press events (ignoring release / repeat) so that each
/// physical keypress triggers exactly one action.
pub fn handle_key_event(app: &mut App, key: KeyEvent) -> Option<Action> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.quit = true,
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Up | KeyCode::Char('k') => app.select_previous(),
        KeyCode::Home | KeyCode::Char('g') => app.select_first(),
        KeyCode::End | KeyCode::Char('G') => app.select_last(),
        KeyCode::Char('r') => {
            app.status = "Refreshing…".into();
            return Some(Action::Refresh);
        }
        KeyCode::Char('w') => return app.mark_selected_watched().map(Action::MarkWatched),
        KeyCode::Enter => {
            let id = app.selected_item()?.id.clone();
            app.status = "Looking up stream…".into();
            return Some(Action::OpenStream(id));
        }
        _ => {}
    }
    None
}
