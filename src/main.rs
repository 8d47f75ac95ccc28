//! livescroll-tube: a live-updating subscription feed for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌──────────┐  PollMsg   ┌──────────┐  draw()  ┌──────────┐
//! │  poll.rs │ ─────────► │  app.rs  │ ───────► │  ui.rs   │
//! │ (tokio)  │  (channel) │ (state)  │          │ (render) │
//! └──────────┘            └──────────┘          └──────────┘
//!      ▲                       ▲
//!      │ Action                │ handle_key_event()
//!      │                  ┌──────────┐
//!      └──────────────────│ input.rs │
//!                         └──────────┘
//! ```
//!
//! * **`poll`**: runs aggregation passes on the tokio runtime, on a timer or
//!   on demand, and answers stream lookups.
//! * **`app`**: owns all viewer state (items, watched set, scroll position).
//! * **`ui`**: pure rendering: reads `App` state and draws widgets.
//! * **`input`**: maps key events to `App` mutations and [`input::Action`]s.
//! * **`main`**: wires everything together: load config, set up logging and
//!   the terminal, and run the event loop.
//!
//! The feed engine itself lives in the `livescroll_tube` library.

mod app;
mod input;
mod poll;
mod ui;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::EnvFilter;

use livescroll_tube::catalog::Catalog;
use livescroll_tube::config::{Config, DEFAULT_CONFIG_PATH};
use livescroll_tube::source::{InvidiousClient, Upstream};
use livescroll_tube::store::{JsonFileStore, SubscriptionStore};
use livescroll_tube::{FeedAggregator, FeedSettings, RequestGate};

use app::App;
use input::Action;
use poll::PollMsg;

/// The terminal is taken over by the UI, so logs go to a file.
const LOG_FILE: &str = "livescroll-tube.log";
const DEFAULT_LOG_FILTER: &str = "livescroll_tube=info";

// ---------------------------------------------------------------------------
// RAII terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
///
/// Constructing this struct enters raw mode + alternate screen.  When the
/// value is dropped (normally or during stack unwinding) it restores the
/// terminal.
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

/// Send `tracing` output to [`LOG_FILE`].  `RUST_LOG` overrides the filter.
fn init_logging() -> Result<()> {
    let file = File::create(LOG_FILE).with_context(|| format!("creating {LOG_FILE}"))?;
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Arc::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    install_panic_hook();

    // -- parse arguments -----------------------------------------------------
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let config = Config::load_or_default(&config_path)?;

    init_logging()?;
    tracing::info!(
        config = %config_path.display(),
        upstream = %config.upstream.base_url,
        "starting"
    );

    // -- feed engine ---------------------------------------------------------
    let runtime = tokio::runtime::Runtime::new().context("starting tokio runtime")?;
    let _entered = runtime.enter();

    let gate = Arc::new(RequestGate::new(config.upstream.max_concurrency));
    let upstream: Arc<dyn Upstream> = Arc::new(InvidiousClient::from_config(&config.upstream)?);
    let store = Arc::new(JsonFileStore::open(&config.store.path)?);

    let aggregator = Arc::new(FeedAggregator::new(
        Arc::clone(&upstream),
        Arc::clone(&gate),
        store.clone(),
        &config.upstream,
    ));
    let catalog = Arc::new(Catalog::new(upstream, gate, &config.upstream));

    // -- start background polling --------------------------------------------
    let (poller, mut rx) = poll::spawn(
        aggregator,
        catalog,
        FeedSettings::from(&config.feed),
        config.feed.poll_interval(),
    );

    // -- terminal setup (RAII: Drop restores on exit or panic) ---------------
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(store.watched());

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps (100 ms tick).  Each iteration:
    //   1. Drain any messages from the background tasks.
    //   2. Render the UI.
    //   3. Poll for keyboard input (non-blocking, up to tick_rate).
    let tick_rate = Duration::from_millis(100);

    loop {
        while let Ok(msg) = rx.try_recv() {
            match msg {
                PollMsg::Feed { seq, pass } => {
                    if !app.apply_pass(seq, pass) {
                        tracing::debug!(seq, "discarding stale pass");
                    }
                }
                PollMsg::StreamUrl { item_id, url } => app.show_stream(&item_id, url),
            }
        }

        guard.terminal.draw(|f| ui::draw(&mut app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                match input::handle_key_event(&mut app, key) {
                    Some(Action::Refresh) => poller.refresh_now(),
                    Some(Action::MarkWatched(id)) => {
                        store.mark_watched(&id);
                    }
                    Some(Action::OpenStream(id)) => poller.lookup_stream(id),
                    None => {}
                }
            }
        }

        if app.quit {
            break;
        }
    }

    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
