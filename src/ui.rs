//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! ## For contributors
//!
//! * The layout is a two-row split: a scrollable list on top and a one-line
//!   status bar at the bottom.
//! * Watched videos are dimmed rather than hidden.
//! * [`ratatui`] is the TUI framework; see its docs for widget details.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph},
    Frame,
};

use livescroll_tube::source::Item;

use crate::app::App;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [main_area, status_area] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_feed_list(app, frame, main_area);
    draw_status_bar(app, frame, status_area);
}

/// `1:02:03`, `4:05`, or `live` for zero-length entries.
fn format_duration(seconds: u64) -> String {
    if seconds == 0 {
        return "live".into();
    }
    let (h, m, s) = (seconds / 3600, (seconds % 3600) / 60, seconds % 60);
    if h > 0 {
        format!("{h}:{m:02}:{s:02}")
    } else {
        format!("{m}:{s:02}")
    }
}

fn format_views(views: u64) -> String {
    match views {
        0..=999 => format!("{views}"),
        // Anything that would round to "1000.0k" is shown in millions.
        1_000..=999_949 => format!("{:.1}k", views as f64 / 1e3),
        _ => format!("{:.1}M", views as f64 / 1e6),
    }
}

fn feed_line<'a>(item: &'a Item, watched: bool) -> Line<'a> {
    let date_str = item
        .published
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "no date".into());

    let title_style = if watched {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::White)
    };

    Line::from(vec![
        Span::styled(
            format!("{:<18}", date_str),
            Style::default().fg(Color::DarkGray),
        ),
        Span::raw(" "),
        Span::styled(&item.title, title_style),
        Span::raw("  "),
        Span::styled(format!("[{}]", item.author), Style::default().fg(Color::Cyan)),
        Span::raw(" "),
        Span::styled(
            format!(
                "{} · {} views",
                format_duration(item.duration_seconds),
                format_views(item.view_count)
            ),
            Style::default().fg(Color::DarkGray),
        ),
    ])
}

/// Render the scrollable feed item list.
fn draw_feed_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let list_items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| ListItem::new(feed_line(item, app.is_watched(item))))
        .collect();

    let list = List::new(list_items)
        .block(
            Block::default()
                .title(" Subscriptions ")
                .borders(Borders::ALL),
        )
        .highlight_style(
            Style::default()
                .add_modifier(Modifier::BOLD)
                .bg(Color::DarkGray),
        )
        .highlight_symbol("▸ ");

    frame.render_stateful_widget(list, area, &mut app.list_state);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::styled(" ", Style::default()),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} videos", app.items.len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: scroll  r: refresh  w: watched  Enter: stream"),
    ]));
    frame.render_widget(status, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{make_item, sample_pass};
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;
    use std::collections::HashSet;

    fn render(app: &mut App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 8)).unwrap();
        terminal.draw(|f| draw(app, f)).unwrap();
        let buffer = terminal.backend().buffer().clone();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|c| c.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn durations() {
        assert_eq!(format_duration(0), "live");
        assert_eq!(format_duration(65), "1:05");
        assert_eq!(format_duration(3723), "1:02:03");
    }

    #[test]
    fn view_counts() {
        assert_eq!(format_views(999), "999");
        assert_eq!(format_views(12_300), "12.3k");
        assert_eq!(format_views(4_500_000), "4.5M");
        assert_eq!(format_views(999_949), "999.9k");
        assert_eq!(format_views(999_950), "1.0M");
    }

    #[test]
    fn draws_items_and_status() {
        let mut app = App::new(HashSet::new());
        app.apply_pass(1, sample_pass());
        app.select_first();

        let screen = render(&mut app);
        assert!(screen.contains(" Subscriptions "));
        assert!(screen.contains("New"));
        assert!(screen.contains("[Test Channel]"));
        assert!(screen.contains("3 videos"));
        assert!(screen.contains("1/2 channels"));
    }

    #[test]
    fn watched_items_are_dimmed() {
        let item = make_item("1", "Seen", None);
        let line = feed_line(&item, true);
        assert_eq!(line.spans[2].style.fg, Some(Color::DarkGray));

        let line = feed_line(&item, false);
        assert_eq!(line.spans[2].style.fg, Some(Color::White));
    }
}
