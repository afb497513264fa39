use ratatui::layout::{Constraint, Direction, Layout, Rect};

use crate::models::{Track, ViewQuery};
use crate::view::CatalogStats;

/// Produce a rectangle centered within `area` that spans the requested percent
/// of the width and height. Used for modal dialogs.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);

    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1]);

    vertical[1]
}

/// `Total: 12   Avg ★ 3.25   Top: Title (5.0)`
pub(crate) fn stats_line(stats: &CatalogStats) -> String {
    let mut line = format!(
        "Total: {}   Avg ★ {:.2}",
        stats.count, stats.mean_rating
    );
    if let Some(best) = &stats.best {
        line.push_str(&format!("   Top: {} ({:.1})", best.title, best.rating));
    }
    line
}

/// `Search: "abc"   Min ★ 2.5   Sort: rating desc`
pub(crate) fn query_line(query: &ViewQuery) -> String {
    let search = if query.text.trim().is_empty() {
        "-".to_string()
    } else {
        format!("\"{}\"", query.text.trim())
    };
    format!(
        "Search: {search}   Min ★ {:.1}   Sort: {} {}",
        query.min_rating,
        query.sort_key.label(),
        query.direction.label()
    )
}

/// Second line of a track card.
pub(crate) fn track_meta_line(track: &Track) -> String {
    let artists = track.artist_line().unwrap_or_else(|| "—".to_string());
    format!(
        "{} • {} • {} • ★ {:.1}",
        track.album,
        artists,
        track.duration_label(),
        track.rating
    )
}
