use std::ops::Range;

use chrono::{DateTime, Utc};
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, ITEM_HEIGHT};
use crate::icons::Icon;
use crate::types::Item;

pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!("Feed ({})", app.feed.len()));

    let width = area.width.saturating_sub(2) as usize;
    let rows = area.height.saturating_sub(2) as usize;
    let now = Utc::now();

    let (window, scroll) = visible_window(app.scroll_offset, rows, app.feed.len());
    let mut lines: Vec<Line> = Vec::with_capacity(window.len() * ITEM_HEIGHT + 1);
    for (i, item) in app.feed.items()[window.clone()].iter().enumerate() {
        let selected = window.start + i == app.selected;
        lines.extend(item_lines(item, app.feed.icon(&item.source_group), selected, width, now));
    }
    if window.end == app.feed.len() {
        lines.push(sentinel_line(app));
    }

    let feed = Paragraph::new(lines).block(block).scroll((scroll, 0));
    frame.render_widget(feed, area);
}

/// Items overlapping `rows` lines starting at content row `scroll_offset`,
/// and the row offset into the first of them. Every item is exactly
/// ITEM_HEIGHT lines so this matches the scroll math in `App`.
fn visible_window(scroll_offset: usize, rows: usize, len: usize) -> (Range<usize>, u16) {
    let first = (scroll_offset / ITEM_HEIGHT).min(len);
    let last = first.saturating_add(rows / ITEM_HEIGHT + 2).min(len);
    (first..last, (scroll_offset % ITEM_HEIGHT) as u16)
}

fn item_lines<'a>(
    item: &'a Item,
    icon: &Icon,
    selected: bool,
    width: usize,
    now: DateTime<Utc>,
) -> [Line<'a>; 4] {
    let (glyph, glyph_color) = match icon {
        Icon::Found(_) => ("◉", Color::Cyan),
        Icon::Pending => ("◌", Color::DarkGray),
        Icon::Missing => ("○", Color::DarkGray),
    };
    let marker = if selected { "> " } else { "  " };
    let title_style = if selected {
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().add_modifier(Modifier::BOLD)
    };

    let thumb = if item.thumbnail_url.is_some() { " ▣" } else { "" };
    let title_width = width.saturating_sub(marker.len() + thumb.chars().count());

    let header = Line::from(vec![
        Span::raw(marker),
        Span::styled(glyph, Style::default().fg(glyph_color)),
        Span::raw(" "),
        Span::styled(
            format!("r/{}", item.source_group),
            Style::default().fg(Color::Blue),
        ),
        Span::raw("  "),
        Span::styled(
            format_age(item.created_at, now),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let title = Line::from(vec![
        Span::raw(marker),
        Span::styled(truncate(&item.title, title_width), title_style),
        Span::styled(thumb, Style::default().fg(Color::DarkGray)),
    ]);

    let counts = Line::from(vec![
        Span::raw(marker),
        Span::styled(
            format!("▲ {}", compact(item.upvote_count)),
            Style::default().fg(Color::Green),
        ),
        Span::raw("   "),
        Span::styled(
            format!("✉ {}", compact(item.comment_count)),
            Style::default().fg(Color::Gray),
        ),
    ]);

    [header, title, counts, Line::from("")]
}

fn sentinel_line(app: &App) -> Line<'static> {
    let (text, color) = if app.controller.is_loading() {
        ("  Loading more...", Color::Yellow)
    } else if app.error.is_some() {
        ("  Press l to retry", Color::Red)
    } else {
        ("  · more below ·", Color::DarkGray)
    };
    Line::from(Span::styled(text, Style::default().fg(color)))
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let keep = max.saturating_sub(3);
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

/// Short human count: 999, 1.2k, 12k, 1.5M.
pub fn compact(n: u64) -> String {
    const UNITS: [(u64, &str); 3] = [(1_000_000_000, "B"), (1_000_000, "M"), (1_000, "k")];
    for (scale, suffix) in UNITS {
        if n >= scale {
            let value = n as f64 / scale as f64;
            return if value < 10.0 {
                let rounded = format!("{:.1}", (value * 10.0).floor() / 10.0);
                format!("{}{}", rounded.trim_end_matches(".0"), suffix)
            } else {
                format!("{}{}", value.floor() as u64, suffix)
            };
        }
    }
    n.to_string()
}

pub fn format_age(then: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(then);
    if duration.num_days() >= 365 {
        format!("{}y ago", duration.num_days() / 365)
    } else if duration.num_days() >= 30 {
        format!("{}mo ago", duration.num_days() / 30)
    } else if duration.num_days() > 0 {
        format!("{}d ago", duration.num_days())
    } else if duration.num_hours() > 0 {
        format!("{}h ago", duration.num_hours())
    } else if duration.num_minutes() > 0 {
        format!("{}m ago", duration.num_minutes())
    } else {
        "now".to_string()
    }
}
