//! Terminal rendering for reports, feeds and sync results.
//!
//! Every `render_*` function returns a `String`; the `*_internal` variants
//! take an explicit color switch so tests can compare plain text.

use chrono::{DateTime, Utc};
use citycareapp::feed::{Feed, FeedSource};
use citycareapp::model::{FavoriteState, Record};
use citycareapp::sync::SyncReport;
use console::Style;
use std::collections::HashSet;
use std::fmt::Write;
use timeago::Formatter;

const DESCRIPTION_WIDTH: usize = 60;

struct Styles {
    id: Style,
    name: Style,
    time: Style,
    heart: Style,
    ok: Style,
    warn: Style,
    error: Style,
}

impl Styles {
    fn new(use_color: bool) -> Self {
        let base = Style::new().force_styling(use_color);
        Self {
            id: base.clone().yellow(),
            name: base.clone().bold(),
            time: base.clone().dim().italic(),
            heart: base.clone().red(),
            ok: base.clone().green(),
            warn: base.clone().yellow(),
            error: base.red().bold(),
        }
    }
}

fn use_color() -> bool {
    console::colors_enabled()
}

pub fn render_records(records: &[Record], favorites: &HashSet<String>, empty: &str) -> String {
    render_records_internal(records, favorites, empty, Utc::now(), use_color())
}

fn render_records_internal(
    records: &[Record],
    favorites: &HashSet<String>,
    empty: &str,
    now: DateTime<Utc>,
    use_color: bool,
) -> String {
    if records.is_empty() {
        return format!("{}\n", empty);
    }

    let styles = Styles::new(use_color);
    let mut out = String::new();
    for record in records {
        let heart = if favorites.contains(&record.id) {
            styles.heart.apply_to("♥").to_string()
        } else {
            " ".to_string()
        };
        let _ = write!(out, "{} {}", heart, styles.id.apply_to(&record.id));
        if let Some(name) = &record.name {
            let _ = write!(out, "  {}", styles.name.apply_to(name));
        }
        if let Some(created_at) = record.created_at {
            let _ = write!(out, "  {}", styles.time.apply_to(time_ago(created_at, now)));
        }
        out.push('\n');
        let _ = writeln!(
            out,
            "    {}",
            truncate_to_width(&record.description, DESCRIPTION_WIDTH)
        );
        if let (Some(lat), Some(lon)) = (record.lat, record.lon) {
            let _ = writeln!(out, "    @ {:.5}, {:.5}", lat, lon);
        }
    }
    out
}

pub fn render_feed(feed: &Feed, records: &[&Record], favorites: &HashSet<String>) -> String {
    render_feed_internal(feed, records, favorites, Utc::now(), use_color())
}

fn render_feed_internal(
    feed: &Feed,
    records: &[&Record],
    favorites: &HashSet<String>,
    now: DateTime<Utc>,
    use_color: bool,
) -> String {
    let styles = Styles::new(use_color);
    let mut out = String::new();
    if feed.source == FeedSource::FavoritesFallback {
        let reason = feed.degraded_reason.as_deref().unwrap_or("remote unavailable");
        let _ = writeln!(
            out,
            "{}",
            styles
                .warn
                .apply_to(format!("Offline ({}), showing favorites.", reason))
        );
    }
    let owned: Vec<Record> = records.iter().map(|r| (*r).clone()).collect();
    out.push_str(&render_records_internal(
        &owned,
        favorites,
        "No reports found.",
        now,
        use_color,
    ));
    out
}

pub fn render_sync_report(report: &SyncReport) -> String {
    render_sync_report_internal(report, use_color())
}

fn render_sync_report_internal(report: &SyncReport, use_color: bool) -> String {
    if report.is_noop() {
        return "Nothing to sync.\n".to_string();
    }

    let styles = Styles::new(use_color);
    let mut out = String::new();
    for id in &report.submitted {
        let _ = writeln!(out, "{} {}", styles.ok.apply_to("sent    "), id);
    }
    for (id, message) in &report.rejected {
        let _ = writeln!(out, "{} {}: {}", styles.warn.apply_to("rejected"), id, message);
    }
    for (id, error) in report.failed.iter().chain(&report.unacknowledged) {
        let _ = writeln!(out, "{} {}: {}", styles.error.apply_to("failed  "), id, error);
    }
    let _ = writeln!(
        out,
        "{} sent, {} still queued.",
        report.submitted.len(),
        report.remaining()
    );
    out
}

pub fn render_favorite_state(id: &str, state: FavoriteState) -> String {
    match state {
        FavoriteState::Favorited => format!("Liked {}.\n", id),
        FavoriteState::NotFavorited => format!("Unliked {}.\n", id),
    }
}

fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let duration = now.signed_duration_since(timestamp);
    Formatter::new().convert(duration.to_std().unwrap_or_default())
}

/// Cuts `s` to its first line and at most `max_width` terminal columns.
fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

    let line = s.lines().next().unwrap_or("");
    if line.width() <= max_width && line.len() == s.len() {
        return line.to_string();
    }

    let mut result = String::new();
    let mut current_width = 0;
    let limit = max_width.saturating_sub(1);

    for c in line.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > limit {
            break;
        }
        result.push(c);
        current_width += char_width;
    }
    result.push('…');
    result
}
