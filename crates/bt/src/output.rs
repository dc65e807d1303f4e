//! Output formatting helpers for the `bt` CLI.
//!
//! JSON output, aligned tables, and human-readable issue, comment and
//! notification display. Priority and state are colored when the terminal
//! supports it.

use std::env;
use std::io::{self, Write};

use bootrack_core::enums::{IssuePriority, IssueState, UserDateFormat};
use bootrack_core::issue::{IssueDetailed, IssueSummarized};
use bootrack_core::notification::SessionNotification;
use bootrack_core::user::User;
use owo_colors::OwoColorize;
use serde::Serialize;

const RED: (u8, u8, u8) = (0xf0, 0x71, 0x78);
const GOLD: (u8, u8, u8) = (0xe6, 0xb4, 0x50);
const YELLOW: (u8, u8, u8) = (0xff, 0xb4, 0x54);
const GREEN: (u8, u8, u8) = (0xc2, 0xd9, 0x4c);
const MUTED: (u8, u8, u8) = (0x6c, 0x76, 0x80);
const ACCENT: (u8, u8, u8) = (0x59, 0xc2, 0xff);

/// Longest title shown in list tables.
const TITLE_WIDTH: usize = 60;

/// Print a value as pretty-printed JSON to stdout.
///
/// Terminates the process with exit code 1 if serialization fails.
pub fn output_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            // Ignore broken pipe errors (e.g., piped to `head`)
            let _ = writeln!(handle, "{}", json);
        }
        Err(e) => {
            eprintln!("Error: failed to serialize JSON: {}", e);
            std::process::exit(1);
        }
    }
}

/// Whether ANSI colors should be written.
///
/// `NO_COLOR` and `TERM=dumb` disable color, `CLICOLOR_FORCE` forces it,
/// otherwise stdout must be a terminal.
pub fn supports_color() -> bool {
    if env::var_os("NO_COLOR").is_some() || env::var("TERM").as_deref() == Ok("dumb") {
        return false;
    }
    if env::var_os("CLICOLOR_FORCE").is_some() {
        return true;
    }
    crossterm::tty::IsTty::is_tty(&io::stdout())
}

fn paint(s: &str, rgb: (u8, u8, u8), bold: bool) -> String {
    if !supports_color() {
        return s.to_string();
    }
    if bold {
        s.truecolor(rgb.0, rgb.1, rgb.2).bold().to_string()
    } else {
        s.truecolor(rgb.0, rgb.1, rgb.2).to_string()
    }
}

/// Major is loud, normal muted gold, minor plain.
pub fn render_priority(priority: IssuePriority, text: &str) -> String {
    match priority {
        IssuePriority::Major => paint(text, RED, true),
        IssuePriority::Normal => paint(text, GOLD, false),
        IssuePriority::Minor => text.to_string(),
    }
}

pub fn render_state(state: IssueState, text: &str) -> String {
    match state {
        IssueState::Submitted => text.to_string(),
        IssueState::InProgress => paint(text, YELLOW, false),
        IssueState::Completed => paint(text, MUTED, false),
    }
}

pub fn render_accent(text: &str) -> String {
    paint(text, ACCENT, false)
}

pub fn render_muted(text: &str) -> String {
    paint(text, MUTED, false)
}

pub fn render_pass(text: &str) -> String {
    paint(text, GREEN, false)
}

/// Print a table with headers and rows.
///
/// Widths come from the plain cell text; `style` colors a padded cell
/// afterwards so escape codes never skew the alignment.
pub fn output_table(headers: &[&str], rows: &[Vec<String>], style: impl Fn(usize, usize, &str) -> String) {
    if rows.is_empty() {
        return;
    }

    let mut widths: Vec<usize> = headers.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (i, cell) in row.iter().enumerate() {
            if i < widths.len() {
                widths[i] = widths[i].max(cell.chars().count());
            }
        }
    }

    let stdout = io::stdout();
    let mut handle = stdout.lock();

    let header: Vec<String> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| format!("{:<width$}", h, width = widths[i]))
        .collect();
    let _ = writeln!(handle, "{}", header.join("  ").trim_end());

    let separator: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
    let _ = writeln!(handle, "{}", separator.join("  "));

    for (r, row) in rows.iter().enumerate() {
        let cells: Vec<String> = row
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let padded = match widths.get(i) {
                    Some(width) if i + 1 < row.len() => format!("{:<width$}", cell, width = width),
                    _ => cell.clone(),
                };
                style(r, i, &padded)
            })
            .collect();
        let _ = writeln!(handle, "{}", cells.join("  "));
    }
}

/// Shortens `s` to at most `max` characters, marking the cut with `...`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let kept: String = s.chars().take(max.saturating_sub(3)).collect();
    format!("{kept}...")
}

pub const SUMMARY_HEADERS: &[&str] = &["CODE", "PRIORITY", "STATE", "STARS", "VOTES", "COMMENTS", "TITLE"];

/// Columns of [`SUMMARY_HEADERS`] for one issue.
pub fn format_summary_row(summary: &IssueSummarized) -> Vec<String> {
    let issue = &summary.issue;
    vec![
        issue.code.clone(),
        issue.priority.label().to_string(),
        issue.state.label().to_string(),
        issue.watchers.len().to_string(),
        issue.upvotes.len().to_string(),
        summary.comment_count.to_string(),
        truncate(&issue.title, TITLE_WIDTH),
    ]
}

/// Prints summaries as a colored table.
pub fn print_summaries(summaries: &[IssueSummarized]) {
    let rows: Vec<Vec<String>> = summaries.iter().map(format_summary_row).collect();
    output_table(SUMMARY_HEADERS, &rows, |r, col, cell| {
        let issue = &summaries[r].issue;
        match col {
            0 => render_accent(cell),
            1 => render_priority(issue.priority, cell),
            2 => render_state(issue.state, cell),
            _ => cell.to_string(),
        }
    });
}

fn display_name(users: &[User], id: i32) -> String {
    users
        .iter()
        .find(|u| u.id == id)
        .map(|u| format!("{} (@{})", u.full_name, u.username))
        .unwrap_or_else(|| format!("user #{id}"))
}

/// Format an issue and its comments in a detailed multi-line view.
pub fn format_issue_detail(detailed: &IssueDetailed, users: &[User], dates: UserDateFormat) -> String {
    let issue = &detailed.issue;
    let mut lines = Vec::new();

    lines.push(format!("{} {}", render_accent(&issue.code), issue.title));
    lines.push(format!(
        "Priority: {}   State: {}",
        render_priority(issue.priority, issue.priority.label()),
        render_state(issue.state, issue.state.label())
    ));
    lines.push(format!("Author: {}", display_name(users, issue.author_id)));
    if let Some(assignee) = issue.assignee_id {
        lines.push(format!("Assignee: {}", display_name(users, assignee)));
    }
    if let Some(location) = issue.location {
        lines.push(format!("Location: {location}"));
    }
    lines.push(format!(
        "Stars: {}   Upvotes: {}",
        issue.watchers.len(),
        issue.upvotes.len()
    ));
    lines.push(format!(
        "Created: {}   Modified: {}",
        dates.format(&issue.created_at),
        dates.format(&issue.modified_at)
    ));

    if !issue.description.is_empty() {
        lines.push(String::new());
        lines.push("DESCRIPTION".to_string());
        lines.push(issue.description.clone());
    }

    if !detailed.comments.is_empty() {
        lines.push(String::new());
        lines.push(format!("COMMENTS ({})", detailed.comments.len()));
        for comment in &detailed.comments {
            lines.push(render_muted(&format!(
                "#{} {} at {}",
                comment.id,
                display_name(users, comment.author_id),
                dates.format(&comment.created_at)
            )));
            lines.push(format!("  {}", comment.content));
        }
    }

    lines.join("\n")
}

/// One line per notification; unread ones are marked with `*`.
pub fn format_notification(notification: &SessionNotification, dates: UserDateFormat) -> String {
    let marker = if notification.is_read { " " } else { "*" };
    format!(
        "{} [{}] {}  {}",
        marker,
        notification.id,
        notification.display_text(),
        render_muted(&dates.format(&notification.created_at))
    )
}
