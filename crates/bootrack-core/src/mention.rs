//! `@username` extraction from comment content.

use std::sync::LazyLock;

use regex::Regex;

static MENTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"@[\w.]+").unwrap_or_else(|e| panic!("invalid mention pattern: {e}"))
});

/// Returns each distinct username mentioned in `content`, in order of first
/// appearance.
///
/// A trailing `.` is treated as sentence punctuation, not part of the name.
pub fn parse_mentions(content: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for m in MENTION_RE.find_iter(content) {
        let name = m.as_str()[1..].trim_end_matches('.');
        if name.is_empty() || names.iter().any(|n| n == name) {
            continue;
        }
        names.push(name.to_string());
    }
    names
}
