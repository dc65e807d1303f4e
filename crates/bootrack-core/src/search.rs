//! Caller-side tokenization of free search text into a full-text match query.

/// Turns `"login bug"` into `"login" OR "bug"`.
///
/// Terms are split on whitespace and each is quoted so that operator
/// characters in user input are matched literally. Returns `None` when the
/// input has no terms.
pub fn to_match_query(search_text: &str) -> Option<String> {
    let terms: Vec<String> = search_text
        .split_whitespace()
        .map(|term| format!("\"{}\"", term.replace('"', "\"\"")))
        .collect();
    if terms.is_empty() {
        None
    } else {
        Some(terms.join(" OR "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn joins_terms_with_or() {
        assert_eq!(
            to_match_query("  login   bug ").as_deref(),
            Some(r#""login" OR "bug""#)
        );
    }

    #[test]
    fn escapes_quotes() {
        assert_eq!(to_match_query(r#"say"hi"#).as_deref(), Some(r#""say""hi""#));
    }

    #[test]
    fn blank_is_none() {
        assert_eq!(to_match_query(""), None);
        assert_eq!(to_match_query(" \t"), None);
    }
}
