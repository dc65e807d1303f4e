//! Validation rules for user-supplied issues, comments and projects.

use crate::comment::Comment;
use crate::issue::{Issue, Location};

/// Longest accepted issue title, in characters.
pub const MAX_TITLE_LEN: usize = 500;

/// Error type for validation failures.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("title is required")]
    TitleRequired,

    #[error("title must be {MAX_TITLE_LEN} characters or less (got {0})")]
    TitleTooLong(usize),

    #[error("project code must be 3 to 5 characters (got {0:?})")]
    ProjectCodeLength(String),

    #[error("project name is required")]
    ProjectNameRequired,

    #[error("comment content is required")]
    ContentRequired,

    #[error("location out of range: {0}")]
    LocationOutOfRange(Location),

    #[error("username is required")]
    UsernameRequired,
}

/// Validates an issue before it is stored.
pub fn validate_issue(issue: &Issue) -> Result<(), ValidationError> {
    let title = issue.title.trim();
    if title.is_empty() {
        return Err(ValidationError::TitleRequired);
    }
    let len = title.chars().count();
    if len > MAX_TITLE_LEN {
        return Err(ValidationError::TitleTooLong(len));
    }
    if let Some(location) = issue.location {
        validate_location(location)?;
    }
    Ok(())
}

/// Validates a comment before it is stored.
pub fn validate_comment(comment: &Comment) -> Result<(), ValidationError> {
    if comment.content.trim().is_empty() {
        return Err(ValidationError::ContentRequired);
    }
    Ok(())
}

/// Project codes are 3 to 5 characters long.
pub fn validate_project_code(code: &str) -> Result<(), ValidationError> {
    if !(3..=5).contains(&code.chars().count()) {
        return Err(ValidationError::ProjectCodeLength(code.to_owned()));
    }
    Ok(())
}

pub fn validate_location(location: Location) -> Result<(), ValidationError> {
    let lat_ok = (-90.0..=90.0).contains(&location.latitude);
    let lon_ok = (-180.0..=180.0).contains(&location.longitude);
    if !(lat_ok && lon_ok) {
        return Err(ValidationError::LocationOutOfRange(location));
    }
    Ok(())
}
