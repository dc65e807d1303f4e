//! Issue struct -- the central domain model -- and its list/detail projections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::comment::Comment;
use crate::enums::{IssuePriority, IssueState, Toggle};

/// A geographic point in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.latitude, self.longitude)
    }
}

/// Represents a trackable issue within a project.
///
/// The composite key is `(number, project_id)`. `code` is generated by the
/// store as `{project code}-{number}` and is never written by callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    // ===== Identification =====
    #[serde(default)]
    pub number: i64,
    pub project_id: i32,
    #[serde(default)]
    pub code: String,

    // ===== People =====
    pub author_id: i32,
    #[serde(default)]
    pub assignee_id: Option<i32>,

    // ===== Content =====
    pub title: String,
    #[serde(default)]
    pub description: String,

    // ===== Workflow =====
    #[serde(default)]
    pub priority: IssuePriority,
    #[serde(default)]
    pub state: IssueState,
    #[serde(default)]
    pub location: Option<Location>,

    // ===== User-id sets (no duplicates) =====
    #[serde(default)]
    pub watchers: Vec<i32>,
    #[serde(default)]
    pub upvotes: Vec<i32>,

    // ===== Timestamps =====
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl Default for Issue {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            number: 0,
            project_id: 0,
            code: String::new(),
            author_id: 0,
            assignee_id: None,
            title: String::new(),
            description: String::new(),
            priority: IssuePriority::default(),
            state: IssueState::default(),
            location: None,
            watchers: Vec::new(),
            upvotes: Vec::new(),
            created_at: now,
            modified_at: now,
        }
    }
}

impl Issue {
    /// Project code prefix of the generated `code` (`"GHST"` for `"GHST-101"`).
    pub fn project_code(&self) -> &str {
        self.code.split('-').next().unwrap_or_default()
    }

    /// Returns `true` if the issue is in the resolved state.
    pub fn is_resolved(&self) -> bool {
        self.state.is_resolved()
    }

    /// Applies an add-or-remove of `user_id` to the set chosen by `toggle`.
    ///
    /// Applying the same toggle twice restores the original set.
    pub fn toggle(&mut self, toggle: Toggle, user_id: i32) {
        let set = match toggle {
            Toggle::Stars => &mut self.watchers,
            Toggle::Upvotes => &mut self.upvotes,
        };
        toggle_member(set, user_id);
    }

    /// Removes duplicate ids from both user sets, keeping first occurrences.
    pub fn dedup_sets(&mut self) {
        dedup_preserving_order(&mut self.watchers);
        dedup_preserving_order(&mut self.upvotes);
    }

    /// Builds the lightweight list projection.
    ///
    /// The description is always dropped; the location only when
    /// `include_location` is false.
    pub fn summarize(&self, comment_count: i64, include_location: bool) -> IssueSummarized {
        let mut issue = self.clone();
        issue.description.clear();
        if !include_location {
            issue.location = None;
        }
        IssueSummarized {
            issue,
            comment_count,
        }
    }
}

/// Add-or-remove a member of a set stored as a `Vec`.
pub fn toggle_member(set: &mut Vec<i32>, id: i32) {
    if let Some(pos) = set.iter().position(|&m| m == id) {
        set.remove(pos);
    } else {
        set.push(id);
    }
}

/// Adds `id` if absent.
pub fn insert_member(set: &mut Vec<i32>, id: i32) {
    if !set.contains(&id) {
        set.push(id);
    }
}

fn dedup_preserving_order(set: &mut Vec<i32>) {
    let mut seen = Vec::with_capacity(set.len());
    set.retain(|id| {
        if seen.contains(id) {
            false
        } else {
            seen.push(*id);
            true
        }
    });
}

/// List projection: an issue without its heavy fields, plus its comment count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueSummarized {
    pub issue: Issue,
    pub comment_count: i64,
}

/// Detail projection: the full issue with its comments, oldest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueDetailed {
    pub issue: Issue,
    pub comments: Vec<Comment>,
}

impl IssueDetailed {
    /// Converts to the list projection, counting the loaded comments.
    pub fn summarize(&self, include_location: bool) -> IssueSummarized {
        self.issue
            .summarize(self.comments.len() as i64, include_location)
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Fluent builder for [`Issue`], mostly used by tests and the CLI.
#[derive(Debug, Clone)]
pub struct IssueBuilder {
    issue: Issue,
}

impl IssueBuilder {
    /// Creates a builder for an issue in `project_id` authored by `author_id`.
    pub fn new(project_id: i32, author_id: i32, title: impl Into<String>) -> Self {
        Self {
            issue: Issue {
                project_id,
                author_id,
                title: title.into(),
                ..Issue::default()
            },
        }
    }

    pub fn number(mut self, number: i64) -> Self {
        self.issue.number = number;
        self
    }

    pub fn code(mut self, code: impl Into<String>) -> Self {
        self.issue.code = code.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.issue.description = description.into();
        self
    }

    pub fn priority(mut self, priority: IssuePriority) -> Self {
        self.issue.priority = priority;
        self
    }

    pub fn state(mut self, state: IssueState) -> Self {
        self.issue.state = state;
        self
    }

    pub fn assignee(mut self, assignee_id: i32) -> Self {
        self.issue.assignee_id = Some(assignee_id);
        self
    }

    pub fn location(mut self, location: Location) -> Self {
        self.issue.location = Some(location);
        self
    }

    pub fn watchers(mut self, watchers: impl IntoIterator<Item = i32>) -> Self {
        self.issue.watchers = watchers.into_iter().collect();
        self
    }

    pub fn upvotes(mut self, upvotes: impl IntoIterator<Item = i32>) -> Self {
        self.issue.upvotes = upvotes.into_iter().collect();
        self
    }

    /// Consumes the builder and returns the constructed [`Issue`].
    pub fn build(mut self) -> Issue {
        self.issue.dedup_sets();
        self.issue
    }
}
