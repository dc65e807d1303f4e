//! Storage traits: the public API for issue persistence.
//!
//! [`QueryBackend`] is the narrow capability a database must offer to run the
//! listing, search and ranking queries. The shared query logic in
//! [`crate::query`] is written once against it. The repository traits below
//! are what servers and tools depend on.

use bootrack_core::comment::Comment;
use bootrack_core::enums::{RankBy, SortBy, Toggle};
use bootrack_core::issue::{Issue, IssueDetailed, IssueSummarized, Location};
use bootrack_core::notification::{Notification, SessionNotification};
use bootrack_core::predicate::Predicate;
use bootrack_core::project::Project;
use bootrack_core::query::{DEFAULT_RANK_CUTOFF, IssueQuery, Page, RankQuery};
use bootrack_core::user::User;

use crate::cursor::{BatchPage, BatchToken};
use crate::error::Result;

// ---------------------------------------------------------------------------
// View / helper types
// ---------------------------------------------------------------------------

/// Knobs that differ between deployments of the same query logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuerySettings {
    /// Issues kept per priority group by the ranker.
    pub rank_cutoff: u32,
    /// Whether list summaries carry the issue location.
    pub summary_includes_location: bool,
}

impl Default for QuerySettings {
    fn default() -> Self {
        Self {
            rank_cutoff: DEFAULT_RANK_CUTOFF,
            summary_includes_location: false,
        }
    }
}

/// Result of [`IssueStore::list_issues`].
#[derive(Debug, Clone, PartialEq)]
pub enum Listing {
    Summaries(Vec<IssueSummarized>),
    /// `limit == 1` with an offset selects one issue by position.
    Detailed(Option<IssueDetailed>),
}

/// Arguments of a full-text search within a project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFilter {
    pub project_id: i32,
    /// Free text; tokenized into an OR match query.
    pub search_text: String,
    pub hide_resolved: bool,
    pub sort_by: SortBy,
    pub page: Page,
}

impl SearchFilter {
    pub fn new(project_id: i32, search_text: impl Into<String>) -> Self {
        Self {
            project_id,
            search_text: search_text.into(),
            hide_resolved: false,
            sort_by: SortBy::default(),
            page: Page::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Query capability
// ---------------------------------------------------------------------------

/// What a database must be able to run for the shared query logic.
pub trait QueryBackend {
    /// Settings the shared logic should honour.
    fn settings(&self) -> QuerySettings;

    /// Issue summaries (with comment counts) matching the query, in order,
    /// paginated.
    fn select_summaries(&self, query: &IssueQuery) -> Result<Vec<IssueSummarized>>;

    /// Number of issues matching the predicate.
    fn count_matching(&self, predicate: &Predicate) -> Result<i64>;

    /// Flat top-N-per-priority list: rows whose dense rank within their
    /// priority partition is within the cutoff.
    fn select_ranked(&self, query: &RankQuery) -> Result<Vec<IssueSummarized>>;

    /// The `offset`-th most recently modified issue matching the predicate,
    /// with its comments.
    fn select_detailed(&self, predicate: &Predicate, offset: u32) -> Result<Option<IssueDetailed>>;
}

// ---------------------------------------------------------------------------
// Repositories
// ---------------------------------------------------------------------------

/// Issue queries and commands.
pub trait IssueStore: Send + Sync {
    // -- Queries -------------------------------------------------------------

    /// Project listing ordered by `modifiedAt DESC`.
    fn list_issues(&self, project_id: i32, page: Page) -> Result<Listing>;

    /// Full-text search.
    fn filter_issues(&self, filter: &SearchFilter) -> Result<Vec<IssueSummarized>>;

    /// Number of issues a search (or, without text, the project) matches.
    fn count_filtered_issues(
        &self,
        project_id: i32,
        search_text: Option<&str>,
        hide_resolved: bool,
    ) -> Result<i64>;

    /// Top unresolved issues per priority, groups in priority order.
    fn rank_issues(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>>;

    /// One batch of a project scan.
    fn next_batch(&self, token: &BatchToken, size: u32) -> Result<BatchPage>;

    fn get_issue(&self, number: i64, project_id: i32) -> Result<Option<IssueDetailed>>;

    /// The issue at absolute position `offset` in the default ordering.
    fn get_issue_at(&self, project_id: i32, offset: u32) -> Result<Option<IssueDetailed>>;

    fn count_issues_in_project(&self, project_id: i32) -> Result<i64>;

    /// Unresolved issues within `max_km` of `target`.
    fn filter_issues_by_distance(
        &self,
        project_id: i32,
        target: Location,
        max_km: f64,
    ) -> Result<Vec<IssueSummarized>>;

    // -- Commands ------------------------------------------------------------

    /// Stores a new issue under the project's next number.
    fn add_issue(&self, issue: &Issue) -> Result<Issue>;

    /// Replaces the editable fields of an existing issue.
    fn edit_issue(&self, issue: &Issue) -> Result<Issue>;

    /// Add-or-remove `user_id` in the set chosen by `toggle`, inserting the
    /// issue first if it does not exist.
    fn toggle_issue(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue>;

    /// Full edit of the issue stored under `project_id`. When
    /// `issue.project_id` differs, the issue (with its comments) moves to that
    /// project under a fresh number in the same transaction as the edit.
    fn edit_issue_from(&self, project_id: i32, issue: &Issue) -> Result<Issue>;

    fn delete_issue(&self, number: i64, project_id: i32) -> Result<bool>;
}

/// Comment commands.
pub trait CommentStore: Send + Sync {
    fn add_comment(&self, comment: &Comment) -> Result<Comment>;

    /// Updates the content of an existing comment.
    fn edit_comment(&self, comment: &Comment) -> Result<Comment>;

    /// Returns `false` if no such comment existed.
    fn delete_comment(&self, id: i64) -> Result<bool>;
}

/// Permanent notification log and the per-session view of it.
pub trait NotificationStore: Send + Sync {
    fn add_notifications(&self, notifications: &[Notification]) -> Result<Vec<Notification>>;

    /// Loads the receiver's notifications into the session view and returns
    /// it, newest first.
    fn get_notifications_by_receiver(&self, user_id: i32) -> Result<Vec<SessionNotification>>;

    fn edit_notification(&self, id: i64, is_read: bool) -> Result<bool>;

    /// Reconciles the session view into the permanent log and clears it.
    fn sync_notifications(&self) -> Result<()>;
}

/// Users and projects.
pub trait DirectoryStore: Send + Sync {
    fn get_all_users(&self) -> Result<Vec<User>>;

    fn get_user(&self, id: i32) -> Result<Option<User>>;

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    fn add_user(&self, user: &User) -> Result<User>;

    fn edit_user(&self, user: &User) -> Result<bool>;

    fn get_all_projects(&self) -> Result<Vec<Project>>;

    fn get_project(&self, id: i32) -> Result<Option<Project>>;

    fn add_project(&self, project: &Project) -> Result<Project>;
}

/// Everything a server needs from a store.
pub trait Repository: IssueStore + CommentStore + NotificationStore + DirectoryStore {}

impl<T> Repository for T where T: IssueStore + CommentStore + NotificationStore + DirectoryStore {}
