//! Storage backend for bootrack.
//!
//! Provides the storage traits, the shared query logic in [`query`], the
//! batch [`cursor`], and a SQLite implementation ([`SqliteStore`]).

pub mod cursor;
pub mod error;
pub mod query;
pub mod sqlite;
pub mod traits;

// Re-exports for convenience.
pub use cursor::{BatchIterator, BatchPage, BatchToken};
pub use error::StorageError;
pub use sqlite::SqliteStore;
pub use traits::{
    CommentStore, DirectoryStore, IssueStore, Listing, NotificationStore, QueryBackend,
    QuerySettings, Repository, SearchFilter,
};

// ---------------------------------------------------------------------------
// Trait implementations for SqliteStore
// ---------------------------------------------------------------------------

use bootrack_core::comment::Comment;
use bootrack_core::enums::{RankBy, Toggle};
use bootrack_core::issue::{Issue, IssueDetailed, IssueSummarized, Location};
use bootrack_core::notification::{Notification, SessionNotification};
use bootrack_core::predicate::Predicate;
use bootrack_core::project::Project;
use bootrack_core::query::{IssueQuery, Page, RankQuery};
use bootrack_core::user::User;

use crate::error::Result;

impl QueryBackend for SqliteStore {
    fn settings(&self) -> QuerySettings {
        self.query_settings()
    }

    fn select_summaries(&self, query: &IssueQuery) -> Result<Vec<IssueSummarized>> {
        self.select_summaries_impl(query)
    }

    fn count_matching(&self, predicate: &Predicate) -> Result<i64> {
        self.count_matching_impl(predicate)
    }

    fn select_ranked(&self, query: &RankQuery) -> Result<Vec<IssueSummarized>> {
        self.select_ranked_impl(query)
    }

    fn select_detailed(&self, predicate: &Predicate, offset: u32) -> Result<Option<IssueDetailed>> {
        self.select_detailed_impl(predicate, offset)
    }
}

impl IssueStore for SqliteStore {
    fn list_issues(&self, project_id: i32, page: Page) -> Result<Listing> {
        query::list_issues(self, project_id, page)
    }

    fn filter_issues(&self, filter: &SearchFilter) -> Result<Vec<IssueSummarized>> {
        query::filter_issues(self, filter)
    }

    fn count_filtered_issues(
        &self,
        project_id: i32,
        search_text: Option<&str>,
        hide_resolved: bool,
    ) -> Result<i64> {
        query::count_filtered_issues(self, project_id, search_text, hide_resolved)
    }

    fn rank_issues(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>> {
        query::rank_issues(self, project_id, metric)
    }

    fn next_batch(&self, token: &BatchToken, size: u32) -> Result<BatchPage> {
        query::next_batch(self, token, size)
    }

    fn get_issue(&self, number: i64, project_id: i32) -> Result<Option<IssueDetailed>> {
        self.get_issue_impl(number, project_id)
    }

    fn get_issue_at(&self, project_id: i32, offset: u32) -> Result<Option<IssueDetailed>> {
        self.select_detailed_impl(&Predicate::project(project_id), offset)
    }

    fn count_issues_in_project(&self, project_id: i32) -> Result<i64> {
        self.count_matching_impl(&Predicate::project(project_id))
    }

    fn filter_issues_by_distance(
        &self,
        project_id: i32,
        target: Location,
        max_km: f64,
    ) -> Result<Vec<IssueSummarized>> {
        query::filter_issues_by_distance(self, project_id, target, max_km)
    }

    fn add_issue(&self, issue: &Issue) -> Result<Issue> {
        self.add_issue_impl(issue)
    }

    fn edit_issue(&self, issue: &Issue) -> Result<Issue> {
        self.edit_issue_impl(issue)
    }

    fn toggle_issue(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue> {
        self.toggle_issue_impl(issue, user_id, toggle)
    }

    fn edit_issue_from(&self, project_id: i32, issue: &Issue) -> Result<Issue> {
        self.edit_issue_from_impl(project_id, issue)
    }

    fn delete_issue(&self, number: i64, project_id: i32) -> Result<bool> {
        self.delete_issue_impl(number, project_id)
    }
}

impl CommentStore for SqliteStore {
    fn add_comment(&self, comment: &Comment) -> Result<Comment> {
        self.add_comment_impl(comment)
    }

    fn edit_comment(&self, comment: &Comment) -> Result<Comment> {
        self.edit_comment_impl(comment)
    }

    fn delete_comment(&self, id: i64) -> Result<bool> {
        self.delete_comment_impl(id)
    }
}

impl NotificationStore for SqliteStore {
    fn add_notifications(&self, notifications: &[Notification]) -> Result<Vec<Notification>> {
        self.add_notifications_impl(notifications)
    }

    fn get_notifications_by_receiver(&self, user_id: i32) -> Result<Vec<SessionNotification>> {
        self.get_notifications_by_receiver_impl(user_id)
    }

    fn edit_notification(&self, id: i64, is_read: bool) -> Result<bool> {
        self.edit_notification_impl(id, is_read)
    }

    fn sync_notifications(&self) -> Result<()> {
        self.sync_notifications_impl()
    }
}

impl DirectoryStore for SqliteStore {
    fn get_all_users(&self) -> Result<Vec<User>> {
        self.get_all_users_impl()
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.get_user_impl(id)
    }

    fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.find_user_by_username_impl(username)
    }

    fn add_user(&self, user: &User) -> Result<User> {
        self.add_user_impl(user)
    }

    fn edit_user(&self, user: &User) -> Result<bool> {
        self.edit_user_impl(user)
    }

    fn get_all_projects(&self) -> Result<Vec<Project>> {
        self.get_all_projects_impl()
    }

    fn get_project(&self, id: i32) -> Result<Option<Project>> {
        self.get_project_impl(id)
    }

    fn add_project(&self, project: &Project) -> Result<Project> {
        self.add_project_impl(project)
    }
}
