//! The client-side view of the HTTP surface.

use bootrack_core::comment::Comment;
use bootrack_core::enums::{RankBy, SortBy, Toggle};
use bootrack_core::issue::{Issue, IssueDetailed, IssueSummarized, Location};
use bootrack_core::notification::{Notification, SessionNotification};
use bootrack_core::project::Project;
use bootrack_core::user::User;

use crate::error::Result;

/// A full-text search request for one project.
#[derive(Debug, Clone, PartialEq)]
pub struct IssueFilter {
    pub project_id: i32,
    /// Raw user input; the server tokenizes it.
    pub search_text: String,
    pub hide_resolved: bool,
    pub sort_by: SortBy,
    pub limit: u32,
    pub offset: u32,
}

/// One cursor batch and the token for the next, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct CursorPage {
    pub items: Vec<IssueSummarized>,
    pub next: Option<String>,
}

/// Every server operation the client and the synchronizer rely on.
///
/// Reads that can miss return `Ok(None)`; deletes report whether anything
/// was removed. Implemented over HTTP by [`HttpClient`](crate::HttpClient).
pub trait ClientApi: Send + Sync {
    // -- Directory ------------------------------------------------------------

    fn get_projects(&self) -> Result<Vec<Project>>;

    fn add_project(&self, project: &Project) -> Result<Project>;

    fn get_users(&self) -> Result<Vec<User>>;

    fn get_user(&self, id: i32) -> Result<Option<User>>;

    fn add_user(&self, user: &User) -> Result<User>;

    fn edit_user(&self, user: &User) -> Result<User>;

    // -- Issue queries ----------------------------------------------------------

    /// One offset page, newest first.
    fn list_issues(&self, project_id: i32, limit: u32, offset: u32) -> Result<Vec<IssueSummarized>>;

    /// The issue at absolute position `offset` (newest first), with comments.
    fn issue_at(&self, project_id: i32, offset: u32) -> Result<Option<IssueDetailed>>;

    /// A cursor batch. `cursor == None` starts a new scan of the project.
    fn next_batch(&self, project_id: i32, cursor: Option<&str>, size: u32) -> Result<CursorPage>;

    fn count_issues(&self, project_id: i32, search_text: Option<&str>, hide_resolved: bool) -> Result<i64>;

    fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueSummarized>>;

    fn rank_issues(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>>;

    fn issues_near(&self, project_id: i32, target: Location, max_km: f64) -> Result<Vec<IssueSummarized>>;

    fn get_issue(&self, project_id: i32, number: i64) -> Result<Option<IssueDetailed>>;

    // -- Issue commands ---------------------------------------------------------

    fn add_issue(&self, issue: &Issue) -> Result<Issue>;

    /// Full edit of the issue currently stored under `(project_id, issue.number)`.
    /// A different `issue.project_id` moves it.
    fn edit_issue(&self, project_id: i32, issue: &Issue) -> Result<Issue>;

    fn toggle_issue(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue>;

    fn delete_issue(&self, project_id: i32, number: i64) -> Result<bool>;

    // -- Comments ---------------------------------------------------------------

    fn add_comment(&self, comment: &Comment) -> Result<Comment>;

    fn edit_comment(&self, comment: &Comment) -> Result<Comment>;

    fn delete_comment(&self, comment: &Comment) -> Result<bool>;

    // -- Notifications ----------------------------------------------------------

    fn get_notifications(&self, user_id: i32) -> Result<Vec<SessionNotification>>;

    fn add_notifications(&self, batch: &[Notification]) -> Result<Vec<Notification>>;

    fn edit_notification(&self, id: i64, is_read: bool) -> Result<bool>;

    fn sync_notifications(&self) -> Result<()>;
}

/// Lets callers pick a backend at runtime (`Box<dyn ClientApi>`).
impl<T: ClientApi + ?Sized> ClientApi for Box<T> {
    fn get_projects(&self) -> Result<Vec<Project>> {
        (**self).get_projects()
    }

    fn add_project(&self, project: &Project) -> Result<Project> {
        (**self).add_project(project)
    }

    fn get_users(&self) -> Result<Vec<User>> {
        (**self).get_users()
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        (**self).get_user(id)
    }

    fn add_user(&self, user: &User) -> Result<User> {
        (**self).add_user(user)
    }

    fn edit_user(&self, user: &User) -> Result<User> {
        (**self).edit_user(user)
    }

    fn list_issues(&self, project_id: i32, limit: u32, offset: u32) -> Result<Vec<IssueSummarized>> {
        (**self).list_issues(project_id, limit, offset)
    }

    fn issue_at(&self, project_id: i32, offset: u32) -> Result<Option<IssueDetailed>> {
        (**self).issue_at(project_id, offset)
    }

    fn next_batch(&self, project_id: i32, cursor: Option<&str>, size: u32) -> Result<CursorPage> {
        (**self).next_batch(project_id, cursor, size)
    }

    fn count_issues(&self, project_id: i32, search_text: Option<&str>, hide_resolved: bool) -> Result<i64> {
        (**self).count_issues(project_id, search_text, hide_resolved)
    }

    fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueSummarized>> {
        (**self).filter_issues(filter)
    }

    fn rank_issues(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>> {
        (**self).rank_issues(project_id, metric)
    }

    fn issues_near(&self, project_id: i32, target: Location, max_km: f64) -> Result<Vec<IssueSummarized>> {
        (**self).issues_near(project_id, target, max_km)
    }

    fn get_issue(&self, project_id: i32, number: i64) -> Result<Option<IssueDetailed>> {
        (**self).get_issue(project_id, number)
    }

    fn add_issue(&self, issue: &Issue) -> Result<Issue> {
        (**self).add_issue(issue)
    }

    fn edit_issue(&self, project_id: i32, issue: &Issue) -> Result<Issue> {
        (**self).edit_issue(project_id, issue)
    }

    fn toggle_issue(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue> {
        (**self).toggle_issue(issue, user_id, toggle)
    }

    fn delete_issue(&self, project_id: i32, number: i64) -> Result<bool> {
        (**self).delete_issue(project_id, number)
    }

    fn add_comment(&self, comment: &Comment) -> Result<Comment> {
        (**self).add_comment(comment)
    }

    fn edit_comment(&self, comment: &Comment) -> Result<Comment> {
        (**self).edit_comment(comment)
    }

    fn delete_comment(&self, comment: &Comment) -> Result<bool> {
        (**self).delete_comment(comment)
    }

    fn get_notifications(&self, user_id: i32) -> Result<Vec<SessionNotification>> {
        (**self).get_notifications(user_id)
    }

    fn add_notifications(&self, batch: &[Notification]) -> Result<Vec<Notification>> {
        (**self).add_notifications(batch)
    }

    fn edit_notification(&self, id: i64, is_read: bool) -> Result<bool> {
        (**self).edit_notification(id, is_read)
    }

    fn sync_notifications(&self) -> Result<()> {
        (**self).sync_notifications()
    }
}
