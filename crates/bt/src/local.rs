//! [`ClientApi`] over the local database, so every command runs through the
//! same [`Synchronizer`](bootrack_client::Synchronizer) whether or not a
//! server is involved.

use std::sync::Arc;

use bootrack_client::{ClientApi, ClientError, CursorPage, IssueFilter, Result};
use bootrack_core::comment::Comment;
use bootrack_core::enums::{RankBy, Toggle};
use bootrack_core::issue::{Issue, IssueDetailed, IssueSummarized, Location};
use bootrack_core::notification::{Notification, SessionNotification};
use bootrack_core::project::Project;
use bootrack_core::query::Page;
use bootrack_core::user::User;
use bootrack_storage::{BatchToken, Listing, Repository, SearchFilter, SqliteStore, StorageError};

pub struct LocalApi {
    repo: Arc<dyn Repository>,
    include_location: bool,
}

impl LocalApi {
    pub fn new(store: SqliteStore) -> Self {
        let include_location = store.query_settings().summary_includes_location;
        Self {
            repo: Arc::new(store),
            include_location,
        }
    }
}

/// Classifies storage failures the way the HTTP layer reports them.
fn client_error(err: StorageError) -> ClientError {
    if err.is_not_found() {
        ClientError::NotFound(err.to_string())
    } else if err.is_client_error() {
        ClientError::Rejected {
            status: 400,
            code: "invalid_request".to_string(),
            message: err.to_string(),
        }
    } else {
        ClientError::Server {
            status: 500,
            message: err.to_string(),
        }
    }
}

trait Local<T> {
    fn local(self) -> Result<T>;
}

impl<T> Local<T> for std::result::Result<T, StorageError> {
    fn local(self) -> Result<T> {
        self.map_err(client_error)
    }
}

impl ClientApi for LocalApi {
    fn get_projects(&self) -> Result<Vec<Project>> {
        self.repo.get_all_projects().local()
    }

    fn add_project(&self, project: &Project) -> Result<Project> {
        self.repo.add_project(project).local()
    }

    fn get_users(&self) -> Result<Vec<User>> {
        self.repo.get_all_users().local()
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.repo.get_user(id).local()
    }

    fn add_user(&self, user: &User) -> Result<User> {
        self.repo.add_user(user).local()
    }

    fn edit_user(&self, user: &User) -> Result<User> {
        if self.repo.edit_user(user).local()? {
            Ok(user.clone())
        } else {
            Err(ClientError::NotFound(format!("user not found: {}", user.id)))
        }
    }

    fn list_issues(&self, project_id: i32, limit: u32, offset: u32) -> Result<Vec<IssueSummarized>> {
        match self.repo.list_issues(project_id, Page::new(limit, offset)).local()? {
            Listing::Summaries(rows) => Ok(rows),
            Listing::Detailed(single) => Ok(single
                .map(|d| d.summarize(self.include_location))
                .into_iter()
                .collect()),
        }
    }

    fn issue_at(&self, project_id: i32, offset: u32) -> Result<Option<IssueDetailed>> {
        self.repo.get_issue_at(project_id, offset).local()
    }

    fn next_batch(&self, project_id: i32, cursor: Option<&str>, size: u32) -> Result<CursorPage> {
        let token = match cursor {
            Some(raw) => raw.parse::<BatchToken>().local()?,
            None => BatchToken::start(project_id),
        };
        if token.project_id != project_id {
            return Err(ClientError::invalid_argument(format!(
                "cursor {token} does not belong to project {project_id}"
            )));
        }
        let page = self.repo.next_batch(&token, size).local()?;
        Ok(CursorPage {
            items: page.items,
            next: page.next.map(|t| t.to_string()),
        })
    }

    fn count_issues(&self, project_id: i32, search_text: Option<&str>, hide_resolved: bool) -> Result<i64> {
        self.repo
            .count_filtered_issues(project_id, search_text, hide_resolved)
            .local()
    }

    fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueSummarized>> {
        if filter.search_text.trim().is_empty() {
            return Err(ClientError::invalid_argument("search text is empty"));
        }
        let mut search = SearchFilter::new(filter.project_id, filter.search_text.clone());
        search.hide_resolved = filter.hide_resolved;
        search.sort_by = filter.sort_by;
        search.page = Page::new(filter.limit, filter.offset);
        self.repo.filter_issues(&search).local()
    }

    fn rank_issues(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>> {
        self.repo.rank_issues(project_id, metric).local()
    }

    fn issues_near(&self, project_id: i32, target: Location, max_km: f64) -> Result<Vec<IssueSummarized>> {
        self.repo
            .filter_issues_by_distance(project_id, target, max_km)
            .local()
    }

    fn get_issue(&self, project_id: i32, number: i64) -> Result<Option<IssueDetailed>> {
        self.repo.get_issue(number, project_id).local()
    }

    fn add_issue(&self, issue: &Issue) -> Result<Issue> {
        self.repo.add_issue(issue).local()
    }

    fn edit_issue(&self, project_id: i32, issue: &Issue) -> Result<Issue> {
        self.repo.edit_issue_from(project_id, issue).local()
    }

    fn toggle_issue(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue> {
        self.repo.toggle_issue(issue, user_id, toggle).local()
    }

    fn delete_issue(&self, project_id: i32, number: i64) -> Result<bool> {
        self.repo.delete_issue(number, project_id).local()
    }

    fn add_comment(&self, comment: &Comment) -> Result<Comment> {
        self.repo.add_comment(comment).local()
    }

    fn edit_comment(&self, comment: &Comment) -> Result<Comment> {
        self.repo.edit_comment(comment).local()
    }

    fn delete_comment(&self, comment: &Comment) -> Result<bool> {
        self.repo.delete_comment(comment.id).local()
    }

    fn get_notifications(&self, user_id: i32) -> Result<Vec<SessionNotification>> {
        self.repo.get_notifications_by_receiver(user_id).local()
    }

    fn add_notifications(&self, batch: &[Notification]) -> Result<Vec<Notification>> {
        self.repo.add_notifications(batch).local()
    }

    fn edit_notification(&self, id: i64, is_read: bool) -> Result<bool> {
        self.repo.edit_notification(id, is_read).local()
    }

    fn sync_notifications(&self) -> Result<()> {
        self.repo.sync_notifications().local()
    }
}
