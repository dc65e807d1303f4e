//! Client-side caches. None of these is authoritative; the server is.

use bootrack_core::issue::{IssueDetailed, IssueSummarized};
use bootrack_core::notification::SessionNotification;
use bootrack_core::project::Project;
use bootrack_core::user::User;

use crate::store::Store;

/// Every cache a client view can observe.
#[derive(Debug, Default)]
pub struct AppCache {
    pub users: Store<Vec<User>>,
    pub projects: Store<Vec<Project>>,
    /// The list currently on screen: a page, a search result, a flattened
    /// ranking, or the nearby issues.
    pub summaries: Store<Vec<IssueSummarized>>,
    /// Ranked groups in priority order.
    pub ranked: Store<Vec<Vec<IssueSummarized>>>,
    /// Issues opened in detail, most recently touched last.
    pub detailed: Store<Vec<IssueDetailed>>,
    pub notifications: Store<Vec<SessionNotification>>,
    /// Size of the full listing behind `summaries`.
    pub issue_count: Store<i64>,
}

impl AppCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn find_user(&self, id: i32) -> Option<User> {
        self.users.with(|users| users.iter().find(|u| u.id == id).cloned())
    }

    pub fn find_user_by_username(&self, username: &str) -> Option<User> {
        self.users
            .with(|users| users.iter().find(|u| u.username == username).cloned())
    }

    pub fn find_project(&self, id: i32) -> Option<Project> {
        self.projects
            .with(|projects| projects.iter().find(|p| p.id == id).cloned())
    }

    pub fn find_project_by_code(&self, code: &str) -> Option<Project> {
        self.projects
            .with(|projects| projects.iter().find(|p| p.code == code).cloned())
    }

    pub fn find_detailed(&self, code: &str) -> Option<IssueDetailed> {
        self.detailed
            .with(|list| list.iter().find(|d| d.issue.code == code).cloned())
    }

    pub fn find_summary(&self, code: &str) -> Option<IssueSummarized> {
        self.summaries
            .with(|list| list.iter().find(|s| s.issue.code == code).cloned())
    }

    pub fn has_unread_notifications(&self) -> bool {
        self.notifications.with(|list| list.iter().any(|n| !n.is_read))
    }

    /// Drops every issue-derived cache.
    pub fn clear_issues(&self) {
        self.summaries.set(Vec::new());
        self.ranked.set(Vec::new());
        self.detailed.set(Vec::new());
        self.issue_count.set(0);
    }
}
