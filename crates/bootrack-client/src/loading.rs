//! Read paths that (re)fill the caches from the server.

use bootrack_core::enums::RankBy;
use bootrack_core::issue::{IssueDetailed, IssueSummarized};
use bootrack_core::notification::SessionNotification;
use bootrack_core::project::Project;
use tracing::debug;

use crate::api::{ClientApi, IssueFilter};
use crate::error::{ClientError, Result};
use crate::sync::{SearchCondition, Synchronizer};
use crate::updates;

impl<C: ClientApi> Synchronizer<C> {
    /// Loads users, projects and the current user's notifications, then the
    /// first page of the user's default project.
    pub fn load_initial(&self) -> Result<()> {
        let users = self.api.get_users()?;
        let projects = self.api.get_projects()?;
        let me = self.current_user();
        let notifications = self.api.get_notifications(me.id)?;

        self.cache.users.set(users);
        self.cache.projects.set(projects);
        self.cache.notifications.set(notifications);

        let default = me.settings.default_project;
        let project = self.cache.find_project(default.id).unwrap_or(default);
        self.load_project(&project)?;
        Ok(())
    }

    /// Switches the list to `project`: its issue count and first page.
    pub fn load_project(&self, project: &Project) -> Result<i64> {
        let count = self.api.count_issues(project.id, None, false)?;
        let first = if count == 0 {
            Vec::new()
        } else {
            self.api.list_issues(project.id, self.page_size, 0)?
        };

        self.cache.clear_issues();
        self.cache.summaries.set(first);
        self.cache.issue_count.set(count);
        self.project.set(Some(project.clone()));
        self.search.set(None);
        debug!(project = %project.code, count, "project loaded");
        Ok(count)
    }

    /// Replaces the list with page `page_index` (1-based) of the current
    /// listing, re-running the active search if there is one.
    pub fn load_page(&self, page_index: u32) -> Result<Vec<IssueSummarized>> {
        let offset = page_index.saturating_sub(1).saturating_mul(self.page_size);
        let page = self.fetch_page(offset)?;
        self.cache.summaries.set(page.clone());
        Ok(page)
    }

    /// Appends the next page to the list; returns how many were added.
    pub fn load_more(&self) -> Result<usize> {
        let offset = self.cache.summaries.with(|list| list.len()) as u32;
        let more = self.fetch_page(offset)?;
        let added = more.len();
        self.cache.summaries.mutate(|old| {
            let mut next = old.clone();
            next.extend(more);
            next
        });
        Ok(added)
    }

    /// `true` while the list holds fewer issues than the listing behind it.
    pub fn can_load_more(&self) -> bool {
        let loaded = self.cache.summaries.with(|list| list.len()) as i64;
        loaded < self.cache.issue_count.get()
    }

    /// Number of pages of the current listing.
    pub fn page_count(&self) -> i64 {
        let size = i64::from(self.page_size);
        (self.cache.issue_count.get() + size - 1) / size
    }

    fn fetch_page(&self, offset: u32) -> Result<Vec<IssueSummarized>> {
        let project = self.require_project()?;
        match self.search.get() {
            Some(search) => self.api.filter_issues(&IssueFilter {
                project_id: project.id,
                search_text: search.search_text,
                hide_resolved: search.hide_resolved,
                sort_by: self.current_user().settings.default_sort.into(),
                limit: self.page_size,
                offset,
            }),
            None => self.api.list_issues(project.id, self.page_size, offset),
        }
    }

    fn require_project(&self) -> Result<Project> {
        self.current_project()
            .ok_or_else(|| ClientError::invalid_argument("no project loaded"))
    }

    /// Scans the whole project with cursor batches of `batch_size` and puts
    /// every issue in the list.
    pub fn prefetch_all(&self, project_id: i32, batch_size: u32) -> Result<usize> {
        let mut all = Vec::new();
        let mut cursor: Option<String> = None;
        loop {
            let page = self
                .api
                .next_batch(project_id, cursor.as_deref(), batch_size.max(1))?;
            debug!(project_id, batch = page.items.len(), "prefetched batch");
            all.extend(page.items);
            match page.next {
                Some(next) => cursor = Some(next),
                None => break,
            }
        }

        let total = all.len();
        self.cache.summaries.set(all);
        self.cache.issue_count.set(total as i64);
        Ok(total)
    }

    /// Full-text search in `project`; returns the number of matches.
    ///
    /// Blank search text clears any search and reloads the project.
    pub fn filter(&self, project: &Project, search_text: &str, hide_resolved: bool) -> Result<i64> {
        let search_text = search_text.trim();
        if search_text.is_empty() {
            return self.load_project(project);
        }

        let count = self
            .api
            .count_issues(project.id, Some(search_text), hide_resolved)?;
        let found = if count == 0 {
            Vec::new()
        } else {
            self.api.filter_issues(&IssueFilter {
                project_id: project.id,
                search_text: search_text.to_string(),
                hide_resolved,
                sort_by: self.current_user().settings.default_sort.into(),
                limit: self.page_size,
                offset: 0,
            })?
        };

        self.cache.clear_issues();
        self.cache.summaries.set(found);
        self.cache.issue_count.set(count);
        self.project.set(Some(project.clone()));
        self.search.set(Some(SearchCondition {
            search_text: search_text.to_string(),
            hide_resolved,
        }));
        Ok(count)
    }

    /// Top issues per priority. Fills the ranked cache and shows the groups
    /// flattened in the list.
    pub fn rank(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>> {
        let groups = self.api.rank_issues(project_id, metric)?;
        let flat: Vec<IssueSummarized> = groups.iter().flatten().cloned().collect();

        self.cache.detailed.set(Vec::new());
        self.cache.issue_count.set(flat.len() as i64);
        self.cache.summaries.set(flat);
        self.cache.ranked.set(groups.clone());
        Ok(groups)
    }

    /// Unresolved issues within the current user's travel distance.
    pub fn near(&self, project_id: i32) -> Result<Vec<IssueSummarized>> {
        let settings = self.current_user().settings;
        let nearby = self.api.issues_near(
            project_id,
            settings.location,
            f64::from(settings.max_travel_distance),
        )?;

        self.cache.detailed.set(Vec::new());
        self.cache.issue_count.set(nearby.len() as i64);
        self.cache.summaries.set(nearby.clone());
        Ok(nearby)
    }

    /// Details of the issue with `code` (e.g. `"GHST-101"`), from the cache
    /// when already loaded.
    pub fn show_issue(&self, code: &str) -> Result<IssueDetailed> {
        if let Some(cached) = self.cache.find_detailed(code) {
            return Ok(cached);
        }
        let (project_code, number) = code
            .rsplit_once('-')
            .ok_or_else(|| ClientError::invalid_argument(format!("malformed issue code {code:?}")))?;
        let number: i64 = number
            .parse()
            .map_err(|_| ClientError::invalid_argument(format!("malformed issue code {code:?}")))?;
        let project = self
            .cache
            .find_project_by_code(project_code)
            .ok_or_else(|| ClientError::NotFound(format!("project {project_code}")))?;

        let detailed = self
            .api
            .get_issue(project.id, number)?
            .ok_or_else(|| ClientError::NotFound(format!("issue {code}")))?;
        self.cache
            .detailed
            .mutate(|old| updates::upsert_detailed(old, detailed.clone()));
        Ok(detailed)
    }

    /// Details of the issue at absolute position `position` (0 = newest).
    pub fn show_issue_at(&self, project_id: i32, position: u32) -> Result<Option<IssueDetailed>> {
        let Some(detailed) = self.api.issue_at(project_id, position)? else {
            return Ok(None);
        };
        self.cache
            .detailed
            .mutate(|old| updates::upsert_detailed(old, detailed.clone()));
        Ok(Some(detailed))
    }

    /// Refreshes the current user's session notifications.
    pub fn load_notifications(&self) -> Result<Vec<SessionNotification>> {
        let session = self.api.get_notifications(self.current_user().id)?;
        self.cache.notifications.set(session.clone());
        Ok(session)
    }

    /// Sets the read flag of one session notification.
    pub fn mark_notification(&self, id: i64, is_read: bool) -> Result<bool> {
        if !self.api.edit_notification(id, is_read)? {
            return Ok(false);
        }
        self.cache
            .notifications
            .mutate(|old| updates::mark_notification(old, id, is_read));
        Ok(true)
    }

    /// Ends the notification session on the server and empties the cache.
    pub fn sync_notifications(&self) -> Result<()> {
        self.api.sync_notifications()?;
        self.cache.notifications.set(Vec::new());
        Ok(())
    }
}
