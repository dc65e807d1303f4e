//! Mutations that keep every cache consistent with the server.
//!
//! Each operation makes its network call first. Only after it succeeds are
//! the pure functions from [`crate::updates`] applied to the affected
//! caches, so a failed call leaves every cache exactly as it was.
//! Notification fan-out is a separate call made after the caches are
//! updated; its failure is logged and does not undo the mutation.

use bootrack_core::change::FieldChange;
use bootrack_core::comment::Comment;
use bootrack_core::enums::{NotificationType, Toggle};
use bootrack_core::issue::{Issue, IssueDetailed, insert_member};
use bootrack_core::notification::{Notification, SessionNotification};
use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};
use chrono::Utc;
use tracing::{debug, warn};

use crate::api::ClientApi;
use crate::cache::AppCache;
use crate::error::Result;
use crate::store::Store;
use crate::updates::{self, Placement};

/// Default number of issues per list page.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// The search currently driving the summary list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCondition {
    pub search_text: String,
    pub hide_resolved: bool,
}

/// Drives a [`ClientApi`] on behalf of one user and owns the caches it feeds.
#[derive(Debug)]
pub struct Synchronizer<C> {
    pub(crate) api: C,
    pub(crate) cache: AppCache,
    pub(crate) user: Store<User>,
    pub(crate) project: Store<Option<Project>>,
    pub(crate) search: Store<Option<SearchCondition>>,
    pub(crate) page_size: u32,
}

impl<C: ClientApi> Synchronizer<C> {
    /// Creates a synchronizer acting as `user`, with empty caches.
    pub fn new(api: C, user: User) -> Self {
        Self {
            api,
            cache: AppCache::new(),
            user: Store::new(user),
            project: Store::default(),
            search: Store::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn api(&self) -> &C {
        &self.api
    }

    pub fn cache(&self) -> &AppCache {
        &self.cache
    }

    pub fn current_user(&self) -> User {
        self.user.get()
    }

    /// Project whose issues fill the summary list, once one is loaded.
    pub fn current_project(&self) -> Option<Project> {
        self.project.get()
    }

    pub fn search_condition(&self) -> Option<SearchCondition> {
        self.search.get()
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    // -----------------------------------------------------------------------
    // Issues
    // -----------------------------------------------------------------------

    /// Stores a new issue authored by the current user.
    ///
    /// An issue created in the loaded project goes to the top of the list;
    /// one created elsewhere switches the list to its project.
    pub fn create_issue(&self, mut issue: Issue) -> Result<Issue> {
        let me = self.current_user();
        issue.author_id = me.id;
        if me.settings.star_on_issue_create {
            insert_member(&mut issue.watchers, me.id);
        }
        if let Some(assignee) = issue.assignee_id {
            self.star_for_assignee(&mut issue, assignee);
        }

        let created = self.api.add_issue(&issue)?;
        let detailed = IssueDetailed {
            issue: created.clone(),
            comments: Vec::new(),
        };

        let in_view = self
            .current_project()
            .is_none_or(|p| p.id == created.project_id);
        if in_view {
            self.cache
                .summaries
                .mutate(|old| updates::prepend_summary(old, created.summarize(0, true)));
            self.cache.issue_count.mutate(|n| n + 1);
        } else if let Some(project) = self.cache.find_project(created.project_id) {
            self.load_project(&project)?;
        }
        self.cache
            .detailed
            .mutate(|old| updates::upsert_detailed(old, detailed.clone()));
        debug!(code = %created.code, "issue created");
        Ok(created)
    }

    /// Applies one typed change to `current` and saves it.
    pub fn update_issue(&self, current: &Issue, change: FieldChange) -> Result<Issue> {
        self.edit_issue(current, [change])
    }

    /// Applies `changes` to `current` and saves the result as a full edit.
    ///
    /// The issue moves to the top of the summary list and of its ranked
    /// group, and its watchers are told it was updated (or closed). When no
    /// change alters the issue nothing is sent.
    pub fn edit_issue(
        &self,
        current: &Issue,
        changes: impl IntoIterator<Item = FieldChange>,
    ) -> Result<Issue> {
        let me = self.current_user();
        let mut edited = current.clone();
        let mut changed = false;
        let mut closes = false;
        let mut assigned = None;
        for change in changes {
            closes |= edited.closes(&change);
            if let FieldChange::Assignee(Some(id)) = change {
                assigned = Some(id);
            }
            changed |= edited.apply_change(change);
        }
        if !changed {
            return Ok(current.clone());
        }

        if me.settings.star_on_issue_update {
            insert_member(&mut edited.watchers, me.id);
        }
        if let Some(assignee) = assigned.filter(|&a| current.assignee_id != Some(a)) {
            self.star_for_assignee(&mut edited, assignee);
        }
        if closes && me.settings.unstar_on_issue_close {
            edited.watchers.retain(|&w| w != me.id);
        }

        let updated = self.api.edit_issue(current.project_id, &edited)?;
        self.apply_full_edit(&current.code, &updated);

        let kind = if closes {
            NotificationType::ClosedIssue
        } else {
            NotificationType::UpdatedIssue
        };
        self.notify_watchers(kind, &updated);
        Ok(updated)
    }

    fn apply_full_edit(&self, old_code: &str, updated: &Issue) {
        let stays_in_view = self
            .current_project()
            .is_none_or(|p| p.id == updated.project_id);
        if stays_in_view {
            self.cache.summaries.mutate(|old| {
                updates::replace_summary_issue(old, old_code, updated, Placement::Front)
            });
            self.cache.ranked.mutate(|old| {
                updates::replace_ranked_issue(old, old_code, updated, Placement::Front)
            });
        } else {
            let was_listed = self.cache.find_summary(old_code).is_some();
            self.cache
                .summaries
                .mutate(|old| updates::remove_summary(old, old_code));
            self.cache
                .ranked
                .mutate(|old| updates::remove_ranked(old, old_code));
            if was_listed {
                self.cache.issue_count.mutate(|n| (n - 1).max(0));
            }
        }
        self.cache
            .detailed
            .mutate(|old| updates::replace_detailed_issue(old, old_code, updated));
    }

    /// Adds or removes the current user from the chosen set.
    ///
    /// A silent update: cached copies are replaced where they sit and no
    /// one is notified.
    pub fn toggle(&self, issue: &Issue, toggle: Toggle) -> Result<Issue> {
        let me = self.current_user();
        let mut payload = issue.clone();
        let adds_upvote = toggle == Toggle::Upvotes && !issue.upvotes.contains(&me.id);
        if adds_upvote && me.settings.star_on_issue_upvote {
            insert_member(&mut payload.watchers, me.id);
        }

        let updated = self.api.toggle_issue(&payload, me.id, toggle)?;
        self.cache.summaries.mutate(|old| {
            updates::replace_summary_issue(old, &issue.code, &updated, Placement::InPlace)
        });
        self.cache.ranked.mutate(|old| {
            updates::replace_ranked_issue(old, &issue.code, &updated, Placement::InPlace)
        });
        self.cache
            .detailed
            .mutate(|old| updates::replace_detailed_issue(old, &issue.code, &updated));
        Ok(updated)
    }

    /// Deletes the issue and drops it from every cache.
    ///
    /// Returns `false`, leaving the caches alone, when the server had no
    /// such issue.
    pub fn delete_issue(&self, issue: &Issue) -> Result<bool> {
        if !self.api.delete_issue(issue.project_id, issue.number)? {
            return Ok(false);
        }
        let code = issue.code.as_str();
        self.cache
            .summaries
            .mutate(|old| updates::remove_summary(old, code));
        self.cache
            .ranked
            .mutate(|old| updates::remove_ranked(old, code));
        self.cache
            .detailed
            .mutate(|old| updates::remove_detailed(old, code));
        self.cache.issue_count.mutate(|n| (n - 1).max(0));
        debug!(%code, "issue deleted");
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Comments
    // -----------------------------------------------------------------------

    /// Posts a comment as the current user.
    ///
    /// The parent issue gains a comment and moves to the top; its watchers
    /// and every `@mentioned` user are notified.
    pub fn add_comment(&self, mut comment: Comment) -> Result<Comment> {
        comment.author_id = self.current_user().id;
        let created = self.api.add_comment(&comment)?;

        let parent = self.cached_issue(created.project_id, created.issue_number);
        let code = self.issue_code(created.project_id, created.issue_number);
        if let Some(code) = code.as_deref() {
            self.cache
                .detailed
                .mutate(|old| updates::append_comment(old, code, &created));
            self.cache.summaries.mutate(|old| {
                updates::adjust_comment_count(old, code, 1, created.modified_at)
            });
            self.cache.ranked.mutate(|old| {
                updates::adjust_ranked_comments(old, code, 1, created.modified_at)
            });
        }

        if let Some(mut parent) = parent {
            parent.modified_at = created.modified_at;
            self.notify_watchers(NotificationType::CommentedOnIssue, &parent);
        }
        self.notify_mentions(&created, code.as_deref().unwrap_or_default());
        Ok(created)
    }

    /// Replaces a comment's content. The parent's place in lists is kept.
    pub fn edit_comment(&self, comment: &Comment) -> Result<Comment> {
        let updated = self.api.edit_comment(comment)?;
        self.cache
            .detailed
            .mutate(|old| updates::replace_comment(old, &updated));
        Ok(updated)
    }

    /// Deletes a comment; its issue loses one comment and moves to the top.
    pub fn delete_comment(&self, comment: &Comment) -> Result<bool> {
        if !self.api.delete_comment(comment)? {
            return Ok(false);
        }
        let now = Utc::now();
        self.cache
            .detailed
            .mutate(|old| updates::remove_comment(old, comment.id, now));
        if let Some(code) = self.issue_code(comment.project_id, comment.issue_number) {
            self.cache
                .summaries
                .mutate(|old| updates::adjust_comment_count(old, &code, -1, now));
            self.cache
                .ranked
                .mutate(|old| updates::adjust_ranked_comments(old, &code, -1, now));
        }
        Ok(true)
    }

    // -----------------------------------------------------------------------
    // Users
    // -----------------------------------------------------------------------

    /// Saves new settings for the current user.
    pub fn edit_user_settings(&self, settings: UserSettings) -> Result<User> {
        let mut user = self.current_user();
        user.settings = settings;
        let saved = self.api.edit_user(&user)?;
        self.cache
            .users
            .mutate(|old| updates::replace_user(old, &saved));
        self.user.set(saved.clone());
        Ok(saved)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Freshest cached copy of an issue: detailed first, then summaries.
    fn cached_issue(&self, project_id: i32, number: i64) -> Option<Issue> {
        let matches = |issue: &Issue| issue.project_id == project_id && issue.number == number;
        self.cache
            .detailed
            .with(|list| list.iter().find(|d| matches(&d.issue)).map(|d| d.issue.clone()))
            .or_else(|| {
                self.cache.summaries.with(|list| {
                    list.iter()
                        .find(|s| matches(&s.issue))
                        .map(|s| s.issue.clone())
                })
            })
    }

    pub(crate) fn issue_code(&self, project_id: i32, number: i64) -> Option<String> {
        self.cached_issue(project_id, number)
            .map(|issue| issue.code)
            .or_else(|| {
                self.cache
                    .find_project(project_id)
                    .map(|p| p.issue_code(number))
            })
    }

    /// Stars the issue for `assignee` when their settings ask for it.
    fn star_for_assignee(&self, issue: &mut Issue, assignee: i32) {
        let wants_star = if assignee == self.current_user().id {
            self.current_user().settings.star_on_issue_assigned
        } else {
            self.cache
                .find_user(assignee)
                .is_some_and(|u| u.settings.star_on_issue_assigned)
        };
        if wants_star {
            insert_member(&mut issue.watchers, assignee);
        }
    }

    // -----------------------------------------------------------------------
    // Notification fan-out
    // -----------------------------------------------------------------------

    fn notify_watchers(&self, kind: NotificationType, issue: &Issue) {
        let me = self.current_user();
        let batch: Vec<Notification> = issue
            .watchers
            .iter()
            .copied()
            .filter(|&w| w != me.id || me.settings.notify_on_self_changes)
            .map(|w| Notification::about(kind, issue, me.id, w))
            .collect();
        self.send(kind, &issue.code, batch);
    }

    fn notify_mentions(&self, comment: &Comment, issue_code: &str) {
        let me = self.current_user();
        let mut receivers: Vec<i32> = Vec::new();
        for username in comment.mentions() {
            let Some(user) = self.cache.find_user_by_username(&username) else {
                debug!(%username, "mention of unknown user ignored");
                continue;
            };
            if !user.settings.notify_on_mention {
                continue;
            }
            if user.id == me.id && !me.settings.notify_on_self_changes {
                continue;
            }
            insert_member(&mut receivers, user.id);
        }

        let kind = NotificationType::Mentioned;
        let batch = receivers
            .into_iter()
            .map(|receiver_id| Notification {
                id: 0,
                notification_type_id: kind.id(),
                receiver_id,
                sender_id: me.id,
                issue_number: comment.issue_number,
                project_id: comment.project_id,
                created_at: Utc::now(),
            })
            .collect();
        self.send(kind, issue_code, batch);
    }

    /// Stores `batch`; notifications the current user sent to themselves go
    /// straight to the top of the notifications cache.
    fn send(&self, kind: NotificationType, issue_code: &str, batch: Vec<Notification>) {
        if batch.is_empty() {
            return;
        }
        let created = match self.api.add_notifications(&batch) {
            Ok(created) => created,
            Err(err) => {
                warn!(%err, kind = ?kind, %issue_code, "notification fan-out failed");
                return;
            }
        };
        debug!(kind = ?kind, %issue_code, count = created.len(), "notifications sent");

        let me = self.current_user();
        let own: Vec<SessionNotification> = created
            .iter()
            .filter(|n| n.sender_id == n.receiver_id && n.receiver_id == me.id)
            .map(|n| SessionNotification {
                id: n.id,
                receiver_id: n.receiver_id,
                message: kind.message().to_string(),
                sender_name: me.full_name.clone(),
                sender_avatar: me.settings.avatar_icon,
                sender_avatar_tint: me.settings.avatar_tint,
                issue_code: issue_code.to_string(),
                created_at: n.created_at,
                is_read: false,
            })
            .collect();
        if !own.is_empty() {
            self.cache
                .notifications
                .mutate(|old| updates::prepend_notifications(old, own));
        }
    }
}
