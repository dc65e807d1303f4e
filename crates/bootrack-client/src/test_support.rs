//! In-memory [`ClientApi`] for synchronizer tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};

use bootrack_core::comment::Comment;
use bootrack_core::enums::{IssuePriority, RankBy, Toggle};
use bootrack_core::issue::{Issue, IssueBuilder, IssueDetailed, IssueSummarized, Location};
use bootrack_core::notification::{Notification, SessionNotification};
use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};
use chrono::{Duration, Utc};

use crate::api::{ClientApi, CursorPage, IssueFilter};
use crate::error::{ClientError, Result};
use crate::sync::Synchronizer;

#[derive(Debug, Default)]
pub(crate) struct FakeApi {
    users: Mutex<Vec<User>>,
    projects: Mutex<Vec<Project>>,
    issues: Mutex<Vec<IssueDetailed>>,
    session: Mutex<Vec<SessionNotification>>,
    sent: Mutex<Vec<Notification>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    fail: AtomicBool,
    next_id: AtomicI64,
}

impl FakeApi {
    fn enter(&self, name: &'static str) -> Result<()> {
        *self.calls.lock().unwrap().entry(name).or_default() += 1;
        if self.fail.load(Ordering::SeqCst) {
            return Err(ClientError::Server {
                status: 500,
                message: "Internal server error".into(),
            });
        }
        Ok(())
    }

    fn id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn calls(&self, name: &str) -> usize {
        self.calls.lock().unwrap().get(name).copied().unwrap_or(0)
    }

    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    /// Overwrites the stored issue with the same key, bypassing the API.
    pub fn replace(&self, issue: &Issue) {
        let mut issues = self.issues.lock().unwrap();
        let slot = issues
            .iter_mut()
            .find(|d| d.issue.project_id == issue.project_id && d.issue.number == issue.number)
            .unwrap();
        slot.issue = issue.clone();
    }

    pub fn push_session(&self, receiver_id: i32, issue: &Issue) {
        let id = self.id();
        self.session.lock().unwrap().push(SessionNotification {
            id,
            receiver_id,
            message: " updated details in ".into(),
            sender_name: "Bob Bee".into(),
            sender_avatar: 0,
            sender_avatar_tint: 0,
            issue_code: issue.code.clone(),
            created_at: Utc::now(),
            is_read: false,
        });
    }

    fn project_code(&self, project_id: i32) -> String {
        self.projects
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == project_id)
            .map(|p| p.code.clone())
            .unwrap_or_default()
    }

    fn next_number(&self, project_id: i32) -> i64 {
        self.issues
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.issue.project_id == project_id)
            .map(|d| d.issue.number + 1)
            .max()
            .unwrap_or(100)
    }

    /// Project issues, newest first.
    fn sorted(&self, project_id: i32) -> Vec<IssueDetailed> {
        let mut list: Vec<IssueDetailed> = self
            .issues
            .lock()
            .unwrap()
            .iter()
            .filter(|d| d.issue.project_id == project_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| {
            b.issue
                .modified_at
                .cmp(&a.issue.modified_at)
                .then(b.issue.number.cmp(&a.issue.number))
        });
        list
    }

    fn matching(&self, project_id: i32, text: Option<&str>, hide_resolved: bool) -> Vec<IssueDetailed> {
        let terms: Vec<String> = text
            .unwrap_or_default()
            .split_whitespace()
            .map(str::to_lowercase)
            .collect();
        self.sorted(project_id)
            .into_iter()
            .filter(|d| !hide_resolved || !d.issue.is_resolved())
            .filter(|d| {
                terms.is_empty()
                    || terms
                        .iter()
                        .any(|t| d.issue.title.to_lowercase().contains(t.as_str()))
            })
            .collect()
    }

    fn with_issue<R>(&self, project_id: i32, number: i64, f: impl FnOnce(&mut IssueDetailed) -> R) -> Option<R> {
        let mut issues = self.issues.lock().unwrap();
        issues
            .iter_mut()
            .find(|d| d.issue.project_id == project_id && d.issue.number == number)
            .map(f)
    }
}

fn window<T: Clone>(list: &[T], limit: u32, offset: u32) -> Vec<T> {
    list.iter()
        .skip(offset as usize)
        .take(limit as usize)
        .cloned()
        .collect()
}

impl ClientApi for FakeApi {
    fn get_projects(&self) -> Result<Vec<Project>> {
        self.enter("get_projects")?;
        Ok(self.projects.lock().unwrap().clone())
    }

    fn add_project(&self, project: &Project) -> Result<Project> {
        self.enter("add_project")?;
        let mut saved = project.clone();
        saved.id = self.id() as i32;
        self.projects.lock().unwrap().push(saved.clone());
        Ok(saved)
    }

    fn get_users(&self) -> Result<Vec<User>> {
        self.enter("get_users")?;
        Ok(self.users.lock().unwrap().clone())
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        self.enter("get_user")?;
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    fn add_user(&self, user: &User) -> Result<User> {
        self.enter("add_user")?;
        self.users.lock().unwrap().push(user.clone());
        Ok(user.clone())
    }

    fn edit_user(&self, user: &User) -> Result<User> {
        self.enter("edit_user")?;
        let mut users = self.users.lock().unwrap();
        let slot = users
            .iter_mut()
            .find(|u| u.id == user.id)
            .ok_or_else(|| ClientError::NotFound(format!("user {}", user.id)))?;
        *slot = user.clone();
        Ok(user.clone())
    }

    fn list_issues(&self, project_id: i32, limit: u32, offset: u32) -> Result<Vec<IssueSummarized>> {
        self.enter("list_issues")?;
        let all: Vec<IssueSummarized> = self.sorted(project_id).iter().map(|d| d.summarize(false)).collect();
        Ok(window(&all, limit, offset))
    }

    fn issue_at(&self, project_id: i32, offset: u32) -> Result<Option<IssueDetailed>> {
        self.enter("issue_at")?;
        Ok(self.sorted(project_id).into_iter().nth(offset as usize))
    }

    fn next_batch(&self, project_id: i32, cursor: Option<&str>, size: u32) -> Result<CursorPage> {
        self.enter("next_batch")?;
        let offset: u32 = cursor
            .and_then(|c| c.split_once(':'))
            .and_then(|(_, o)| o.parse().ok())
            .unwrap_or(0);
        let all: Vec<IssueSummarized> = self.sorted(project_id).iter().map(|d| d.summarize(false)).collect();
        let items = window(&all, size, offset);
        let end = offset + items.len() as u32;
        let next = ((end as usize) < all.len()).then(|| format!("{project_id}:{end}"));
        Ok(CursorPage { items, next })
    }

    fn count_issues(&self, project_id: i32, search_text: Option<&str>, hide_resolved: bool) -> Result<i64> {
        self.enter("count_issues")?;
        Ok(self.matching(project_id, search_text, hide_resolved).len() as i64)
    }

    fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueSummarized>> {
        self.enter("filter_issues")?;
        let all: Vec<IssueSummarized> = self
            .matching(filter.project_id, Some(&filter.search_text), filter.hide_resolved)
            .iter()
            .map(|d| d.summarize(false))
            .collect();
        Ok(window(&all, filter.limit, filter.offset))
    }

    fn rank_issues(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>> {
        self.enter("rank_issues")?;
        let open = self.matching(project_id, None, true);
        let mut groups = Vec::new();
        for priority in [IssuePriority::Minor, IssuePriority::Normal, IssuePriority::Major] {
            let mut group: Vec<IssueSummarized> = open
                .iter()
                .filter(|d| d.issue.priority == priority)
                .map(|d| d.summarize(false))
                .collect();
            group.sort_by_key(|s| match metric {
                RankBy::Stars => -(s.issue.watchers.len() as i64),
                RankBy::Upvotes => -(s.issue.upvotes.len() as i64),
                RankBy::Open => s.issue.created_at.timestamp(),
            });
            group.truncate(3);
            if !group.is_empty() {
                groups.push(group);
            }
        }
        Ok(groups)
    }

    fn issues_near(&self, project_id: i32, target: Location, max_km: f64) -> Result<Vec<IssueSummarized>> {
        self.enter("issues_near")?;
        Ok(self
            .matching(project_id, None, true)
            .iter()
            .filter(|d| {
                d.issue
                    .location
                    .is_some_and(|l| bootrack_core::geo::within_km(l, target, max_km))
            })
            .map(|d| d.summarize(true))
            .collect())
    }

    fn get_issue(&self, project_id: i32, number: i64) -> Result<Option<IssueDetailed>> {
        self.enter("get_issue")?;
        Ok(self.with_issue(project_id, number, |d| d.clone()))
    }

    fn add_issue(&self, issue: &Issue) -> Result<Issue> {
        self.enter("add_issue")?;
        let mut stored = issue.clone();
        stored.number = self.next_number(issue.project_id);
        stored.code = format!("{}-{}", self.project_code(issue.project_id), stored.number);
        stored.created_at = Utc::now();
        stored.modified_at = stored.created_at;
        self.issues.lock().unwrap().push(IssueDetailed {
            issue: stored.clone(),
            comments: Vec::new(),
        });
        Ok(stored)
    }

    fn edit_issue(&self, project_id: i32, issue: &Issue) -> Result<Issue> {
        self.enter("edit_issue")?;
        let mut stored = issue.clone();
        if issue.project_id != project_id {
            stored.number = self.next_number(issue.project_id);
            stored.code = format!("{}-{}", self.project_code(issue.project_id), stored.number);
        }
        stored.modified_at = Utc::now();
        let saved = stored.clone();
        self.with_issue(project_id, issue.number, move |d| d.issue = stored)
            .ok_or_else(|| ClientError::NotFound(format!("issue {}", issue.code)))?;
        Ok(saved)
    }

    fn toggle_issue(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue> {
        self.enter("toggle_issue")?;
        let payload_watchers = issue.watchers.clone();
        self.with_issue(issue.project_id, issue.number, |d| {
            if toggle == Toggle::Upvotes {
                d.issue.watchers = payload_watchers;
            }
            d.issue.toggle(toggle, user_id);
            d.issue.clone()
        })
        .ok_or_else(|| ClientError::NotFound(format!("issue {}", issue.code)))
    }

    fn delete_issue(&self, project_id: i32, number: i64) -> Result<bool> {
        self.enter("delete_issue")?;
        let mut issues = self.issues.lock().unwrap();
        let before = issues.len();
        issues.retain(|d| !(d.issue.project_id == project_id && d.issue.number == number));
        Ok(issues.len() < before)
    }

    fn add_comment(&self, comment: &Comment) -> Result<Comment> {
        self.enter("add_comment")?;
        let mut stored = comment.clone();
        stored.id = self.id();
        stored.created_at = Utc::now();
        stored.modified_at = stored.created_at;
        let saved = stored.clone();
        self.with_issue(comment.project_id, comment.issue_number, move |d| {
            d.issue.modified_at = stored.created_at;
            d.comments.push(stored);
        })
        .ok_or_else(|| ClientError::NotFound("parent issue".into()))?;
        Ok(saved)
    }

    fn edit_comment(&self, comment: &Comment) -> Result<Comment> {
        self.enter("edit_comment")?;
        let mut stored = comment.clone();
        stored.modified_at = Utc::now();
        let saved = stored.clone();
        self.with_issue(comment.project_id, comment.issue_number, move |d| {
            if let Some(slot) = d.comments.iter_mut().find(|c| c.id == stored.id) {
                *slot = stored;
            }
        });
        Ok(saved)
    }

    fn delete_comment(&self, comment: &Comment) -> Result<bool> {
        self.enter("delete_comment")?;
        Ok(self
            .with_issue(comment.project_id, comment.issue_number, |d| {
                let before = d.comments.len();
                d.comments.retain(|c| c.id != comment.id);
                d.comments.len() < before
            })
            .unwrap_or(false))
    }

    fn get_notifications(&self, user_id: i32) -> Result<Vec<SessionNotification>> {
        self.enter("get_notifications")?;
        Ok(self
            .session
            .lock()
            .unwrap()
            .iter()
            .filter(|n| n.receiver_id == user_id)
            .cloned()
            .collect())
    }

    fn add_notifications(&self, batch: &[Notification]) -> Result<Vec<Notification>> {
        self.enter("add_notifications")?;
        let created: Vec<Notification> = batch
            .iter()
            .map(|n| Notification {
                id: self.id(),
                created_at: Utc::now(),
                ..n.clone()
            })
            .collect();
        self.sent.lock().unwrap().extend(created.iter().cloned());
        Ok(created)
    }

    fn edit_notification(&self, id: i64, is_read: bool) -> Result<bool> {
        self.enter("edit_notification")?;
        let mut session = self.session.lock().unwrap();
        match session.iter_mut().find(|n| n.id == id) {
            Some(n) => {
                n.is_read = is_read;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn sync_notifications(&self) -> Result<()> {
        self.enter("sync_notifications")?;
        self.session.lock().unwrap().clear();
        Ok(())
    }
}

/// Two projects and three users; Ann is the acting user.
pub(crate) struct Fixture {
    pub ghost: Project,
    pub loki: Project,
    pub ann: User,
    pub bob: User,
    pub cat: User,
}

fn user(id: i32, full_name: &str, username: &str, project: &Project) -> User {
    User {
        id,
        full_name: full_name.into(),
        username: username.into(),
        settings: UserSettings::defaults_for(project.clone()),
    }
}

impl Fixture {
    pub fn new() -> Self {
        let ghost = Project {
            id: 1,
            name: "Ghost".into(),
            code: "GHST".into(),
        };
        let loki = Project {
            id: 2,
            name: "Loki".into(),
            code: "LOKI".into(),
        };
        let ann = user(1, "Ann Example", "ann.a", &ghost);
        let bob = user(2, "Bob Bee", "bob.b", &ghost);
        let mut cat = user(3, "Cat Sea", "cat.c", &ghost);
        cat.settings.notify_on_mention = false;
        Self {
            ghost,
            loki,
            ann,
            bob,
            cat,
        }
    }

    /// A synchronizer acting as Ann over a fake seeded with this directory.
    pub fn synchronizer(&self) -> Synchronizer<FakeApi> {
        let api = FakeApi::default();
        *api.users.lock().unwrap() = vec![self.ann.clone(), self.bob.clone(), self.cat.clone()];
        *api.projects.lock().unwrap() = vec![self.ghost.clone(), self.loki.clone()];
        api.next_id.store(100, Ordering::SeqCst);
        Synchronizer::new(api, self.ann.clone())
    }

    /// Adds `n` Ghost issues titled "Issue 0".. with increasing `modifiedAt`,
    /// so the last one is the newest.
    pub fn seed_issues(&self, api: &FakeApi, n: usize) -> Vec<Issue> {
        let base = Utc::now() - Duration::hours(1);
        (0..n)
            .map(|i| {
                let mut issue = api
                    .add_issue(&IssueBuilder::new(self.ghost.id, self.bob.id, format!("Issue {i}")).build())
                    .unwrap();
                issue.modified_at = base + Duration::seconds(i as i64);
                issue.created_at = issue.modified_at;
                api.replace(&issue);
                issue
            })
            .collect()
    }
}
