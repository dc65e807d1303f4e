//! [`ClientApi`] over HTTP with a blocking `ureq` agent.

use std::time::Duration;

use bootrack_core::comment::Comment;
use bootrack_core::enums::{RankBy, Toggle};
use bootrack_core::issue::{Issue, IssueDetailed, IssueSummarized, Location};
use bootrack_core::notification::{Notification, SessionNotification};
use bootrack_core::project::Project;
use bootrack_core::user::User;
use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::Agent;

use crate::api::{ClientApi, CursorPage, IssueFilter};
use crate::error::{ClientError, ErrorEnvelope, Result, optional};

/// Response header carrying the next cursor token.
pub const NEXT_CURSOR_HEADER: &str = "Bootrack-Next-Cursor";

type Response = ureq::http::Response<ureq::Body>;

/// Talks to a bootrack server at `base_url`.
#[derive(Debug, Clone)]
pub struct HttpClient {
    agent: Agent,
    base_url: String,
}

impl HttpClient {
    /// Creates a client whose requests give up after `timeout`.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(timeout))
            .http_status_as_error(false)
            .build();
        let base_url = base_url.into().trim_end_matches('/').to_string();
        debug!(%base_url, ?timeout, "http client created");
        Self {
            agent: Agent::new_with_config(config),
            base_url,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn issue_url(&self, project_id: i32, number: i64) -> String {
        self.url(&format!("/projects/{project_id}/issues/{number}"))
    }

    fn issues_url(&self, project_id: i32, suffix: &str) -> String {
        self.url(&format!("/projects/{project_id}/issues{suffix}"))
    }
}

/// Passes 2xx responses through; anything else becomes a [`ClientError`].
fn checked(mut response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let envelope = response.body_mut().read_json::<ErrorEnvelope>().ok();
    let err = ClientError::from_status(status.as_u16(), envelope);
    debug!(status = status.as_u16(), %err, "request failed");
    Err(err)
}

fn json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let mut response = checked(response)?;
    Ok(response.body_mut().read_json::<T>()?)
}

/// `true` on success, `false` on 404.
fn found(response: Response) -> Result<bool> {
    match checked(response) {
        Ok(_) => Ok(true),
        Err(err) if err.is_not_found() => Ok(false),
        Err(err) => Err(err),
    }
}

impl ClientApi for HttpClient {
    fn get_projects(&self) -> Result<Vec<Project>> {
        json(self.agent.get(self.url("/projects")).call()?)
    }

    fn add_project(&self, project: &Project) -> Result<Project> {
        json(self.agent.post(self.url("/projects")).send_json(project)?)
    }

    fn get_users(&self) -> Result<Vec<User>> {
        json(self.agent.get(self.url("/users")).call()?)
    }

    fn get_user(&self, id: i32) -> Result<Option<User>> {
        optional(json(self.agent.get(self.url(&format!("/users/{id}"))).call()?))
    }

    fn add_user(&self, user: &User) -> Result<User> {
        json(self.agent.post(self.url("/users")).send_json(user)?)
    }

    fn edit_user(&self, user: &User) -> Result<User> {
        json(
            self.agent
                .put(self.url(&format!("/users/{}", user.id)))
                .send_json(user)?,
        )
    }

    fn list_issues(&self, project_id: i32, limit: u32, offset: u32) -> Result<Vec<IssueSummarized>> {
        // A single-row page is answered with the detailed issue.
        if limit == 1 {
            let single = self.issue_at(project_id, offset)?;
            return Ok(single.map(|d| d.summarize(false)).into_iter().collect());
        }
        json(
            self.agent
                .get(self.issues_url(project_id, ""))
                .query("limit", limit.to_string())
                .query("offset", offset.to_string())
                .call()?,
        )
    }

    fn issue_at(&self, project_id: i32, offset: u32) -> Result<Option<IssueDetailed>> {
        optional(json(
            self.agent
                .get(self.issues_url(project_id, ""))
                .query("limit", "1")
                .query("offset", offset.to_string())
                .call()?,
        ))
    }

    fn next_batch(&self, project_id: i32, cursor: Option<&str>, size: u32) -> Result<CursorPage> {
        let start = format!("{project_id}:0");
        let response = self
            .agent
            .get(self.issues_url(project_id, ""))
            .query("offset", "-1")
            .query("limit", size.to_string())
            .query("cursor", cursor.unwrap_or(&start))
            .call()?;
        let mut response = checked(response)?;
        let next = response
            .headers()
            .get(NEXT_CURSOR_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let items = response.body_mut().read_json::<Vec<IssueSummarized>>()?;
        Ok(CursorPage { items, next })
    }

    fn count_issues(&self, project_id: i32, search_text: Option<&str>, hide_resolved: bool) -> Result<i64> {
        let mut request = self
            .agent
            .get(self.issues_url(project_id, "/count"))
            .query("hideResolved", hide_resolved.to_string());
        if let Some(text) = search_text {
            request = request.query("searchText", text);
        }
        json(request.call()?)
    }

    fn filter_issues(&self, filter: &IssueFilter) -> Result<Vec<IssueSummarized>> {
        if filter.search_text.trim().is_empty() {
            return Err(ClientError::invalid_argument("search text must not be blank"));
        }
        json(
            self.agent
                .get(self.issues_url(filter.project_id, ""))
                .query("searchText", &filter.search_text)
                .query("hideResolved", filter.hide_resolved.to_string())
                .query("sortBy", filter.sort_by.as_str())
                .query("limit", filter.limit.to_string())
                .query("offset", filter.offset.to_string())
                .call()?,
        )
    }

    fn rank_issues(&self, project_id: i32, metric: RankBy) -> Result<Vec<Vec<IssueSummarized>>> {
        json(
            self.agent
                .get(self.issues_url(project_id, "/rank"))
                .query("orderBy", metric.as_str())
                .call()?,
        )
    }

    fn issues_near(&self, project_id: i32, target: Location, max_km: f64) -> Result<Vec<IssueSummarized>> {
        json(
            self.agent
                .get(self.issues_url(project_id, "/distance"))
                .query("latitude", target.latitude.to_string())
                .query("longitude", target.longitude.to_string())
                .query("maxDistance", max_km.to_string())
                .call()?,
        )
    }

    fn get_issue(&self, project_id: i32, number: i64) -> Result<Option<IssueDetailed>> {
        optional(json(self.agent.get(self.issue_url(project_id, number)).call()?))
    }

    fn add_issue(&self, issue: &Issue) -> Result<Issue> {
        json(
            self.agent
                .post(self.issues_url(issue.project_id, ""))
                .send_json(issue)?,
        )
    }

    fn edit_issue(&self, project_id: i32, issue: &Issue) -> Result<Issue> {
        json(
            self.agent
                .put(self.issue_url(project_id, issue.number))
                .send_json(issue)?,
        )
    }

    fn toggle_issue(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue> {
        json(
            self.agent
                .put(self.issue_url(issue.project_id, issue.number))
                .query("userId", user_id.to_string())
                .query("toggle", toggle.as_str())
                .send_json(issue)?,
        )
    }

    fn delete_issue(&self, project_id: i32, number: i64) -> Result<bool> {
        found(self.agent.delete(self.issue_url(project_id, number)).call()?)
    }

    fn add_comment(&self, comment: &Comment) -> Result<Comment> {
        let url = format!("{}/comments", self.issue_url(comment.project_id, comment.issue_number));
        json(self.agent.post(url).send_json(comment)?)
    }

    fn edit_comment(&self, comment: &Comment) -> Result<Comment> {
        let url = format!(
            "{}/comments/{}",
            self.issue_url(comment.project_id, comment.issue_number),
            comment.id
        );
        json(self.agent.put(url).send_json(comment)?)
    }

    fn delete_comment(&self, comment: &Comment) -> Result<bool> {
        let url = format!(
            "{}/comments/{}",
            self.issue_url(comment.project_id, comment.issue_number),
            comment.id
        );
        found(self.agent.delete(url).call()?)
    }

    fn get_notifications(&self, user_id: i32) -> Result<Vec<SessionNotification>> {
        json(
            self.agent
                .get(self.url(&format!("/notifications/{user_id}")))
                .call()?,
        )
    }

    fn add_notifications(&self, batch: &[Notification]) -> Result<Vec<Notification>> {
        json(self.agent.post(self.url("/notifications")).send_json(batch)?)
    }

    fn edit_notification(&self, id: i64, is_read: bool) -> Result<bool> {
        found(
            self.agent
                .put(self.url(&format!("/notifications/{id}")))
                .send_json(serde_json::json!({ "isRead": is_read }))?,
        )
    }

    fn sync_notifications(&self) -> Result<()> {
        checked(self.agent.get(self.url("/notifications/sync")).call()?)?;
        Ok(())
    }
}
