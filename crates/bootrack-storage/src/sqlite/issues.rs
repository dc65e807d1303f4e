//! Issue commands and row mapping for [`SqliteStore`].

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::debug;

use bootrack_core::enums::Toggle;
use bootrack_core::issue::{Issue, Location, toggle_member};
use bootrack_core::validation::validate_issue;

use crate::error::{Result, StorageError};
use crate::sqlite::directory::get_project_on_conn;
use crate::sqlite::store::SqliteStore;

// ---------------------------------------------------------------------------
// Column lists
// ---------------------------------------------------------------------------

/// Issue columns for full rows. `code` is derived from the project code.
/// Expects `issues AS i` joined to `projects AS p`.
pub(crate) const ISSUE_COLUMNS: &str = r#"
    i.id, i.number, i.project_id, p.code || '-' || i.number AS code,
    i.author_id, i.assignee_id, i.title, i.description, i.priority, i.state,
    i.latitude, i.longitude, i.watchers, i.upvotes, i.created_at, i.modified_at
"#;

// ---------------------------------------------------------------------------
// Row scanning
// ---------------------------------------------------------------------------

/// Deserialises a row selected with [`ISSUE_COLUMNS`] (or the summary
/// variant) into an [`Issue`].
pub(crate) fn scan_issue(row: &Row<'_>) -> rusqlite::Result<Issue> {
    let priority: String = row.get("priority")?;
    let state: String = row.get("state")?;
    let latitude: Option<f64> = row.get("latitude")?;
    let longitude: Option<f64> = row.get("longitude")?;
    let watchers: String = row.get("watchers")?;
    let upvotes: String = row.get("upvotes")?;

    Ok(Issue {
        number: row.get("number")?,
        project_id: row.get("project_id")?,
        code: row.get("code")?,
        author_id: row.get("author_id")?,
        assignee_id: row.get("assignee_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        priority: priority.parse().map_err(|e| conversion_error("priority", e))?,
        state: state.parse().map_err(|e| conversion_error("state", e))?,
        location: match (latitude, longitude) {
            (Some(lat), Some(lon)) => Some(Location::new(lat, lon)),
            _ => None,
        },
        watchers: serde_json::from_str(&watchers).map_err(|e| conversion_error("watchers", e))?,
        upvotes: serde_json::from_str(&upvotes).map_err(|e| conversion_error("upvotes", e))?,
        created_at: get_datetime(row, "created_at")?,
        modified_at: get_datetime(row, "modified_at")?,
    })
}

pub(crate) fn conversion_error(
    column: &'static str,
    err: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    debug!(column, %err, "undecodable issue column");
    rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(err))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Formats a `DateTime<Utc>` as ISO 8601 TEXT for SQLite.
pub(crate) fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

/// Parses an ISO 8601 TEXT string from SQLite into a `DateTime<Utc>`.
pub(crate) fn parse_datetime(s: &str) -> std::result::Result<DateTime<Utc>, chrono::ParseError> {
    s.parse::<DateTime<Utc>>().or_else(|_| {
        chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ")
            .or_else(|_| chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
            .map(|ndt| ndt.and_utc())
    })
}

/// Reads a timestamp column, failing the row on text that is not a timestamp.
pub(crate) fn get_datetime(row: &Row<'_>, column: &'static str) -> rusqlite::Result<DateTime<Utc>> {
    let text: String = row.get(column)?;
    parse_datetime(&text).map_err(|e| conversion_error(column, e))
}

/// Current time, truncated to the stored precision.
pub(crate) fn now_str() -> String {
    format_datetime(&Utc::now())
}

fn encode_set(set: &[i32]) -> Result<String> {
    Ok(serde_json::to_string(set)?)
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

pub(crate) fn get_issue_by_key_on_conn(
    conn: &Connection,
    number: i64,
    project_id: i32,
) -> Result<Option<Issue>> {
    let sql = format!(
        "SELECT {ISSUE_COLUMNS} FROM issues i JOIN projects p ON p.id = i.project_id
          WHERE i.project_id = ?1 AND i.number = ?2"
    );
    Ok(conn
        .query_row(&sql, params![project_id, number], scan_issue)
        .optional()?)
}

/// Re-reads a row the caller just wrote.
fn reread(conn: &Connection, number: i64, project_id: i32, action: &str) -> Result<Issue> {
    get_issue_by_key_on_conn(conn, number, project_id)?.ok_or_else(|| {
        StorageError::Invariant(format!(
            "issue {project_id}/{number} not returned after {action}"
        ))
    })
}

/// Reserves the next number in a project. The first number is 100.
///
/// With `at_least`, the sequence is moved past that number instead, for
/// callers that bring their own number.
pub(crate) fn reserve_number(conn: &Connection, project_id: i32, at_least: Option<i64>) -> Result<i64> {
    if get_project_on_conn(conn, project_id)?.is_none() {
        return Err(StorageError::not_found("project", project_id.to_string()));
    }
    let number = match at_least {
        None => conn.query_row(
            "INSERT INTO issue_sequences (project_id, next_number) VALUES (?1, 101)
             ON CONFLICT (project_id) DO UPDATE SET next_number = next_number + 1
             RETURNING next_number - 1",
            params![project_id],
            |row| row.get(0),
        )?,
        Some(n) => {
            conn.execute(
                "INSERT INTO issue_sequences (project_id, next_number) VALUES (?1, ?2)
                 ON CONFLICT (project_id) DO UPDATE
                 SET next_number = max(next_number, excluded.next_number)",
                params![project_id, n + 1],
            )?;
            n
        }
    };
    Ok(number)
}

/// Inserts `issue` under `number`, stamping both timestamps with now.
pub(crate) fn insert_issue_on_conn(conn: &Connection, issue: &Issue, number: i64) -> Result<Issue> {
    let now = now_str();
    conn.execute(
        "INSERT INTO issues (
            number, project_id, author_id, assignee_id, title, description,
            priority, state, latitude, longitude, watchers, upvotes,
            created_at, modified_at
         ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)",
        params![
            number,
            issue.project_id,
            issue.author_id,
            issue.assignee_id,
            issue.title,
            issue.description,
            issue.priority.as_str(),
            issue.state.as_str(),
            issue.location.map(|l| l.latitude),
            issue.location.map(|l| l.longitude),
            encode_set(&issue.watchers)?,
            encode_set(&issue.upvotes)?,
            now,
        ],
    )?;
    reread(conn, number, issue.project_id, "insert")
}

// ---------------------------------------------------------------------------
// SqliteStore issue commands
// ---------------------------------------------------------------------------

impl SqliteStore {
    /// Stores a new issue under the project's next number.
    pub fn add_issue_impl(&self, issue: &Issue) -> Result<Issue> {
        validate_issue(issue)?;
        let mut issue = issue.clone();
        issue.dedup_sets();
        self.with_transaction(|tx| {
            let number = reserve_number(tx, issue.project_id, None)?;
            let stored = insert_issue_on_conn(tx, &issue, number)?;
            debug!(code = %stored.code, "issue added");
            Ok(stored)
        })
    }

    /// Replaces the editable fields and stamps `modified_at`.
    pub fn edit_issue_impl(&self, issue: &Issue) -> Result<Issue> {
        self.edit_issue_from_impl(issue.project_id, issue)
    }

    /// Full edit of the issue stored at (`from_project_id`, `issue.number`).
    ///
    /// When `issue.project_id` names another project the issue moves there
    /// under that project's next number; comments and notifications follow
    /// through the cascading keys. Move and edit share one transaction.
    pub fn edit_issue_from_impl(&self, from_project_id: i32, issue: &Issue) -> Result<Issue> {
        validate_issue(issue)?;
        let mut issue = issue.clone();
        issue.dedup_sets();
        self.with_transaction(|tx| {
            if from_project_id != issue.project_id {
                issue.number = move_on_conn(tx, issue.number, from_project_id, issue.project_id)?;
                debug!(from_project_id, to = issue.project_id, number = issue.number, "issue moved");
            }
            update_fields_on_conn(tx, &issue)?;
            reread(tx, issue.number, issue.project_id, "edit")
        })
    }

    /// Upsert with add-or-remove semantics on one user-id set.
    ///
    /// An absent issue is inserted as given. An existing one has `user_id`
    /// flipped in the chosen set; an upvote toggle also takes the payload's
    /// watchers. `modified_at` is left alone.
    pub fn toggle_issue_impl(&self, issue: &Issue, user_id: i32, toggle: Toggle) -> Result<Issue> {
        self.with_transaction(|tx| {
            let Some(mut current) = get_issue_by_key_on_conn(tx, issue.number, issue.project_id)?
            else {
                validate_issue(issue)?;
                let mut fresh = issue.clone();
                fresh.dedup_sets();
                let requested = (fresh.number > 0).then_some(fresh.number);
                let number = reserve_number(tx, fresh.project_id, requested)?;
                debug!(number, "toggle inserted missing issue");
                return insert_issue_on_conn(tx, &fresh, number);
            };

            match toggle {
                Toggle::Stars => toggle_member(&mut current.watchers, user_id),
                Toggle::Upvotes => {
                    toggle_member(&mut current.upvotes, user_id);
                    current.watchers = issue.watchers.clone();
                    current.dedup_sets();
                }
            }
            tx.execute(
                "UPDATE issues SET watchers = ?1, upvotes = ?2
                  WHERE project_id = ?3 AND number = ?4",
                params![
                    encode_set(&current.watchers)?,
                    encode_set(&current.upvotes)?,
                    current.project_id,
                    current.number,
                ],
            )?;
            reread(tx, current.number, current.project_id, "toggle")
        })
    }

    /// Deletes an issue; comments and notifications cascade.
    pub fn delete_issue_impl(&self, number: i64, project_id: i32) -> Result<bool> {
        self.with_transaction(|tx| {
            let deleted = tx.execute(
                "DELETE FROM issues WHERE project_id = ?1 AND number = ?2",
                params![project_id, number],
            )?;
            Ok(deleted == 1)
        })
    }
}

/// Writes the editable fields of `issue` at its key and stamps `modified_at`.
fn update_fields_on_conn(conn: &Connection, issue: &Issue) -> Result<()> {
    let changed = conn.execute(
        "UPDATE issues
            SET assignee_id = ?1, title = ?2, description = ?3, priority = ?4,
                state = ?5, latitude = ?6, longitude = ?7, watchers = ?8,
                upvotes = ?9, modified_at = ?10
          WHERE project_id = ?11 AND number = ?12",
        params![
            issue.assignee_id,
            issue.title,
            issue.description,
            issue.priority.as_str(),
            issue.state.as_str(),
            issue.location.map(|l| l.latitude),
            issue.location.map(|l| l.longitude),
            encode_set(&issue.watchers)?,
            encode_set(&issue.upvotes)?,
            now_str(),
            issue.project_id,
            issue.number,
        ],
    )?;
    if changed == 0 {
        return Err(StorageError::not_found("issue", key_label(issue)));
    }
    Ok(())
}

/// Re-keys an issue into `to_project_id`; returns its new number.
fn move_on_conn(conn: &Connection, number: i64, project_id: i32, to_project_id: i32) -> Result<i64> {
    if get_issue_by_key_on_conn(conn, number, project_id)?.is_none() {
        return Err(StorageError::not_found("issue", format!("{project_id}/{number}")));
    }
    let new_number = reserve_number(conn, to_project_id, None)?;
    conn.execute(
        "UPDATE issues SET project_id = ?1, number = ?2
          WHERE project_id = ?3 AND number = ?4",
        params![to_project_id, new_number, project_id, number],
    )?;
    Ok(new_number)
}

fn key_label(issue: &Issue) -> String {
    if issue.code.is_empty() {
        format!("{}/{}", issue.project_id, issue.number)
    } else {
        issue.code.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bootrack_core::enums::{IssuePriority, IssueState};
    use bootrack_core::issue::IssueBuilder;
    use pretty_assertions::assert_eq;

    use crate::sqlite::test_support::seeded_store;

    #[test]
    fn add_assigns_numbers_from_100() {
        let (store, project, user) = seeded_store();
        let first = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "First").build())
            .unwrap();
        let second = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Second").build())
            .unwrap();

        assert_eq!(first.number, 100);
        assert_eq!(first.code, "GHST-100");
        assert_eq!(second.number, 101);
        assert_eq!(first.created_at, first.modified_at);
    }

    #[test]
    fn add_to_missing_project_is_not_found() {
        let (store, _, user) = seeded_store();
        let err = store
            .add_issue_impl(&IssueBuilder::new(77, user.id, "Lost").build())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn add_rejects_empty_title() {
        let (store, project, user) = seeded_store();
        let err = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "").build())
            .unwrap_err();
        assert!(err.is_client_error());
    }

    #[test]
    fn edit_replaces_fields_and_bumps_modified() {
        let (store, project, user) = seeded_store();
        let mut issue = store
            .add_issue_impl(
                &IssueBuilder::new(project.id, user.id, "Pothole")
                    .location(Location::new(51.5, -0.1))
                    .build(),
            )
            .unwrap();

        issue.title = "Pothole on Main St".into();
        issue.priority = IssuePriority::Major;
        issue.state = IssueState::InProgress;
        issue.assignee_id = Some(user.id);
        issue.location = None;
        std::thread::sleep(std::time::Duration::from_millis(5));
        let edited = store.edit_issue_impl(&issue).unwrap();

        assert_eq!(edited.title, "Pothole on Main St");
        assert_eq!(edited.priority, IssuePriority::Major);
        assert_eq!(edited.assignee_id, Some(user.id));
        assert_eq!(edited.location, None);
        assert!(edited.modified_at > issue.modified_at);
        assert_eq!(edited.created_at, issue.created_at);
    }

    #[test]
    fn edit_missing_issue_is_not_found() {
        let (store, project, user) = seeded_store();
        let ghost = IssueBuilder::new(project.id, user.id, "ghost").number(500).build();
        assert!(store.edit_issue_impl(&ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn toggle_upvote_twice_restores_set() {
        let (store, project, user) = seeded_store();
        let mut issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Login bug").build())
            .unwrap();
        issue.upvotes = vec![3, 7];
        let issue = store.edit_issue_impl(&issue).unwrap();

        let once = store.toggle_issue_impl(&issue, 7, Toggle::Upvotes).unwrap();
        assert_eq!(once.upvotes, vec![3]);
        assert_eq!(once.modified_at, issue.modified_at);

        let twice = store.toggle_issue_impl(&once, 7, Toggle::Upvotes).unwrap();
        assert_eq!(twice.upvotes, vec![3, 7]);
    }

    #[test]
    fn toggle_upvote_takes_payload_watchers() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Starred").build())
            .unwrap();

        let mut payload = issue.clone();
        payload.watchers = vec![user.id];
        let toggled = store.toggle_issue_impl(&payload, user.id, Toggle::Upvotes).unwrap();
        assert_eq!(toggled.upvotes, vec![user.id]);
        assert_eq!(toggled.watchers, vec![user.id]);

        let starred = store.toggle_issue_impl(&toggled, user.id, Toggle::Stars).unwrap();
        assert!(starred.watchers.is_empty());
        assert_eq!(starred.upvotes, vec![user.id]);
    }

    #[test]
    fn toggle_inserts_missing_issue() {
        let (store, project, user) = seeded_store();
        let payload = IssueBuilder::new(project.id, user.id, "Upserted")
            .number(250)
            .watchers([user.id])
            .build();
        let stored = store.toggle_issue_impl(&payload, user.id, Toggle::Stars).unwrap();
        assert_eq!(stored.number, 250);
        assert_eq!(stored.watchers, vec![user.id]);

        let next = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "After").build())
            .unwrap();
        assert_eq!(next.number, 251);
    }

    #[test]
    fn edit_with_new_project_renumbers_in_target() {
        let (store, project, user) = seeded_store();
        let other = store
            .add_project_impl(&bootrack_core::project::Project::new("Other", "OTHR").unwrap())
            .unwrap();
        let mut issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Wrong place").build())
            .unwrap();

        issue.project_id = other.id;
        issue.priority = IssuePriority::Major;
        let moved = store.edit_issue_from_impl(project.id, &issue).unwrap();
        assert_eq!(moved.project_id, other.id);
        assert_eq!(moved.code, "OTHR-100");
        assert_eq!(moved.priority, IssuePriority::Major);
        assert!(store.get_issue_impl(issue.number, project.id).unwrap().is_none());
    }

    #[test]
    fn rejected_edit_does_not_move_issue() {
        let (store, project, user) = seeded_store();
        let other = store
            .add_project_impl(&bootrack_core::project::Project::new("Other", "OTHR").unwrap())
            .unwrap();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Stay here").build())
            .unwrap();

        let mut blank = issue.clone();
        blank.project_id = other.id;
        blank.title = String::new();
        let err = store.edit_issue_from_impl(project.id, &blank).unwrap_err();
        assert!(err.is_client_error());

        let mut missing_target = issue.clone();
        missing_target.project_id = 77;
        let err = store.edit_issue_from_impl(project.id, &missing_target).unwrap_err();
        assert!(err.is_not_found());

        let kept = store.get_issue_impl(issue.number, project.id).unwrap().unwrap();
        assert_eq!(kept.issue.code, "GHST-100");
        assert!(store.get_issue_impl(100, other.id).unwrap().is_none());

        // The target's sequence was not consumed by the failed moves.
        let first = store
            .add_issue_impl(&IssueBuilder::new(other.id, user.id, "Fresh").build())
            .unwrap();
        assert_eq!(first.number, 100);
    }

    #[test]
    fn unreadable_timestamp_fails_the_read() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Clock skew").build())
            .unwrap();
        {
            let conn = store.lock_conn().unwrap();
            conn.execute(
                "UPDATE issues SET modified_at = 'not a time' WHERE project_id = ?1 AND number = ?2",
                params![project.id, issue.number],
            )
            .unwrap();
        }
        let err = store.get_issue_impl(issue.number, project.id).unwrap_err();
        assert!(!err.is_not_found());
        assert!(!err.is_client_error());
    }

    #[test]
    fn delete_reports_presence() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Bye").build())
            .unwrap();
        assert!(store.delete_issue_impl(issue.number, project.id).unwrap());
        assert!(!store.delete_issue_impl(issue.number, project.id).unwrap());
    }
}
