//! Comment CRUD operations for [`SqliteStore`].
//!
//! Every comment change touches the parent issue's `modified_at`: adding
//! copies the comment's creation time, deleting stamps now, and content
//! edits go through the `comments_touch` trigger.

use rusqlite::{Connection, OptionalExtension, Row, params};

use bootrack_core::comment::Comment;
use bootrack_core::validation::validate_comment;

use crate::error::{Result, StorageError};
use crate::sqlite::issues::{get_datetime, get_issue_by_key_on_conn, now_str};
use crate::sqlite::store::SqliteStore;

const COMMENT_COLUMNS: &str =
    "id, issue_number, project_id, author_id, content, created_at, modified_at";

fn scan_comment(row: &Row<'_>) -> rusqlite::Result<Comment> {
    Ok(Comment {
        id: row.get("id")?,
        issue_number: row.get("issue_number")?,
        project_id: row.get("project_id")?,
        author_id: row.get("author_id")?,
        content: row.get("content")?,
        created_at: get_datetime(row, "created_at")?,
        modified_at: get_datetime(row, "modified_at")?,
    })
}

// ---------------------------------------------------------------------------
// Connection-level helpers
// ---------------------------------------------------------------------------

/// Comments of one issue, oldest first.
pub(crate) fn get_comments_on_conn(
    conn: &Connection,
    project_id: i32,
    issue_number: i64,
) -> Result<Vec<Comment>> {
    let sql = format!(
        "SELECT {COMMENT_COLUMNS} FROM comments
          WHERE project_id = ?1 AND issue_number = ?2
          ORDER BY created_at ASC, id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![project_id, issue_number], scan_comment)?;
    let mut comments = Vec::new();
    for row in rows {
        comments.push(row?);
    }
    Ok(comments)
}

fn get_comment_on_conn(conn: &Connection, id: i64) -> Result<Option<Comment>> {
    let sql = format!("SELECT {COMMENT_COLUMNS} FROM comments WHERE id = ?1");
    Ok(conn.query_row(&sql, params![id], scan_comment).optional()?)
}

fn touch_issue(conn: &Connection, project_id: i32, issue_number: i64, at: &str) -> Result<()> {
    conn.execute(
        "UPDATE issues SET modified_at = ?1 WHERE project_id = ?2 AND number = ?3",
        params![at, project_id, issue_number],
    )?;
    Ok(())
}

// ---------------------------------------------------------------------------
// SqliteStore comment methods
// ---------------------------------------------------------------------------

impl SqliteStore {
    pub fn add_comment_impl(&self, comment: &Comment) -> Result<Comment> {
        validate_comment(comment)?;
        self.with_transaction(|tx| {
            if get_issue_by_key_on_conn(tx, comment.issue_number, comment.project_id)?.is_none() {
                return Err(StorageError::not_found(
                    "issue",
                    format!("{}/{}", comment.project_id, comment.issue_number),
                ));
            }
            let now = now_str();
            tx.execute(
                "INSERT INTO comments
                    (issue_number, project_id, author_id, content, created_at, modified_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
                params![
                    comment.issue_number,
                    comment.project_id,
                    comment.author_id,
                    comment.content,
                    now,
                ],
            )?;
            let id = tx.last_insert_rowid();
            touch_issue(tx, comment.project_id, comment.issue_number, &now)?;
            get_comment_on_conn(tx, id)?.ok_or_else(|| {
                StorageError::Invariant(format!("comment {id} not returned after insert"))
            })
        })
    }

    /// Replaces the content of an existing comment.
    pub fn edit_comment_impl(&self, comment: &Comment) -> Result<Comment> {
        validate_comment(comment)?;
        self.with_transaction(|tx| {
            let changed = tx.execute(
                "UPDATE comments SET content = ?1 WHERE id = ?2",
                params![comment.content, comment.id],
            )?;
            if changed == 0 {
                return Err(StorageError::not_found("comment", comment.id.to_string()));
            }
            get_comment_on_conn(tx, comment.id)?.ok_or_else(|| {
                StorageError::Invariant(format!("comment {} not returned after edit", comment.id))
            })
        })
    }

    pub fn delete_comment_impl(&self, id: i64) -> Result<bool> {
        self.with_transaction(|tx| {
            let Some(existing) = get_comment_on_conn(tx, id)? else {
                return Ok(false);
            };
            tx.execute("DELETE FROM comments WHERE id = ?1", params![id])?;
            touch_issue(tx, existing.project_id, existing.issue_number, &now_str())?;
            Ok(true)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;
    use std::time::Duration;

    use super::*;
    use bootrack_core::issue::IssueBuilder;
    use bootrack_core::predicate::Predicate;
    use bootrack_core::query::IssueQuery;
    use pretty_assertions::assert_eq;

    use crate::sqlite::test_support::seeded_store;

    fn comment_count(store: &SqliteStore, project_id: i32) -> i64 {
        store
            .select_summaries_impl(&IssueQuery::new(Predicate::project(project_id)))
            .unwrap()[0]
            .comment_count
    }

    #[test]
    fn comment_count_follows_add_and_delete() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Counted").build())
            .unwrap();
        assert_eq!(comment_count(&store, project.id), 0);

        let comment = store
            .add_comment_impl(&Comment::draft(project.id, issue.number, user.id, "first!"))
            .unwrap();
        assert_eq!(comment_count(&store, project.id), 1);

        assert!(store.delete_comment_impl(comment.id).unwrap());
        assert_eq!(comment_count(&store, project.id), 0);
        assert!(!store.delete_comment_impl(comment.id).unwrap());
    }

    #[test]
    fn add_comment_touches_issue() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Touched").build())
            .unwrap();
        sleep(Duration::from_millis(5));

        let comment = store
            .add_comment_impl(&Comment::draft(project.id, issue.number, user.id, "hello"))
            .unwrap();
        let detailed = store.get_issue_impl(issue.number, project.id).unwrap().unwrap();

        assert_eq!(detailed.issue.modified_at, comment.created_at);
        assert!(detailed.issue.modified_at > issue.modified_at);
        assert_eq!(detailed.comments, vec![comment]);
    }

    #[test]
    fn edit_comment_updates_timestamps_via_trigger() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Edited").build())
            .unwrap();
        let mut comment = store
            .add_comment_impl(&Comment::draft(project.id, issue.number, user.id, "tpyo"))
            .unwrap();
        sleep(Duration::from_millis(5));

        comment.content = "typo".into();
        let edited = store.edit_comment_impl(&comment).unwrap();
        assert_eq!(edited.content, "typo");
        assert!(edited.modified_at > edited.created_at);

        let parent = store.get_issue_impl(issue.number, project.id).unwrap().unwrap();
        assert!(parent.issue.modified_at >= edited.created_at);
    }

    #[test]
    fn delete_comment_touches_issue() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Deleted").build())
            .unwrap();
        let comment = store
            .add_comment_impl(&Comment::draft(project.id, issue.number, user.id, "bye"))
            .unwrap();
        sleep(Duration::from_millis(5));

        store.delete_comment_impl(comment.id).unwrap();
        let parent = store.get_issue_impl(issue.number, project.id).unwrap().unwrap();
        assert!(parent.issue.modified_at > comment.created_at);
    }

    #[test]
    fn comment_on_missing_issue_is_not_found() {
        let (store, project, user) = seeded_store();
        let err = store
            .add_comment_impl(&Comment::draft(project.id, 999, user.id, "?"))
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn edit_missing_comment_is_not_found() {
        let (store, project, user) = seeded_store();
        let mut ghost = Comment::draft(project.id, 100, user.id, "boo");
        ghost.id = 404;
        assert!(store.edit_comment_impl(&ghost).unwrap_err().is_not_found());
    }

    #[test]
    fn comments_cascade_with_issue() {
        let (store, project, user) = seeded_store();
        let issue = store
            .add_issue_impl(&IssueBuilder::new(project.id, user.id, "Cascade").build())
            .unwrap();
        let comment = store
            .add_comment_impl(&Comment::draft(project.id, issue.number, user.id, "gone soon"))
            .unwrap();
        store.delete_issue_impl(issue.number, project.id).unwrap();
        assert!(!store.delete_comment_impl(comment.id).unwrap());
    }
}
