//! Notification log and session view for [`SqliteStore`].
//!
//! `notifications` is the permanent log. `session_notifications` holds the
//! rows a receiver has loaded, with a mutable read flag, until
//! [`SqliteStore::sync_notifications_impl`] folds it back into the log.

use rusqlite::{Connection, OptionalExtension, Row, params};
use tracing::{debug, info};

use bootrack_core::notification::{Notification, SessionNotification};

use crate::error::{Result, StorageError};
use crate::sqlite::issues::{get_datetime, now_str};
use crate::sqlite::store::SqliteStore;

fn scan_notification(row: &Row<'_>) -> rusqlite::Result<Notification> {
    Ok(Notification {
        id: row.get("id")?,
        notification_type_id: row.get("notification_type_id")?,
        receiver_id: row.get("receiver_id")?,
        sender_id: row.get("sender_id")?,
        issue_number: row.get("issue_number")?,
        project_id: row.get("project_id")?,
        created_at: get_datetime(row, "created_at")?,
    })
}

fn scan_session_notification(row: &Row<'_>) -> rusqlite::Result<SessionNotification> {
    let is_read: i32 = row.get("is_read")?;
    Ok(SessionNotification {
        id: row.get("id")?,
        receiver_id: row.get("receiver_id")?,
        message: row.get("message")?,
        sender_name: row.get("sender_name")?,
        sender_avatar: row.get::<_, Option<i32>>("sender_avatar")?.unwrap_or_default(),
        sender_avatar_tint: row
            .get::<_, Option<i32>>("sender_avatar_tint")?
            .unwrap_or_default(),
        issue_code: row.get("issue_code")?,
        created_at: get_datetime(row, "created_at")?,
        is_read: is_read != 0,
    })
}

fn get_notification_on_conn(conn: &Connection, id: i64) -> Result<Option<Notification>> {
    Ok(conn
        .query_row(
            "SELECT id, notification_type_id, receiver_id, sender_id, issue_number,
                    project_id, created_at
               FROM notifications WHERE id = ?1",
            params![id],
            scan_notification,
        )
        .optional()?)
}

impl SqliteStore {
    /// Appends to the permanent log. Ids and timestamps are generated.
    pub fn add_notifications_impl(&self, notifications: &[Notification]) -> Result<Vec<Notification>> {
        self.with_transaction(|tx| {
            let now = now_str();
            let mut stored = Vec::with_capacity(notifications.len());
            for n in notifications {
                tx.execute(
                    "INSERT INTO notifications
                        (notification_type_id, receiver_id, sender_id, issue_number,
                         project_id, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                    params![
                        n.notification_type_id,
                        n.receiver_id,
                        n.sender_id,
                        n.issue_number,
                        n.project_id,
                        now,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                stored.push(get_notification_on_conn(tx, id)?.ok_or_else(|| {
                    StorageError::Invariant(format!("notification {id} not returned after insert"))
                })?);
            }
            debug!(count = stored.len(), "notifications added");
            Ok(stored)
        })
    }

    /// Copies the receiver's log rows into the session view (rows already
    /// there keep their read flag) and returns the joined view, newest first.
    pub fn get_notifications_by_receiver_impl(&self, user_id: i32) -> Result<Vec<SessionNotification>> {
        self.with_transaction(|tx| {
            tx.execute(
                "INSERT OR IGNORE INTO session_notifications
                    (id, notification_type_id, receiver_id, sender_id, issue_number,
                     project_id, created_at, is_read)
                 SELECT id, notification_type_id, receiver_id, sender_id, issue_number,
                        project_id, created_at, 0
                   FROM notifications
                  WHERE receiver_id = ?1",
                params![user_id],
            )?;

            let mut stmt = tx.prepare(
                "SELECT s.id, s.receiver_id, t.message,
                        u.full_name AS sender_name,
                        json_extract(u.settings, '$.avatarIcon') AS sender_avatar,
                        json_extract(u.settings, '$.avatarTint') AS sender_avatar_tint,
                        p.code || '-' || s.issue_number AS issue_code,
                        s.created_at, s.is_read
                   FROM session_notifications s
                   JOIN notification_types t ON t.id = s.notification_type_id
                   JOIN users u ON u.id = s.sender_id
                   JOIN projects p ON p.id = s.project_id
                  WHERE s.receiver_id = ?1
                  ORDER BY s.created_at DESC, s.id DESC",
            )?;
            let rows = stmt.query_map(params![user_id], scan_session_notification)?;
            let mut view = Vec::new();
            for row in rows {
                view.push(row?);
            }
            Ok(view)
        })
    }

    /// Sets the read flag of a session row. Returns `false` if it is not loaded.
    pub fn edit_notification_impl(&self, id: i64, is_read: bool) -> Result<bool> {
        self.with_transaction(|tx| {
            let changed = tx.execute(
                "UPDATE session_notifications SET is_read = ?1 WHERE id = ?2",
                params![is_read as i32, id],
            )?;
            Ok(changed == 1)
        })
    }

    /// Merges the session view into the log, then clears the view.
    ///
    /// - unread rows missing from the log are re-inserted
    /// - unread rows present in the log are left alone
    /// - read rows are deleted from the log
    pub fn sync_notifications_impl(&self) -> Result<()> {
        self.with_transaction(|tx| {
            let restored = tx.execute(
                "INSERT INTO notifications
                    (id, notification_type_id, receiver_id, sender_id, issue_number,
                     project_id, created_at)
                 SELECT s.id, s.notification_type_id, s.receiver_id, s.sender_id,
                        s.issue_number, s.project_id, s.created_at
                   FROM session_notifications s
                  WHERE s.is_read = 0
                    AND NOT EXISTS (SELECT 1 FROM notifications n WHERE n.id = s.id)",
                [],
            )?;
            let removed = tx.execute(
                "DELETE FROM notifications
                  WHERE id IN (SELECT id FROM session_notifications WHERE is_read = 1)",
                [],
            )?;
            tx.execute("DELETE FROM session_notifications", [])?;
            info!(restored, removed, "notifications synced");
            Ok(())
        })
    }
}
