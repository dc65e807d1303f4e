//! Notification records: the permanent log entry and the per-session view.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::enums::NotificationType;
use crate::issue::Issue;

/// A permanent notification log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    #[serde(default)]
    pub id: i64,
    pub notification_type_id: i32,
    pub receiver_id: i32,
    pub sender_id: i32,
    pub issue_number: i64,
    pub project_id: i32,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// An unsaved notification about `issue`; id and timestamp come from the store.
    pub fn about(kind: NotificationType, issue: &Issue, sender_id: i32, receiver_id: i32) -> Self {
        Self {
            id: 0,
            notification_type_id: kind.id(),
            receiver_id,
            sender_id,
            issue_number: issue.number,
            project_id: issue.project_id,
            created_at: Utc::now(),
        }
    }

    /// The typed kind, if the id is known.
    pub fn kind(&self) -> Option<NotificationType> {
        NotificationType::from_id(self.notification_type_id)
    }
}

/// A notification as presented to its receiver during a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionNotification {
    pub id: i64,
    pub receiver_id: i32,
    pub message: String,
    pub sender_name: String,
    pub sender_avatar: i32,
    pub sender_avatar_tint: i32,
    pub issue_code: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub is_read: bool,
}

impl SessionNotification {
    /// Full display line, e.g. `"Ann Example closed GHST-101"`.
    pub fn display_text(&self) -> String {
        format!("{}{}{}", self.sender_name, self.message, self.issue_code)
    }
}
