//! Comment type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::mention::parse_mentions;

/// A comment on an issue. Owned by exactly one issue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: i64,

    pub issue_number: i64,

    pub project_id: i32,

    pub author_id: i32,

    pub content: String,

    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,

    #[serde(default = "Utc::now")]
    pub modified_at: DateTime<Utc>,
}

impl Comment {
    /// A not-yet-stored comment; id and timestamps are assigned by the store.
    pub fn draft(project_id: i32, issue_number: i64, author_id: i32, content: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            issue_number,
            project_id,
            author_id,
            content: content.into(),
            created_at: now,
            modified_at: now,
        }
    }

    /// Usernames `@mentioned` in the content, without the `@`.
    pub fn mentions(&self) -> Vec<String> {
        parse_mentions(&self.content)
    }
}
