//! Batch scanning of a project's issues.
//!
//! [`BatchToken`] is the stateless form: the caller holds the position and
//! passes it back. [`BatchIterator`] keeps that token for the caller and
//! restarts transparently when the project changes or the scan ends.

use std::fmt;
use std::str::FromStr;

use bootrack_core::issue::IssueSummarized;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, StorageError};
use crate::traits::IssueStore;

/// Position within a project scan. Renders as `"{project_id}:{offset}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchToken {
    pub project_id: i32,
    pub offset: u32,
}

impl BatchToken {
    /// First batch of a project.
    pub fn start(project_id: i32) -> Self {
        Self {
            project_id,
            offset: 0,
        }
    }

    /// Token positioned `by` rows further.
    pub fn advance(&self, by: u32) -> Self {
        Self {
            project_id: self.project_id,
            offset: self.offset.saturating_add(by),
        }
    }
}

impl fmt::Display for BatchToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.project_id, self.offset)
    }
}

impl FromStr for BatchToken {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || StorageError::invalid_argument(format!("malformed cursor {s:?}"));
        let (project, offset) = s.split_once(':').ok_or_else(invalid)?;
        Ok(Self {
            project_id: project.trim().parse().map_err(|_| invalid())?,
            offset: offset.trim().parse().map_err(|_| invalid())?,
        })
    }
}

/// One batch and where the next one starts (`None` when this was the last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchPage {
    pub items: Vec<IssueSummarized>,
    pub next: Option<BatchToken>,
}

/// Stateful scan over a project in fixed-size batches.
///
/// - A call for a different project drops the old position.
/// - Once the scan is exhausted one call returns `[]` and the position is
///   cleared, so the following call starts over.
/// - On error the position is cleared; the caller restarts from batch one.
///
/// One traversal at a time: callers sharing an iterator must serialize.
#[derive(Debug, Default)]
pub struct BatchIterator {
    position: Option<BatchToken>,
}

impl BatchIterator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Project of the traversal in flight, if any.
    pub fn current_project(&self) -> Option<i32> {
        self.position.map(|t| t.project_id)
    }

    pub fn reset(&mut self) {
        self.position = None;
    }

    /// Fetches the next batch of `size` summaries for `project_id`.
    pub fn next_batch<S: IssueStore + ?Sized>(
        &mut self,
        store: &S,
        project_id: i32,
        size: u32,
    ) -> Result<Vec<IssueSummarized>> {
        let token = match self.position {
            Some(token) if token.project_id == project_id => token,
            Some(stale) => {
                debug!(from = stale.project_id, to = project_id, "batch cursor reset");
                BatchToken::start(project_id)
            }
            None => BatchToken::start(project_id),
        };

        let page = match store.next_batch(&token, size) {
            Ok(page) => page,
            Err(err) => {
                self.position = None;
                return Err(err);
            }
        };

        if page.items.is_empty() {
            self.position = None;
        } else {
            self.position = Some(token.advance(page.items.len() as u32));
        }
        Ok(page.items)
    }
}
