//! Shared handler state.

use std::sync::{Arc, Mutex};

use actix_web::web;
use bootrack_core::issue::IssueSummarized;
use bootrack_storage::error::Result as StorageResult;
use bootrack_storage::{BatchIterator, Repository, StorageError};

use crate::error::ApiResult;

/// Batch size used in cursor mode when the request carries no `limit`.
pub const DEFAULT_BATCH_SIZE: u32 = 10;

/// Dependencies handed to every handler through `web::Data`.
pub struct AppState {
    repo: Arc<dyn Repository>,
    /// Server-held traversal for cursor requests without a token.
    cursor: Mutex<BatchIterator>,
    batch_size: u32,
}

impl AppState {
    pub fn new(repo: Arc<dyn Repository>) -> Self {
        Self {
            repo,
            cursor: Mutex::new(BatchIterator::new()),
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    pub fn with_batch_size(mut self, size: u32) -> Self {
        self.batch_size = size.max(1);
        self
    }

    pub fn repo(&self) -> &dyn Repository {
        self.repo.as_ref()
    }

    pub fn batch_size(&self) -> u32 {
        self.batch_size
    }

    /// Advances the shared iterator for `project_id`.
    pub(crate) fn next_held_batch(&self, project_id: i32, size: u32) -> StorageResult<Vec<IssueSummarized>> {
        let mut cursor = self
            .cursor
            .lock()
            .map_err(|e| StorageError::Internal(format!("cursor lock poisoned: {e}")))?;
        cursor.next_batch(self.repo(), project_id, size)
    }
}

/// Runs a storage call on the blocking pool.
pub(crate) async fn blocking<T, F>(state: &web::Data<AppState>, f: F) -> ApiResult<T>
where
    F: FnOnce(&AppState) -> StorageResult<T> + Send + 'static,
    T: Send + 'static,
{
    let state = state.clone();
    let result = web::block(move || f(&state)).await?;
    Ok(result?)
}
