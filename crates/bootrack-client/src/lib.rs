//! Client side of bootrack.
//!
//! [`HttpClient`] speaks to a bootrack server through the [`ClientApi`]
//! trait. A [`Synchronizer`] drives any `ClientApi` for one user and keeps
//! the [`AppCache`] views (summary list, ranked groups, detailed issues,
//! notifications) consistent after every mutation without re-fetching.

pub mod api;
pub mod cache;
pub mod error;
pub mod http;
mod loading;
pub mod store;
pub mod sync;
pub mod updates;

#[cfg(test)]
pub(crate) mod test_support;

pub use api::{ClientApi, CursorPage, IssueFilter};
pub use cache::AppCache;
pub use error::{ClientError, Result};
pub use http::{HttpClient, NEXT_CURSOR_HEADER};
pub use store::Store;
pub use sync::{DEFAULT_PAGE_SIZE, SearchCondition, Synchronizer};
