//! SQLite-backed storage implementation.

mod comments;
mod directory;
mod issues;
mod notifications;
pub mod schema;
mod select;
mod store;
mod transaction;

#[cfg(test)]
pub(crate) mod test_support;

pub use store::SqliteStore;
