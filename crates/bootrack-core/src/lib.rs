//! Core types for bootrack.
//!
//! Domain model (projects, issues, comments, users, notifications), the
//! closed argument enums, and the predicate/query-plan vocabulary shared by
//! every storage backend.

pub mod change;
pub mod comment;
pub mod enums;
pub mod geo;
pub mod issue;
pub mod mention;
pub mod notification;
pub mod predicate;
pub mod project;
pub mod query;
pub mod search;
pub mod user;
pub mod validation;
