//! Command handlers, one module per `bt` subcommand.

pub mod comment;
pub mod completion;
pub mod export;
pub mod init;
pub mod issue;
pub mod list;
pub mod near;
pub mod notifications;
pub mod project;
pub mod rank;
pub mod search;
pub mod serve;
pub mod user;
