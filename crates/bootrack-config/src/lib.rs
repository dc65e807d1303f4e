//! Configuration management for bootrack.
//!
//! This crate handles loading and saving `.bootrack/config.yaml` files,
//! discovering `.bootrack/` directories in the filesystem, and layering
//! `BOOTRACK_*` environment overrides on top.

pub mod bootrack_dir;
pub mod config;

pub use bootrack_dir::{ensure_bootrack_dir, find_bootrack_dir, find_bootrack_dir_or_error};
pub use config::{BootrackConfig, ConfigError, load_config, save_config};
