//! Discovery and creation of the `.bootrack/` directory.
//!
//! The directory holds `config.yaml` and, unless configured otherwise, the
//! SQLite database.

use crate::config::ConfigError;
use std::path::{Path, PathBuf};

/// The name of the bootrack metadata directory.
pub const BOOTRACK_DIR_NAME: &str = ".bootrack";

/// Environment variable that overrides directory discovery.
pub const BOOTRACK_DIR_ENV: &str = "BOOTRACK_DIR";

/// Walk up from `start` looking for a `.bootrack/` directory.
///
/// `BOOTRACK_DIR` wins when it names an existing directory.
///
/// ```no_run
/// use bootrack_config::find_bootrack_dir;
/// use std::path::Path;
///
/// if let Some(dir) = find_bootrack_dir(Path::new(".")) {
///     println!("using {}", dir.display());
/// }
/// ```
pub fn find_bootrack_dir(start: &Path) -> Option<PathBuf> {
    if let Ok(env_dir) = std::env::var(BOOTRACK_DIR_ENV) {
        let env_path = PathBuf::from(env_dir);
        if env_path.is_dir() {
            return Some(env_path);
        }
    }

    let start = start.canonicalize().ok()?;
    start
        .ancestors()
        .map(|dir| dir.join(BOOTRACK_DIR_NAME))
        .find(|candidate| candidate.is_dir())
}

/// Like [`find_bootrack_dir`], but a miss is an error.
pub fn find_bootrack_dir_or_error(start: &Path) -> Result<PathBuf, ConfigError> {
    find_bootrack_dir(start).ok_or(ConfigError::BootrackDirNotFound)
}

/// Creates `.bootrack/` under `path` (or `path` itself when it is already
/// named `.bootrack`) and returns it.
pub fn ensure_bootrack_dir(path: &Path) -> Result<PathBuf, ConfigError> {
    let dir = if path.ends_with(BOOTRACK_DIR_NAME) {
        path.to_path_buf()
    } else {
        path.join(BOOTRACK_DIR_NAME)
    };

    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
