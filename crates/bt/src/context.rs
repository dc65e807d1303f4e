//! Runtime context for command execution.
//!
//! The [`RuntimeContext`] holds the global flags. Commands that work on
//! tracker data ask it for a [`Session`]: the resolved configuration, a
//! backend (local database or remote server) and a loaded
//! [`Synchronizer`] acting as the resolved user.

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use bootrack_client::{ClientApi, HttpClient, Synchronizer};
use bootrack_config::bootrack_dir::BOOTRACK_DIR_NAME;
use bootrack_config::{BootrackConfig, find_bootrack_dir, load_config};
use bootrack_core::issue::Issue;
use bootrack_core::project::Project;
use bootrack_core::user::User;
use bootrack_storage::{QuerySettings, SqliteStore};
use tracing::debug;

use crate::cli::GlobalArgs;
use crate::local::LocalApi;

/// Runtime context passed to every command handler.
///
/// Constructed once in `main` after CLI parsing, before command dispatch.
#[derive(Debug, Default)]
pub struct RuntimeContext {
    /// Database file override (`--db`).
    pub db_path: Option<PathBuf>,

    /// Username to act as (`--as-user` / `BT_USER`).
    pub as_user: Option<String>,

    /// Explicit server URL (`--server` / `BT_SERVER`).
    pub server: Option<String>,

    /// Use the configured server instead of the local database.
    pub remote: bool,

    /// Whether to produce JSON output.
    pub json: bool,

    /// Verbose output.
    pub verbose: bool,

    /// Quiet mode: suppress non-essential output.
    pub quiet: bool,
}

/// A discovered (or implied) `.bootrack/` directory and its configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// `None` when running remotely without a local `.bootrack/`.
    pub dir: Option<PathBuf>,
    pub config: BootrackConfig,
}

/// Everything a data command needs.
pub struct Session {
    pub sync: Synchronizer<Box<dyn ClientApi>>,
    pub config: BootrackConfig,
}

impl RuntimeContext {
    /// Build a `RuntimeContext` from parsed global arguments.
    pub fn from_global_args(global: &GlobalArgs) -> Self {
        Self {
            db_path: global.db.clone(),
            as_user: global.as_user.clone(),
            server: global.server.clone(),
            remote: global.remote,
            json: global.json,
            verbose: global.verbose,
            quiet: global.quiet,
        }
    }

    pub fn is_remote(&self) -> bool {
        self.remote || self.server.is_some()
    }

    /// Finds `.bootrack/` from the current directory upwards.
    pub fn find_bootrack_dir(&self) -> Option<PathBuf> {
        let cwd = env::current_dir().ok()?;
        find_bootrack_dir(&cwd)
    }

    /// Loads the configuration of the current workspace.
    ///
    /// Remote commands may run outside any workspace; they get the defaults
    /// plus `BOOTRACK_*` overrides.
    pub fn workspace(&self) -> Result<Workspace> {
        match self.find_bootrack_dir() {
            Some(dir) => {
                let config = load_config(&dir)
                    .with_context(|| format!("failed to load config from {}", dir.display()))?;
                Ok(Workspace {
                    dir: Some(dir),
                    config,
                })
            }
            None if self.is_remote() => {
                let cwd = env::current_dir().context("failed to get current directory")?;
                let config = load_config(&cwd.join(BOOTRACK_DIR_NAME))?;
                Ok(Workspace { dir: None, config })
            }
            None => bail!("no .bootrack directory found. Run 'bt init' to create one."),
        }
    }

    /// The database file: `--db` wins over the configured path.
    pub fn database_path(&self, workspace: &Workspace) -> Result<PathBuf> {
        if let Some(path) = &self.db_path {
            return Ok(path.clone());
        }
        let dir = workspace
            .dir
            .as_deref()
            .ok_or_else(|| anyhow!("no .bootrack directory found. Run 'bt init' to create one."))?;
        Ok(workspace.config.database_path(dir))
    }

    /// Opens the existing local database with the configured query settings.
    pub fn open_store(&self, workspace: &Workspace) -> Result<SqliteStore> {
        let path = self.database_path(workspace)?;
        if !path.exists() {
            bail!(
                "no bootrack database found at {}\nHint: run 'bt init' to create a database",
                path.display()
            );
        }
        open_store_at(&path, &workspace.config)
    }

    /// The backend commands talk to.
    pub fn api(&self, workspace: &Workspace) -> Result<Box<dyn ClientApi>> {
        if self.is_remote() {
            let base_url = self
                .server
                .clone()
                .unwrap_or_else(|| workspace.config.client.base_url.clone());
            debug!(%base_url, "using remote server");
            let timeout = Duration::from_secs(workspace.config.client.timeout_secs);
            return Ok(Box::new(HttpClient::new(base_url, timeout)));
        }
        Ok(Box::new(LocalApi::new(self.open_store(workspace)?)))
    }

    /// Resolves the acting user and loads the directory and their default
    /// project into a fresh synchronizer.
    pub fn session(&self) -> Result<Session> {
        let workspace = self.workspace()?;
        let api = self.api(&workspace)?;
        let users = api.get_users().context("failed to load users")?;
        let user = resolve_user(
            self.as_user.as_deref(),
            workspace.config.client.user.as_deref(),
            &users,
        )?;
        debug!(user = %user.username, "acting user resolved");

        let sync = Synchronizer::new(api, user).with_page_size(workspace.config.query.page_size);
        sync.load_initial().context("failed to load initial data")?;
        Ok(Session {
            sync,
            config: workspace.config,
        })
    }
}

/// Opens (creating when missing) the database at `path`.
pub fn open_store_at(path: &Path, config: &BootrackConfig) -> Result<SqliteStore> {
    let settings = QuerySettings {
        rank_cutoff: config.query.rank_cutoff,
        summary_includes_location: config.query.summary_includes_location,
    };
    SqliteStore::open_with(path, settings)
        .with_context(|| format!("failed to open database: {}", path.display()))
}

/// Picks the acting user.
///
/// Priority: `--as-user`, then `client.user` from config, then the only
/// user when there is exactly one.
pub fn resolve_user(flag: Option<&str>, configured: Option<&str>, users: &[User]) -> Result<User> {
    let wanted = flag.or(configured).map(str::trim).filter(|s| !s.is_empty());
    match wanted {
        Some(name) => users
            .iter()
            .find(|u| u.username == name)
            .cloned()
            .ok_or_else(|| anyhow!("user '{name}' not found")),
        None => match users {
            [only] => Ok(only.clone()),
            [] => bail!("no users yet. Add one with 'bt user add <username>'"),
            _ => bail!("several users exist; choose one with --as-user or client.user in config.yaml"),
        },
    }
}

impl Session {
    pub fn user(&self) -> User {
        self.sync.current_user()
    }

    /// The project named by `code`, or the user's default project.
    pub fn project(&self, code: Option<&str>) -> Result<Project> {
        match code {
            Some(code) => self
                .sync
                .cache()
                .find_project_by_code(&code.to_ascii_uppercase())
                .or_else(|| self.sync.cache().find_project_by_code(code))
                .ok_or_else(|| anyhow!("project '{code}' not found")),
            None => {
                let default = self.user().settings.default_project;
                Ok(self.sync.cache().find_project(default.id).unwrap_or(default))
            }
        }
    }

    pub fn user_named(&self, username: &str) -> Result<User> {
        self.sync
            .cache()
            .find_user_by_username(username.trim_start_matches('@'))
            .ok_or_else(|| anyhow!("user '{username}' not found"))
    }

    /// The current copy of the issue with `code`.
    pub fn issue(&self, code: &str) -> Result<Issue> {
        let detailed = self
            .sync
            .show_issue(&code.to_ascii_uppercase())
            .with_context(|| format!("issue '{code}'"))?;
        Ok(detailed.issue)
    }
}
