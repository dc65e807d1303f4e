//! `bt init` -- create `.bootrack/` in the current directory.

use std::env;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use bootrack_config::config::CONFIG_FILE_NAME;
use bootrack_config::{BootrackConfig, ensure_bootrack_dir, load_config, save_config};
use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};
use bootrack_storage::DirectoryStore;
use tracing::debug;

use crate::cli::InitArgs;
use crate::context::{RuntimeContext, open_store_at};
use crate::output::output_json;

const GITIGNORE_CONTENT: &str = "# bootrack database files
*.db
*.db-journal
*.db-wal
*.db-shm
";

pub fn run(ctx: &RuntimeContext, args: &InitArgs) -> Result<()> {
    let cwd = env::current_dir().context("failed to get current directory")?;
    let dir = ensure_bootrack_dir(&cwd)
        .with_context(|| format!("failed to create {}", cwd.display()))?;

    let mut config = if dir.join(CONFIG_FILE_NAME).exists() {
        load_config(&dir)?
    } else {
        BootrackConfig::default()
    };
    if let Some(db) = &ctx.db_path {
        config.database.path = Some(db.display().to_string());
    }
    if let Some(user) = &args.user {
        config.client.user = Some(user.clone());
    }

    let db_path = config.database_path(&dir);
    if db_path.exists() {
        if !args.force {
            bail!(
                "Found existing database at {}\n\n\
                This workspace is already initialized. Use --force to start over \
                (all issues are lost).",
                db_path.display()
            );
        }
        remove_database(&db_path)?;
    }

    let gitignore = dir.join(".gitignore");
    if !gitignore.exists() {
        fs::write(&gitignore, GITIGNORE_CONTENT)
            .with_context(|| format!("failed to create {}", gitignore.display()))?;
    }
    save_config(&dir, &config).context("failed to write config.yaml")?;

    let store = open_store_at(&db_path, &config)?;
    debug!(path = %db_path.display(), "database created");

    let mut project = None;
    let mut user = None;
    if let (Some(name), Some(code)) = (&args.project_name, &args.code) {
        let created = store.add_project(&Project::new(name.clone(), code.to_ascii_uppercase())?)?;
        if let Some(username) = &args.user {
            let full_name = args.full_name.clone().unwrap_or_else(|| username.clone());
            user = Some(store.add_user(&User {
                id: 0,
                full_name,
                username: username.clone(),
                settings: UserSettings::defaults_for(created.clone()),
            })?);
        }
        project = Some(created);
    }

    if ctx.json {
        output_json(&serde_json::json!({
            "bootrackDir": dir.display().to_string(),
            "database": db_path.display().to_string(),
            "project": project,
            "user": user,
        }));
    } else if !ctx.quiet {
        println!("bt initialized in {}", dir.display());
        println!("  Database: {}", db_path.display());
        if let Some(p) = &project {
            println!("  Project: {} ({})", p.name, p.code);
        }
        if let Some(u) = &user {
            println!("  User: {} (@{})", u.full_name, u.username);
        }
        if project.is_none() {
            println!();
            println!("Next: `bt project add <name> <code>` and `bt user add <username>`.");
        }
    }
    Ok(())
}

/// Removes the database file and its SQLite side files.
fn remove_database(db_path: &Path) -> Result<()> {
    fs::remove_file(db_path).with_context(|| format!("failed to remove {}", db_path.display()))?;
    for suffix in ["-wal", "-shm", "-journal"] {
        let side = db_path.with_file_name(format!(
            "{}{suffix}",
            db_path.file_name().unwrap_or_default().to_string_lossy()
        ));
        if side.exists() {
            fs::remove_file(&side).with_context(|| format!("failed to remove {}", side.display()))?;
        }
    }
    Ok(())
}
