//! `bt user` -- list, add, show and configure users.

use anyhow::{Context, Result, anyhow, bail};
use bootrack_core::project::Project;
use bootrack_core::user::{User, UserSettings};

use crate::cli::{UserAddArgs, UserArgs, UserCommands, UserSettingsArgs};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table};

pub fn run(ctx: &RuntimeContext, args: &UserArgs) -> Result<()> {
    match &args.command {
        UserCommands::List => list(ctx),
        UserCommands::Add(add_args) => add(ctx, add_args),
        UserCommands::Show { username } => show(ctx, username.as_deref()),
        UserCommands::Settings(settings_args) => settings(ctx, settings_args),
    }
}

fn list(ctx: &RuntimeContext) -> Result<()> {
    let workspace = ctx.workspace()?;
    let users = ctx.api(&workspace)?.get_users().context("failed to load users")?;
    if ctx.json {
        output_json(&users);
        return Ok(());
    }
    if users.is_empty() {
        println!("No users yet.");
        return Ok(());
    }
    let rows: Vec<Vec<String>> = users
        .iter()
        .map(|u| {
            vec![
                u.id.to_string(),
                u.username.clone(),
                u.full_name.clone(),
                u.settings.default_project.code.clone(),
            ]
        })
        .collect();
    output_table(&["ID", "USERNAME", "NAME", "PROJECT"], &rows, |_, _, cell| cell.to_string());
    Ok(())
}

fn add(ctx: &RuntimeContext, args: &UserAddArgs) -> Result<()> {
    let workspace = ctx.workspace()?;
    let api = ctx.api(&workspace)?;
    let projects = api.get_projects().context("failed to load projects")?;
    let project = match &args.project {
        Some(code) => projects
            .iter()
            .find(|p| p.code.eq_ignore_ascii_case(code))
            .cloned()
            .ok_or_else(|| anyhow!("project '{code}' not found"))?,
        None => projects
            .first()
            .cloned()
            .ok_or_else(|| anyhow!("no projects yet. Add one with 'bt project add <name> <code>'"))?,
    };

    let draft = User {
        id: 0,
        full_name: args.full_name.clone().unwrap_or_else(|| args.username.clone()),
        username: args.username.trim().to_string(),
        settings: UserSettings::defaults_for(project),
    };
    let created = api
        .add_user(&draft)
        .with_context(|| format!("failed to add user {}", draft.username))?;
    if ctx.json {
        output_json(&created);
    } else if !ctx.quiet {
        println!("Created user {} (@{})", created.full_name, created.username);
    }
    Ok(())
}

fn show(ctx: &RuntimeContext, username: Option<&str>) -> Result<()> {
    let user = match username {
        Some(name) => {
            let workspace = ctx.workspace()?;
            let users = ctx.api(&workspace)?.get_users()?;
            users
                .into_iter()
                .find(|u| u.username == name.trim_start_matches('@'))
                .ok_or_else(|| anyhow!("user '{name}' not found"))?
        }
        None => ctx.session()?.user(),
    };
    if ctx.json {
        output_json(&user);
    } else {
        print_user(&user);
    }
    Ok(())
}

fn print_user(user: &User) {
    let s = &user.settings;
    println!("{} (@{})  id {}", user.full_name, user.username, user.id);
    println!("  Default project: {} ({})", s.default_project.name, s.default_project.code);
    println!("  Location: {}  max distance {} km", s.location, s.max_travel_distance);
    println!("  Date format: {}  default sort: {}", s.date_format, s.default_sort);
    let flags = [
        ("notify-on-self-changes", s.notify_on_self_changes),
        ("notify-on-mention", s.notify_on_mention),
        ("unstar-on-issue-close", s.unstar_on_issue_close),
        ("star-on-issue-create", s.star_on_issue_create),
        ("star-on-issue-update", s.star_on_issue_update),
        ("star-on-issue-assigned", s.star_on_issue_assigned),
        ("star-on-issue-upvote", s.star_on_issue_upvote),
    ];
    for (name, value) in flags {
        println!("  {name}: {value}");
    }
}

fn settings(ctx: &RuntimeContext, args: &UserSettingsArgs) -> Result<()> {
    let session = ctx.session()?;
    let default_project = match &args.default_project {
        Some(code) => Some(session.project(Some(code))?),
        None => None,
    };

    let mut updated = session.user().settings;
    if !apply_settings(&mut updated, args, default_project) {
        bail!("nothing to change; pass at least one setting (see --help)");
    }
    let saved = session
        .sync
        .edit_user_settings(updated)
        .context("failed to save settings")?;

    if ctx.json {
        output_json(&saved);
    } else if !ctx.quiet {
        println!("Updated settings for @{}", saved.username);
    }
    Ok(())
}

/// Copies every given option into `settings`; `false` when none was given.
fn apply_settings(settings: &mut UserSettings, args: &UserSettingsArgs, default_project: Option<Project>) -> bool {
    let mut touched = false;
    let mut set = |slot: &mut bool, value: Option<bool>| {
        if let Some(value) = value {
            *slot = value;
            touched = true;
        }
    };
    set(&mut settings.notify_on_self_changes, args.notify_on_self_changes);
    set(&mut settings.notify_on_mention, args.notify_on_mention);
    set(&mut settings.unstar_on_issue_close, args.unstar_on_issue_close);
    set(&mut settings.star_on_issue_create, args.star_on_issue_create);
    set(&mut settings.star_on_issue_update, args.star_on_issue_update);
    set(&mut settings.star_on_issue_assigned, args.star_on_issue_assigned);
    set(&mut settings.star_on_issue_upvote, args.star_on_issue_upvote);

    if let Some(project) = default_project {
        settings.default_project = project;
        touched = true;
    }
    if let Some(location) = args.location {
        settings.location = location;
        touched = true;
    }
    if let Some(km) = args.max_travel_distance {
        settings.max_travel_distance = km.max(0);
        touched = true;
    }
    if let Some(format) = args.date_format {
        settings.date_format = format;
        touched = true;
    }
    if let Some(sort) = args.default_sort {
        settings.default_sort = sort;
        touched = true;
    }
    if let Some(icon) = args.avatar_icon {
        settings.avatar_icon = icon;
        touched = true;
    }
    if let Some(tint) = args.avatar_tint {
        settings.avatar_tint = tint;
        touched = true;
    }
    touched
}
