//! `bt issue` -- create, show, edit, toggle and delete issues.

use anyhow::{Context, Result, bail};
use bootrack_core::change::FieldChange;
use bootrack_core::enums::{IssueState, Toggle};
use bootrack_core::issue::{Issue, IssueBuilder, IssueDetailed};

use crate::cli::{IssueArgs, IssueCommands, IssueCreateArgs, IssueUpdateArgs};
use crate::context::{RuntimeContext, Session};
use crate::output::{format_issue_detail, output_json, render_accent};

pub fn run(ctx: &RuntimeContext, args: &IssueArgs) -> Result<()> {
    let session = ctx.session()?;
    match &args.command {
        IssueCommands::Create(create) => run_create(ctx, &session, create),
        IssueCommands::Show { code } => {
            let detailed = session.sync.show_issue(&code.to_ascii_uppercase())?;
            print_detailed(ctx, &session, &detailed);
            Ok(())
        }
        IssueCommands::At { position, project } => {
            let project = session.project(project.as_deref())?;
            match session.sync.show_issue_at(project.id, *position)? {
                Some(detailed) => {
                    print_detailed(ctx, &session, &detailed);
                    Ok(())
                }
                None => bail!("{} has no issue at position {}", project.code, position),
            }
        }
        IssueCommands::Update(update) => run_update(ctx, &session, update),
        IssueCommands::Close { code } => {
            let issue = session.issue(code)?;
            let closed = session
                .sync
                .update_issue(&issue, FieldChange::State(IssueState::Completed))?;
            report(ctx, &closed, "Closed");
            Ok(())
        }
        IssueCommands::Reopen { code } => {
            let issue = session.issue(code)?;
            if !issue.is_resolved() {
                bail!("{} is not completed", issue.code);
            }
            let reopened = session
                .sync
                .update_issue(&issue, FieldChange::State(IssueState::InProgress))?;
            report(ctx, &reopened, "Reopened");
            Ok(())
        }
        IssueCommands::Star { code } => run_toggle(ctx, &session, code, Toggle::Stars),
        IssueCommands::Upvote { code } => run_toggle(ctx, &session, code, Toggle::Upvotes),
        IssueCommands::Delete { code } => {
            let issue = session.issue(code)?;
            if !session.sync.delete_issue(&issue)? {
                bail!("issue '{}' not found", issue.code);
            }
            if ctx.json {
                output_json(&serde_json::json!({ "deleted": issue.code }));
            } else if !ctx.quiet {
                println!("Deleted {}", render_accent(&issue.code));
            }
            Ok(())
        }
    }
}

fn run_create(ctx: &RuntimeContext, session: &Session, args: &IssueCreateArgs) -> Result<()> {
    let project = session.project(args.project.as_deref())?;
    let mut builder = IssueBuilder::new(project.id, session.user().id, args.title.trim())
        .description(args.description.clone())
        .priority(args.priority);
    if let Some(assignee) = &args.assignee {
        builder = builder.assignee(session.user_named(assignee)?.id);
    }
    if let Some(location) = args.location {
        builder = builder.location(location);
    }

    let created = session
        .sync
        .create_issue(builder.build())
        .with_context(|| format!("failed to create issue in {}", project.code))?;
    report(ctx, &created, "Created");
    Ok(())
}

fn run_update(ctx: &RuntimeContext, session: &Session, args: &IssueUpdateArgs) -> Result<()> {
    let issue = session.issue(&args.code)?;
    let changes = requested_changes(session, args)?;
    if changes.is_empty() {
        bail!("nothing to update; pass at least one field (see --help)");
    }
    let updated = session.sync.edit_issue(&issue, changes)?;
    report(ctx, &updated, "Updated");
    Ok(())
}

/// Turns the update flags into typed changes, resolving names to ids.
fn requested_changes(session: &Session, args: &IssueUpdateArgs) -> Result<Vec<FieldChange>> {
    let mut changes = Vec::new();
    if let Some(title) = &args.title {
        changes.push(FieldChange::Title(title.trim().to_string()));
    }
    if let Some(description) = &args.description {
        changes.push(FieldChange::Description(description.clone()));
    }
    if let Some(priority) = args.priority {
        changes.push(FieldChange::Priority(priority));
    }
    if let Some(state) = args.state {
        changes.push(FieldChange::State(state));
    }
    if let Some(assignee) = &args.assignee {
        changes.push(FieldChange::Assignee(Some(session.user_named(assignee)?.id)));
    } else if args.unassign {
        changes.push(FieldChange::Assignee(None));
    }
    if let Some(location) = args.location {
        changes.push(FieldChange::Location(Some(location)));
    } else if args.clear_location {
        changes.push(FieldChange::Location(None));
    }
    if let Some(code) = &args.move_to {
        changes.push(FieldChange::Project(session.project(Some(code))?));
    }
    Ok(changes)
}

fn run_toggle(ctx: &RuntimeContext, session: &Session, code: &str, toggle: Toggle) -> Result<()> {
    let issue = session.issue(code)?;
    let updated = session.sync.toggle(&issue, toggle)?;
    if ctx.json {
        output_json(&updated);
        return Ok(());
    }
    if ctx.quiet {
        return Ok(());
    }
    let me = session.user().id;
    let message = match toggle {
        Toggle::Stars if updated.watchers.contains(&me) => "Starred",
        Toggle::Stars => "Unstarred",
        Toggle::Upvotes if updated.upvotes.contains(&me) => "Upvoted",
        Toggle::Upvotes => "Withdrew upvote on",
    };
    println!(
        "{} {} ({} stars, {} upvotes)",
        message,
        render_accent(&updated.code),
        updated.watchers.len(),
        updated.upvotes.len()
    );
    Ok(())
}

fn report(ctx: &RuntimeContext, issue: &Issue, verb: &str) {
    if ctx.json {
        output_json(issue);
    } else if !ctx.quiet {
        println!("{} {}: {}", verb, render_accent(&issue.code), issue.title);
    }
}

fn print_detailed(ctx: &RuntimeContext, session: &Session, detailed: &IssueDetailed) {
    if ctx.json {
        output_json(detailed);
    } else {
        let users = session.sync.cache().users.get();
        let dates = session.user().settings.date_format;
        println!("{}", format_issue_detail(detailed, &users, dates));
    }
}
