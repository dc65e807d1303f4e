//! `bt comment` -- add, edit and delete comments on an issue.

use anyhow::{Result, anyhow, bail};
use bootrack_core::comment::Comment;

use crate::cli::{CommentArgs, CommentCommands};
use crate::context::{RuntimeContext, Session};
use crate::output::{output_json, render_accent, render_pass};

pub fn run(ctx: &RuntimeContext, args: &CommentArgs) -> Result<()> {
    let session = ctx.session()?;
    match &args.command {
        CommentCommands::Add { code, text } => {
            if text.trim().is_empty() {
                bail!("comment text is empty");
            }
            let issue = session.issue(code)?;
            let draft = Comment::draft(issue.project_id, issue.number, 0, text.as_str());
            let created = session.sync.add_comment(draft)?;
            if ctx.json {
                output_json(&created);
            } else if !ctx.quiet {
                println!(
                    "{} comment #{} on {}",
                    render_pass("Added"),
                    created.id,
                    render_accent(&issue.code)
                );
            }
        }
        CommentCommands::Edit { code, id, text } => {
            if text.trim().is_empty() {
                bail!("comment text is empty");
            }
            let mut comment = find_comment(&session, code, *id)?;
            comment.content = text.clone();
            let updated = session.sync.edit_comment(&comment)?;
            if ctx.json {
                output_json(&updated);
            } else if !ctx.quiet {
                println!("Updated comment #{} on {}", updated.id, render_accent(&code.to_ascii_uppercase()));
            }
        }
        CommentCommands::Delete { code, id } => {
            let comment = find_comment(&session, code, *id)?;
            if !session.sync.delete_comment(&comment)? {
                bail!("comment #{id} not found");
            }
            if ctx.json {
                output_json(&serde_json::json!({ "deleted": id }));
            } else if !ctx.quiet {
                println!("Deleted comment #{} from {}", id, render_accent(&code.to_ascii_uppercase()));
            }
        }
    }
    Ok(())
}

fn find_comment(session: &Session, code: &str, id: i64) -> Result<Comment> {
    session
        .sync
        .show_issue(&code.to_ascii_uppercase())?
        .comments
        .into_iter()
        .find(|c| c.id == id)
        .ok_or_else(|| anyhow!("comment #{id} not found on {code}"))
}
