//! `bt list` -- one page of a project's issues, newest activity first.

use anyhow::{Result, bail};
use bootrack_core::issue::IssueSummarized;

use crate::cli::ListArgs;
use crate::context::{RuntimeContext, Session};
use crate::output::{output_json, print_summaries, render_muted};

pub fn run(ctx: &RuntimeContext, args: &ListArgs) -> Result<()> {
    let session = ctx.session()?;
    let project = session.project(args.project.as_deref())?;
    if session.sync.current_project().map(|p| p.id) != Some(project.id) {
        session.sync.load_project(&project)?;
    }

    if args.all {
        session
            .sync
            .prefetch_all(project.id, session.config.query.batch_size)?;
    } else if args.page > 1 {
        check_page(&session, args.page)?;
        session.sync.load_page(args.page)?;
    }

    let summaries = session.sync.cache().summaries.get();
    if ctx.json {
        output_json(&summaries);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("No issues in {}.", project.code);
        return Ok(());
    }
    print_summaries(&summaries);
    if !ctx.quiet {
        print_footer(&session, args.all, args.page, &summaries);
    }
    Ok(())
}

/// Fails for pages past the end of the current listing.
pub(crate) fn check_page(session: &Session, page: u32) -> Result<()> {
    let pages = session.sync.page_count();
    if i64::from(page) > pages {
        bail!("page {page} is out of range (1-{})", pages.max(1));
    }
    Ok(())
}

pub(crate) fn print_footer(session: &Session, all: bool, page: u32, summaries: &[IssueSummarized]) {
    let total = session.sync.cache().issue_count.get();
    let line = if all {
        format!("{} issues", summaries.len())
    } else {
        format!(
            "Page {} of {} ({} issues)",
            page.max(1),
            session.sync.page_count().max(1),
            total
        )
    };
    println!();
    println!("{}", render_muted(&line));
}
