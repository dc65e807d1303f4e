//! `bt search` -- full-text search within a project.

use anyhow::Result;

use crate::cli::SearchArgs;
use crate::commands::list::{check_page, print_footer};
use crate::context::RuntimeContext;
use crate::output::{output_json, print_summaries};

pub fn run(ctx: &RuntimeContext, args: &SearchArgs) -> Result<()> {
    let session = ctx.session()?;
    let project = session.project(args.project.as_deref())?;
    let found = session.sync.filter(&project, &args.text, args.hide_resolved)?;
    if found > 0 && args.page > 1 {
        check_page(&session, args.page)?;
        session.sync.load_page(args.page)?;
    }

    let summaries = session.sync.cache().summaries.get();
    if ctx.json {
        output_json(&summaries);
        return Ok(());
    }
    if summaries.is_empty() {
        println!("No issues in {} match \"{}\".", project.code, args.text.trim());
        return Ok(());
    }
    print_summaries(&summaries);
    if !ctx.quiet {
        print_footer(&session, false, args.page, &summaries);
    }
    Ok(())
}
