//! `bt near` -- unresolved issues within your travel distance.

use anyhow::Result;

use crate::cli::NearArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_summaries, render_muted};

pub fn run(ctx: &RuntimeContext, args: &NearArgs) -> Result<()> {
    let session = ctx.session()?;
    let project = session.project(args.project.as_deref())?;
    let nearby = session.sync.near(project.id)?;

    if ctx.json {
        output_json(&nearby);
        return Ok(());
    }
    let settings = session.user().settings;
    if nearby.is_empty() {
        println!(
            "No open issues in {} within {} km of {}.",
            project.code, settings.max_travel_distance, settings.location
        );
        return Ok(());
    }
    print_summaries(&nearby);
    if !ctx.quiet {
        println!();
        println!(
            "{}",
            render_muted(&format!(
                "{} issues within {} km of {}",
                nearby.len(),
                settings.max_travel_distance,
                settings.location
            ))
        );
    }
    Ok(())
}
