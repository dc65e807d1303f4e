//! `bt rank` -- the top issues of each priority by a metric.

use anyhow::Result;
use bootrack_core::issue::IssueSummarized;

use crate::cli::RankArgs;
use crate::context::RuntimeContext;
use crate::output::{output_json, print_summaries, render_priority};

pub fn run(ctx: &RuntimeContext, args: &RankArgs) -> Result<()> {
    let session = ctx.session()?;
    let project = session.project(args.project.as_deref())?;
    let groups = session.sync.rank(project.id, args.metric)?;

    if ctx.json {
        output_json(&groups);
        return Ok(());
    }
    if groups.is_empty() {
        println!("Nothing to rank in {}.", project.code);
        return Ok(());
    }

    // Highest priority first.
    for (i, group) in groups.iter().rev().enumerate() {
        if i > 0 {
            println!();
        }
        println!("{}", group_heading(group, args.metric.label()));
        print_summaries(group);
    }
    Ok(())
}

fn group_heading(group: &[IssueSummarized], metric: &str) -> String {
    match group.first() {
        Some(first) => {
            let priority = first.issue.priority;
            render_priority(priority, &format!("{} by {}", priority.label().to_uppercase(), metric))
        }
        None => String::new(),
    }
}
