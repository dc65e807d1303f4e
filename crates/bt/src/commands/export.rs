//! `bt export` -- dump a project as JSON lines, walked in cursor batches.

use std::fs::File;
use std::io::{self, BufWriter, Write};

use anyhow::{Context, Result, anyhow};
use bootrack_client::ClientApi;
use serde::Serialize;
use tracing::debug;

use crate::cli::ExportArgs;
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, args: &ExportArgs) -> Result<()> {
    let session = ctx.session()?;
    let project = session.project(args.project.as_deref())?;
    let batch_size = args.batch_size.unwrap_or(session.config.query.batch_size).max(1);
    let api = session.sync.api();

    let mut out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let mut cursor: Option<String> = None;
    let mut written = 0usize;
    loop {
        let page = api.next_batch(project.id, cursor.as_deref(), batch_size)?;
        debug!(project = %project.code, batch = page.items.len(), "export batch");
        for summary in &page.items {
            if args.comments {
                let detailed = api
                    .get_issue(project.id, summary.issue.number)?
                    .ok_or_else(|| anyhow!("issue {} vanished during export", summary.issue.code))?;
                write_line(&mut out, &detailed)?;
            } else {
                write_line(&mut out, summary)?;
            }
            written += 1;
        }
        match page.next {
            Some(next) => cursor = Some(next),
            None => break,
        }
    }
    out.flush().context("failed to flush export")?;

    if let Some(path) = &args.output {
        if !ctx.quiet {
            eprintln!("Exported {} issues from {} to {}", written, project.code, path.display());
        }
    }
    Ok(())
}

fn write_line<T: Serialize>(out: &mut dyn Write, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value).context("failed to serialize issue")?;
    writeln!(out).context("failed to write export")?;
    Ok(())
}
