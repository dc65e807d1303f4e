//! `bt project` -- list and add projects.

use anyhow::{Context, Result};
use bootrack_core::project::Project;

use crate::cli::{ProjectArgs, ProjectCommands};
use crate::context::RuntimeContext;
use crate::output::{output_json, output_table, render_accent};

pub fn run(ctx: &RuntimeContext, args: &ProjectArgs) -> Result<()> {
    let workspace = ctx.workspace()?;
    let api = ctx.api(&workspace)?;

    match &args.command {
        ProjectCommands::List => {
            let projects = api.get_projects().context("failed to load projects")?;
            if ctx.json {
                output_json(&projects);
            } else if projects.is_empty() {
                println!("No projects yet.");
            } else {
                let rows: Vec<Vec<String>> = projects
                    .iter()
                    .map(|p| vec![p.id.to_string(), p.code.clone(), p.name.clone()])
                    .collect();
                output_table(&["ID", "CODE", "NAME"], &rows, |_, col, cell| match col {
                    1 => render_accent(cell),
                    _ => cell.to_string(),
                });
            }
        }
        ProjectCommands::Add { name, code } => {
            let draft = Project::new(name.trim(), code.trim().to_ascii_uppercase())?;
            let created = api
                .add_project(&draft)
                .with_context(|| format!("failed to add project {}", draft.code))?;
            if ctx.json {
                output_json(&created);
            } else if !ctx.quiet {
                println!("Created project {} ({})", created.name, created.code);
            }
        }
    }
    Ok(())
}
