//! `bt` -- bootrack issue tracker CLI.
//!
//! Parses arguments with clap, resolves the runtime context, and dispatches
//! to command handlers. Data commands run against the local database or,
//! with `--remote`/`--server`, against a bootrack server.

mod cli;
mod commands;
mod context;
mod local;
mod output;

use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use context::RuntimeContext;

/// Tracks whether a Ctrl+C has already been received.
static CTRLC_RECEIVED: AtomicBool = AtomicBool::new(false);

fn main() {
    // First Ctrl+C exits cleanly, a second one forces it.
    let _ = ctrlc::set_handler(|| {
        if CTRLC_RECEIVED.swap(true, Ordering::SeqCst) {
            std::process::exit(1);
        }
        std::process::exit(0);
    });

    let cli = Cli::parse();
    let ctx = RuntimeContext::from_global_args(&cli.global);
    init_tracing(&ctx, matches!(cli.command, Some(Commands::Serve(_))));

    let result = match cli.command {
        Some(Commands::Init(args)) => commands::init::run(&ctx, &args),
        Some(Commands::Project(args)) => commands::project::run(&ctx, &args),
        Some(Commands::User(args)) => commands::user::run(&ctx, &args),
        Some(Commands::Issue(args)) => commands::issue::run(&ctx, &args),
        Some(Commands::Comment(args)) => commands::comment::run(&ctx, &args),
        Some(Commands::List(args)) => commands::list::run(&ctx, &args),
        Some(Commands::Search(args)) => commands::search::run(&ctx, &args),
        Some(Commands::Rank(args)) => commands::rank::run(&ctx, &args),
        Some(Commands::Near(args)) => commands::near::run(&ctx, &args),
        Some(Commands::Export(args)) => commands::export::run(&ctx, &args),
        Some(Commands::Notifications(args)) => commands::notifications::run(&ctx, &args),
        Some(Commands::Serve(args)) => commands::serve::run(&ctx, &args),
        Some(Commands::Completion(args)) => commands::completion::run(&ctx, &args),
        None => {
            use clap::CommandFactory;
            Cli::command().print_help().ok();
            println!();
            Ok(())
        }
    };

    if let Err(e) = result {
        if cli.global.json {
            let err_json = serde_json::json!({
                "error": format!("{:#}", e),
            });
            if let Ok(s) = serde_json::to_string_pretty(&err_json) {
                eprintln!("{}", s);
            }
        } else {
            eprintln!("Error: {:#}", e);
        }
        std::process::exit(1);
    }
}

/// `-v` turns on debug logs for the CLI and the libraries; the server logs
/// at `info` (or `RUST_LOG`) on its own.
fn init_tracing(ctx: &RuntimeContext, serving: bool) {
    let filter = if ctx.verbose {
        EnvFilter::new("bt=debug,bootrack_client=debug,bootrack_storage=debug,bootrack_server=debug")
    } else if serving {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    } else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
