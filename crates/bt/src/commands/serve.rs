//! `bt serve` -- run the HTTP API over the local database.

use std::net::TcpListener;
use std::sync::Arc;

use anyhow::{Context, Result};
use bootrack_server::AppState;
use tracing::info;

use crate::cli::ServeArgs;
use crate::context::RuntimeContext;

pub fn run(ctx: &RuntimeContext, args: &ServeArgs) -> Result<()> {
    let workspace = ctx.workspace()?;
    let store = ctx.open_store(&workspace)?;
    let config = &workspace.config;

    let bind = args.bind.clone().unwrap_or_else(|| config.server.bind.clone());
    let port = args.port.unwrap_or(config.server.port);
    let workers = args.workers.or(config.server.workers);

    let listener = TcpListener::bind((bind.as_str(), port))
        .with_context(|| format!("failed to bind {bind}:{port}"))?;
    let addr = listener.local_addr().context("failed to read bound address")?;
    let state = AppState::new(Arc::new(store)).with_batch_size(config.query.batch_size);

    if !ctx.quiet {
        println!("bt serving on http://{addr}");
    }
    info!(%addr, "starting server");
    actix_web::rt::System::new()
        .block_on(async move { bootrack_server::serve(state, listener, workers)?.await })
        .context("server stopped with an error")?;
    Ok(())
}
