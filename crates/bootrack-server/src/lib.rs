//! HTTP API for bootrack.
//!
//! An actix-web application over any [`bootrack_storage::Repository`].
//! Storage calls run on actix's blocking pool; errors leave as the JSON
//! envelope in [`error::ApiError`].

pub mod error;
pub mod routes;
pub mod state;

#[cfg(test)]
mod test_support;

use std::net::TcpListener;

use actix_web::dev::Server;
use actix_web::{App, HttpServer, web};
use tracing::info;

pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::configure;
pub use routes::issues::NEXT_CURSOR_HEADER;
pub use state::AppState;

/// Builds a server on an already bound listener.
///
/// Binding is left to the caller so tests can listen on port 0 and read
/// the chosen address back.
pub fn serve(state: AppState, listener: TcpListener, workers: Option<usize>) -> std::io::Result<Server> {
    let addr = listener.local_addr()?;
    let data = web::Data::new(state);
    let mut server = HttpServer::new(move || App::new().app_data(data.clone()).configure(configure));
    if let Some(workers) = workers {
        server = server.workers(workers);
    }
    let server = server.listen(listener)?.run();
    info!(%addr, "bootrack server listening");
    Ok(server)
}
