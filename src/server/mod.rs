//! Static dev server with live reload.
//!
//! Serves one output root over HTTP:
//! - `index.html` for directory requests
//! - the live reload client injected into HTML responses
//! - `/__livereload` WebSocket broadcasting rebuilds

mod http;
pub mod livereload;

pub use http::{content_type, create_router, request_path, ServerState};
pub use livereload::{LiveReload, ReloadEvent};

use crate::config::ServerConfig;
use std::path::PathBuf;
use thiserror::Error;
use tokio::net::TcpListener;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Bind the configured address.
pub async fn bind(config: &ServerConfig) -> Result<TcpListener, ServerError> {
    let addr = format!("{}:{}", config.host, config.port);
    TcpListener::bind(&addr).await.map_err(|source| ServerError::Bind { addr, source })
}

/// Serve `root` on `listener` until the process ends.
pub async fn serve(
    listener: TcpListener,
    root: PathBuf,
    live_reload: LiveReload,
    inject_client: bool,
) -> Result<(), ServerError> {
    if let Ok(addr) = listener.local_addr() {
        tracing::info!("Serving {} at http://{}", root.display(), addr);
    }
    let router = create_router(ServerState { root, live_reload, inject_client });
    axum::serve(listener, router).await.map_err(ServerError::Serve)
}
