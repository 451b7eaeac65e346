//! Startup orchestration.
//!
//! # Responsibilities
//! - Initialize metrics when enabled
//! - Bind the listener (plain or TLS)
//! - Serve the frozen router until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Listeners start last (traffic only when ready)

use std::sync::Arc;

use thiserror::Error;

use crate::config::AppConfig;
use crate::http::HttpServer;
use crate::lifecycle::{signals, Shutdown};
use crate::net::{self, ListenerError};
use crate::observability::metrics;
use crate::routing::Router;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),

    #[error("TLS setup failed: {0}")]
    Tls(std::io::Error),

    #[error("Server error: {0}")]
    Serve(std::io::Error),
}

/// Serve `router` with `config` until SIGINT/SIGTERM.
pub async fn run(config: AppConfig, router: Router) -> Result<(), StartupError> {
    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(err) = metrics::init_metrics(addr) {
                    tracing::error!(error = %err, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let shutdown = Arc::new(Shutdown::new());
    let receiver = shutdown.subscribe();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move { signals::forward_signals(&signal_shutdown).await });

    let tls = config.listener.tls.clone();
    let server = HttpServer::new(config, router);

    match tls {
        Some(tls) => {
            let addr = net::bind_address(&server.config().listener)?;
            let rustls = net::load_tls_config(&tls).await.map_err(StartupError::Tls)?;
            server
                .run_tls(addr, rustls, receiver)
                .await
                .map_err(StartupError::Serve)
        }
        None => {
            let listener = net::bind(&server.config().listener).await?;
            server
                .run(listener, receiver)
                .await
                .map_err(StartupError::Serve)
        }
    }
}
