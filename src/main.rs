//! weave-http demo server
//!
//! Serves a handful of routes through the router and middleware chain.
//!
//! # Architecture Overview
//!
//! ```text
//!                     ┌───────────────────────────────────────────────┐
//!                     │                  weave-http                    │
//!     Client Request  │  ┌─────────┐   ┌──────────┐   ┌────────────┐  │
//!     ────────────────┼─▶│   net   │──▶│   http   │──▶│  routing   │  │
//!                     │  │listener │   │  server  │   │  matcher   │  │
//!                     │  └─────────┘   └──────────┘   └─────┬──────┘  │
//!                     │                                     ▼         │
//!                     │                              ┌────────────┐   │
//!     Client Response │                              │  dispatch  │   │
//!     ◀───────────────┼──────────────────────────────│ middleware │   │
//!                     │                              │   chain    │   │
//!                     │                              └────────────┘   │
//!                     │  ┌─────────────────────────────────────────┐  │
//!                     │  │ config · observability · lifecycle       │  │
//!                     │  └─────────────────────────────────────────┘  │
//!                     └───────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use serde_json::json;

use weave_http::config::{load_config, AppConfig};
use weave_http::dispatch::{handler_fn, RouteError};
use weave_http::http::{body_parser, ParsedBody};
use weave_http::observability::init_logging;
use weave_http::{lifecycle, Router};

#[derive(Parser)]
#[command(name = "weave-http")]
#[command(about = "Demo server for the weave-http router", long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

fn demo_router() -> Router {
    let mut router = Router::new();

    router.use_middleware(handler_fn(|req, res, next| {
        Box::pin(async move {
            let start = Instant::now();
            next.run(req, res).await;
            tracing::debug!(
                method = %req.method(),
                path = %req.path(),
                status = res.status_code().as_u16(),
                elapsed_ms = start.elapsed().as_millis() as u64,
                "Request handled"
            );
            Ok(())
        })
    }));
    router.use_middleware(body_parser());

    router.get(
        "/health",
        handler_fn(|_req, res, _next| {
            Box::pin(async move {
                res.json(&json!({ "status": "ok" }))?;
                Ok::<_, RouteError>(())
            })
        }),
    );

    router.get(
        "/users/:id",
        handler_fn(|req, res, _next| {
            Box::pin(async move {
                let id = req.param("id").unwrap_or_default().to_string();
                res.json(&json!({ "id": id }))?;
                Ok::<_, RouteError>(())
            })
        }),
    );

    router.get(
        "/files/*",
        handler_fn(|req, res, _next| {
            Box::pin(async move {
                let rest = req.param("*").unwrap_or_default().to_string();
                res.text(format!("file: {rest}"));
                Ok(())
            })
        }),
    );

    router.post(
        "/echo",
        handler_fn(|req, res, _next| {
            Box::pin(async move {
                match &req.parsed_body {
                    Some(ParsedBody::Json(value)) => res.json(value)?,
                    Some(ParsedBody::Form(pairs)) => res.json(pairs)?,
                    Some(ParsedBody::Text(text)) => res.text(text.clone()),
                    None => res.end(),
                }
                Ok::<_, RouteError>(())
            })
        }),
    );

    router
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };

    init_logging(&config.observability);
    tracing::info!("weave-http v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        tls = config.listener.tls.is_some(),
        max_body_size = config.limits.max_body_size,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    lifecycle::run(config, demo_router()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
