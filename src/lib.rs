//! Ordered route matching, onion middleware dispatch and a
//! protocol-selecting HTTP client.

pub mod client;
pub mod config;
pub mod dispatch;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod resilience;
pub mod routing;

pub use client::{fetch, FetchError, FetchOptions, FetchResponse};
pub use config::AppConfig;
pub use dispatch::{handler_fn, Handler, Next, RouteError};
pub use http::{HttpServer, Request, Response};
pub use lifecycle::Shutdown;
pub use routing::Router;
