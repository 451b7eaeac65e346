//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (Axum setup, request ID, limits, body buffering)
//!     → request.rs (method, target, headers, buffered body)
//!     → middleware/ (built-in middlewares such as the body parser)
//!     → [routing + dispatch run the chain]
//!     → response.rs (status, headers, body; first send wins)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod response;
pub mod server;

pub use middleware::{body_parser, ParsedBody};
pub use request::{Params, Request};
pub use response::Response;
pub use server::HttpServer;
