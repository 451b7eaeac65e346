//! Middleware dispatch subsystem.
//!
//! # Data Flow
//! ```text
//! Request + Response
//!     → next.rs (global middlewares, in registration order)
//!     → next.rs (matched route handlers, nested continuation)
//!        or not-found fallback
//!     → error.rs (any Err / panic → one 500 response, chain stops)
//! ```
//!
//! # Design Decisions
//! - Onion order: code after `next.run(..).await` sees inner effects
//! - One chain instance per request; no state shared across requests
//! - Errors never escape the dispatcher

pub mod error;
pub mod handler;
pub mod next;

pub use error::{error_body, BoxError, RouteError};
pub use handler::{boxed, handler_fn, BoxFuture, BoxedHandler, Handler, HandlerFn, HandlerResult, NotFound};
pub use next::Next;
