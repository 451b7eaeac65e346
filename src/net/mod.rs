//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! ListenerConfig
//!     → listener.rs (parse address, bind TCP)
//!     → tls.rs (optional certificate + key for the TLS listener)
//!     → Hand off to HTTP layer
//! ```
//!
//! # Design Decisions
//! - TLS is optional and handled by the server transparently
//! - Binding to port 0 picks an ephemeral port (used by tests)

pub mod listener;
pub mod tls;

pub use listener::{bind, bind_address, ListenerError};
pub use tls::load_tls_config;
