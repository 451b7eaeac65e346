//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound fetch:
//!     → timeouts.rs (race the exchange against the deadline and the abort signal)
//!     → first to settle wins; the loser is dropped
//!     → dropping the exchange closes its socket / HTTP/2 session
//! ```
//!
//! # Design Decisions
//! - `timeout_ms == 0` means no deadline; the timer is never armed
//! - Deadline and explicit abort surface the same `FetchError::Aborted`
//! - No retries: every failure goes back to the caller

pub mod timeouts;

pub use timeouts::{with_deadline, AbortController, AbortSignal};
