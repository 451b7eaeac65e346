//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route registration (at startup):
//!     router.get("/user/:id", handler)
//!     → pattern.rs (compile template: segments or anchored regex)
//!     → table.rs (append to the method's ordered list)
//!
//! Incoming request (method, target):
//!     → matcher.rs (normalize pathname, first match in registration order)
//!     → Return: RouteMatch { route, params } or no match
//!     → router.rs hands the match to the dispatch chain
//! ```
//!
//! # Design Decisions
//! - Routes compiled at startup, immutable while serving
//! - Regex only for templates that need it (optional params, wildcards)
//! - Deterministic: same input always matches same route
//! - First match wins (registration order, no specificity scoring)

pub mod matcher;
pub mod pattern;
pub mod router;
pub mod table;

pub use matcher::{normalize_path, Matcher, RouteMatch};
pub use pattern::{PathPattern, PatternError, PatternKind, WILDCARD};
pub use router::Router;
pub use table::{Route, RouteTable};
