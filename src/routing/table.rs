//! Route storage.
//!
//! # Responsibilities
//! - Keep one ordered route list per HTTP method
//! - Compile templates on insertion
//!
//! # Design Decisions
//! - Append-only: no replacement, no dedup, no reordering
//! - Insertion order is match priority

use std::collections::HashMap;
use std::fmt;

use axum::http::Method;

use crate::dispatch::BoxedHandler;
use crate::routing::pattern::{PathPattern, PatternError};

/// A registered `(method, pattern, handlers)` triple.
pub struct Route {
    method: Method,
    pattern: PathPattern,
    handlers: Vec<BoxedHandler>,
}

impl Route {
    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn pattern(&self) -> &PathPattern {
        &self.pattern
    }

    pub fn template(&self) -> &str {
        self.pattern.template()
    }

    pub fn handlers(&self) -> &[BoxedHandler] {
        &self.handlers
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("method", &self.method)
            .field("template", &self.pattern.template())
            .field("handlers", &self.handlers.len())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct RouteTable {
    routes: HashMap<Method, Vec<Route>>,
}

impl RouteTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compile `template` and append it to `method`'s list.
    pub fn add(
        &mut self,
        method: Method,
        template: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<(), PatternError> {
        let pattern = PathPattern::compile(template)?;
        tracing::debug!(method = %method, template = %template, "Route registered");
        self.routes.entry(method.clone()).or_default().push(Route {
            method,
            pattern,
            handlers,
        });
        Ok(())
    }

    /// Routes for `method`, in priority order.
    pub fn routes(&self, method: &Method) -> &[Route] {
        self.routes.get(method).map(Vec::as_slice).unwrap_or_default()
    }

    /// Total number of registered routes.
    pub fn len(&self) -> usize {
        self.routes.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
