//! Route matching logic.
//!
//! # Responsibilities
//! - Reduce the request target to a pathname (drop host, query, fragment)
//! - Walk the method's routes in registration order
//! - Return the first match with its params, or explicit no-match
//!
//! # Design Decisions
//! - First match wins; a `:id` route registered before `/special`
//!   shadows it
//! - No match is a normal outcome, never an error
//! - Nothing is cached between requests

use std::sync::OnceLock;

use axum::http::Method;
use url::Url;

use crate::dispatch::BoxedHandler;
use crate::http::request::Params;
use crate::routing::table::{Route, RouteTable};

/// A successful lookup.
#[derive(Debug)]
pub struct RouteMatch<'t> {
    pub route: &'t Route,
    pub params: Params,
}

impl<'t> RouteMatch<'t> {
    pub fn handlers(&self) -> &'t [BoxedHandler] {
        self.route.handlers()
    }
}

/// Pathname of `target`, resolved against `http://localhost` so both
/// origin-form (`/a?b`) and absolute (`http://h/a`) targets work.
pub fn normalize_path(target: &str) -> Option<String> {
    static BASE: OnceLock<Option<Url>> = OnceLock::new();
    let base = BASE
        .get_or_init(|| Url::parse("http://localhost/").ok())
        .as_ref()?;
    base.join(target).ok().map(|url| url.path().to_string())
}

/// Looks up routes in a table.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'t> {
    table: &'t RouteTable,
}

impl<'t> Matcher<'t> {
    pub fn new(table: &'t RouteTable) -> Self {
        Self { table }
    }

    /// First route for `method` whose pattern matches `target`.
    pub fn find(&self, method: &Method, target: &str) -> Option<RouteMatch<'t>> {
        let path = normalize_path(target)?;
        self.table
            .routes(method)
            .iter()
            .find_map(|route| {
                route
                    .pattern()
                    .matches(&path)
                    .map(|params| RouteMatch { route, params })
            })
    }
}
