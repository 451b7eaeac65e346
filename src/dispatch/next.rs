//! Per-request chain state and the `next` continuation.
//!
//! # State Machine
//! ```text
//! Middleware(0) → Middleware(1) → … → Middleware(N)
//!     Middleware(N), route matched → Handler(0) → … → Handler(M) = Done
//!     Middleware(N), no route      → not-found handler          → Done
//! any state, handler returns Err / panics / calls fail() → ERROR (500, terminal)
//! ```
//!
//! # Design Decisions
//! - `Next` is consumed by `run`, so a layer can continue the chain at most once
//! - Position is an index into borrowed handler lists; nothing is shared
//!   between requests
//! - Errors are converted where they occur; `run` itself never fails

use std::panic::AssertUnwindSafe;

use futures_util::FutureExt;

use crate::dispatch::error::{emit_error, RouteError};
use crate::dispatch::handler::{BoxFuture, BoxedHandler, Handler};
use crate::http::{Request, Response};
use crate::routing::RouteMatch;

/// Everything one request's chain walks over, borrowed from the router.
pub(crate) struct Chain<'a> {
    pub(crate) middlewares: &'a [BoxedHandler],
    pub(crate) route: Option<RouteMatch<'a>>,
    pub(crate) not_found: &'a dyn Handler,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Position {
    Middleware(usize),
    Handler(usize),
    Done,
}

/// Continuation handed to every middleware and handler.
pub struct Next<'a> {
    chain: &'a Chain<'a>,
    position: Position,
}

impl<'a> Next<'a> {
    pub(crate) fn start(chain: &'a Chain<'a>) -> Self {
        Self {
            chain,
            position: Position::Middleware(0),
        }
    }

    fn at(&self, position: Position) -> Self {
        Self {
            chain: self.chain,
            position,
        }
    }

    /// Run the rest of the chain and resolve once it has unwound back here.
    pub fn run<'r>(self, req: &'r mut Request, res: &'r mut Response) -> BoxFuture<'r, ()>
    where
        'a: 'r,
    {
        Box::pin(async move {
            let chain = self.chain;
            match self.position {
                Position::Middleware(i) => {
                    if let Some(middleware) = chain.middlewares.get(i) {
                        let next = self.at(Position::Middleware(i + 1));
                        invoke(middleware.as_ref(), req, res, next).await;
                    } else if let Some(route) = &chain.route {
                        req.params = route.params.clone();
                        tracing::trace!(
                            route = %route.route.template(),
                            "Global middlewares done, entering route handlers"
                        );
                        self.at(Position::Handler(0)).run(req, res).await;
                    } else {
                        tracing::debug!(
                            method = %req.method(),
                            path = %req.path(),
                            "No route matched"
                        );
                        let next = self.at(Position::Done);
                        invoke(chain.not_found, req, res, next).await;
                    }
                }
                Position::Handler(j) => {
                    let handler = chain
                        .route
                        .as_ref()
                        .and_then(|route| route.handlers().get(j));
                    if let Some(handler) = handler {
                        let next = self.at(Position::Handler(j + 1));
                        invoke(handler.as_ref(), req, res, next).await;
                    }
                }
                Position::Done => {}
            }
        })
    }

    /// Take the error channel: emit the 500 response and end the chain.
    pub fn fail(self, req: &Request, res: &mut Response, err: impl Into<RouteError>) {
        emit_error(req, res, &err.into());
    }
}

/// Call one layer, converting `Err` and panics into the terminal error.
async fn invoke(handler: &dyn Handler, req: &mut Request, res: &mut Response, next: Next<'_>) {
    // `call` itself may panic before it returns a future.
    let outcome = AssertUnwindSafe(async { handler.call(&mut *req, &mut *res, next).await })
        .catch_unwind()
        .await;

    let err = match outcome {
        Ok(Ok(())) => return,
        Ok(Err(err)) => err,
        Err(payload) => RouteError::from_panic(payload),
    };
    emit_error(req, res, &err);
}

/// Walk the whole chain for one request.
pub(crate) async fn execute(chain: &Chain<'_>, req: &mut Request, res: &mut Response) {
    Next::start(chain).run(req, res).await;
}
