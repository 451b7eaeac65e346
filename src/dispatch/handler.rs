//! The handler abstraction shared by middlewares, route handlers and the
//! not-found fallback.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use axum::http::StatusCode;

use crate::dispatch::error::RouteError;
use crate::dispatch::next::Next;
use crate::http::{Request, Response};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Outcome of one middleware or handler call. `Err` is the error channel:
/// it stops the chain and produces the 500 response.
pub type HandlerResult = Result<(), RouteError>;

/// A middleware or route handler.
///
/// Call `next.run(req, res).await` to continue the chain; code after the
/// await observes everything the inner layers did. Returning without
/// calling `next` stops the chain.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult>;
}

pub type BoxedHandler = Arc<dyn Handler>;

/// Box a handler for a multi-handler route list.
pub fn boxed<H: Handler>(handler: H) -> BoxedHandler {
    Arc::new(handler)
}

/// Adapter turning a closure into a [`Handler`].
pub struct HandlerFn<F> {
    f: F,
}

/// Wrap a closure as a handler.
///
/// ```ignore
/// router.get("/hello", handler_fn(|_req, res, _next| Box::pin(async move {
///     res.text("hello");
///     Ok(())
/// })));
/// ```
pub fn handler_fn<F>(f: F) -> HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    HandlerFn { f }
}

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut Request, &'a mut Response, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.f)(req, res, next)
    }
}

/// Default fallback: `404`, `text/plain`, `Not Found`.
#[derive(Debug, Clone, Copy, Default)]
pub struct NotFound;

impl Handler for NotFound {
    fn call<'a>(
        &'a self,
        _req: &'a mut Request,
        res: &'a mut Response,
        _next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            if !res.is_sent() {
                res.status(StatusCode::NOT_FOUND)
                    .set("content-type", "text/plain")
                    .send("Not Found");
            }
            Ok(())
        })
    }
}
