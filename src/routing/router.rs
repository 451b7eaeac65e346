//! Route registration and request dispatch.
//!
//! # Responsibilities
//! - Collect global middlewares and per-method routes at startup
//! - Look up the matching route for a request
//! - Run the middleware chain for one request
//!
//! # Design Decisions
//! - Mutated only while building; the server freezes it behind an `Arc`
//! - `handle` never fails: every error becomes an emitted response

use std::sync::Arc;

use axum::http::Method;

use crate::dispatch::next::{execute, Chain};
use crate::dispatch::{BoxedHandler, Handler};
use crate::http::{Request, Response};
use crate::routing::matcher::{Matcher, RouteMatch};
use crate::routing::pattern::PatternError;
use crate::routing::table::RouteTable;

#[derive(Default)]
pub struct Router {
    table: RouteTable,
    middlewares: Vec<BoxedHandler>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a global middleware; it runs for every request, before route
    /// handlers, in registration order.
    pub fn use_middleware<H: Handler>(&mut self, middleware: H) -> &mut Self {
        self.middlewares.push(Arc::new(middleware));
        self
    }

    /// Register an ordered handler list for `method` and `path`.
    ///
    /// # Panics
    /// Panics if `path` is not a valid template. See [`Router::try_route`].
    pub fn route(&mut self, method: Method, path: &str, handlers: Vec<BoxedHandler>) -> &mut Self {
        if let Err(err) = self.try_route(method, path, handlers) {
            panic!("{err}");
        }
        self
    }

    /// Register an ordered handler list, reporting invalid templates.
    pub fn try_route(
        &mut self,
        method: Method,
        path: &str,
        handlers: Vec<BoxedHandler>,
    ) -> Result<&mut Self, PatternError> {
        self.table.add(method, path, handlers)?;
        Ok(self)
    }

    pub fn get<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::GET, path, vec![Arc::new(handler)])
    }

    pub fn post<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::POST, path, vec![Arc::new(handler)])
    }

    pub fn put<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::PUT, path, vec![Arc::new(handler)])
    }

    pub fn delete<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::DELETE, path, vec![Arc::new(handler)])
    }

    pub fn patch<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::PATCH, path, vec![Arc::new(handler)])
    }

    pub fn head<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::HEAD, path, vec![Arc::new(handler)])
    }

    pub fn options<H: Handler>(&mut self, path: &str, handler: H) -> &mut Self {
        self.route(Method::OPTIONS, path, vec![Arc::new(handler)])
    }

    pub fn routes(&self) -> &RouteTable {
        &self.table
    }

    pub fn middleware_count(&self) -> usize {
        self.middlewares.len()
    }

    /// First route matching `method` and `target`.
    pub fn match_route(&self, method: &Method, target: &str) -> Option<RouteMatch<'_>> {
        Matcher::new(&self.table).find(method, target)
    }

    /// Run the chain for one request. `not_found` is invoked when the global
    /// middlewares complete and no route matched.
    pub async fn handle(&self, req: &mut Request, res: &mut Response, not_found: &dyn Handler) {
        let target = req.url();
        let route = self.match_route(req.method(), &target);
        let chain = Chain {
            middlewares: &self.middlewares,
            route,
            not_found,
        };
        execute(&chain, req, res).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use axum::http::StatusCode;

    use crate::dispatch::{boxed, handler_fn, BoxFuture, HandlerResult, Next, NotFound, RouteError};

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records entry and exit around `next`.
    struct Record {
        name: &'static str,
        log: Log,
    }

    impl Handler for Record {
        fn call<'a>(
            &'a self,
            req: &'a mut Request,
            res: &'a mut Response,
            next: Next<'a>,
        ) -> BoxFuture<'a, HandlerResult> {
            Box::pin(async move {
                self.log.lock().unwrap().push(format!("{}-start", self.name));
                next.run(req, res).await;
                self.log.lock().unwrap().push(format!("{}-end", self.name));
                Ok(())
            })
        }
    }

    fn record(name: &'static str, log: &Log) -> Record {
        Record {
            name,
            log: log.clone(),
        }
    }

    fn leaf(name: &'static str, log: &Log) -> impl Handler {
        let log = log.clone();
        handler_fn(move |_req, res, _next| {
            let log = log.clone();
            Box::pin(async move {
                log.lock().unwrap().push(name.to_string());
                res.text(name);
                Ok(())
            })
        })
    }

    async fn dispatch(router: &Router, method: Method, uri: &str) -> Response {
        let mut req = Request::new(method, uri);
        let mut res = Response::new();
        router.handle(&mut req, &mut res, &NotFound).await;
        res
    }

    #[tokio::test]
    async fn test_onion_order() {
        let log = Log::default();
        let mut router = Router::new();
        router
            .use_middleware(record("A", &log))
            .use_middleware(record("B", &log))
            .get("/", leaf("H", &log));

        let res = dispatch(&router, Method::GET, "/").await;

        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(
            *log.lock().unwrap(),
            vec!["A-start", "B-start", "H", "B-end", "A-end"]
        );
    }

    #[tokio::test]
    async fn test_params_visible_to_handler_only() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut router = Router::new();

        let in_middleware = seen.clone();
        router.use_middleware(handler_fn(move |req, res, next| {
            let seen = in_middleware.clone();
            Box::pin(async move {
                seen.lock().unwrap().push(req.params.len());
                next.run(req, res).await;
                Ok(())
            })
        }));
        router.get(
            "/user/:id/:action",
            handler_fn(|req, res, _next| {
                Box::pin(async move {
                    let body = format!(
                        "{}:{}",
                        req.param("id").unwrap_or_default(),
                        req.param("action").unwrap_or_default()
                    );
                    res.text(body);
                    Ok(())
                })
            }),
        );

        let res = dispatch(&router, Method::GET, "/user/123/profile").await;
        assert_eq!(res.body().as_ref(), b"123:profile");
        assert_eq!(*seen.lock().unwrap(), vec![0]);
    }

    #[tokio::test]
    async fn test_middleware_error_short_circuits() {
        let log = Log::default();
        let mut router = Router::new();
        router
            .use_middleware(record("A", &log))
            .use_middleware(handler_fn(|_req, _res, _next| {
                Box::pin(async move { Err(RouteError::new("denied")) })
            }))
            .use_middleware(record("C", &log))
            .get("/", leaf("H", &log));

        let res = dispatch(&router, Method::GET, "/").await;

        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body().as_ref(), b"Error: denied");
        assert_eq!(*log.lock().unwrap(), vec!["A-start", "A-end"]);
    }

    fn explode() -> HandlerResult {
        panic!("kaboom")
    }

    #[tokio::test]
    async fn test_panic_becomes_error_response() {
        let mut router = Router::new();
        router.get(
            "/boom",
            handler_fn(|_req, _res, _next| Box::pin(async move { explode() })),
        );

        let res = dispatch(&router, Method::GET, "/boom").await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body().as_ref(), b"Error: handler panicked: kaboom");
    }

    #[tokio::test]
    async fn test_panic_before_boxing_becomes_error_response() {
        let log = Log::default();
        let mut router = Router::new();
        router.use_middleware(record("A", &log)).get(
            "/n/:n",
            handler_fn(|req, res, _next| {
                let n: u32 = req.param("n").unwrap_or_default().parse().unwrap();
                Box::pin(async move {
                    res.text(n.to_string());
                    Ok(())
                })
            }),
        );

        let res = dispatch(&router, Method::GET, "/n/7").await;
        assert_eq!(res.body().as_ref(), b"7");

        let res = dispatch(&router, Method::GET, "/n/abc").await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(res.body().starts_with(b"Error: handler panicked:"));
        assert_eq!(
            *log.lock().unwrap(),
            vec!["A-start", "A-end", "A-start", "A-end"]
        );
    }

    #[tokio::test]
    async fn test_explicit_fail_on_next() {
        let mut router = Router::new();
        router.use_middleware(handler_fn(|req, res, next| {
            Box::pin(async move {
                next.fail(req, res, "rejected by middleware");
                Ok(())
            })
        }));
        router.get("/", NotFound);

        let res = dispatch(&router, Method::GET, "/").await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(res.body().as_ref(), b"Error: rejected by middleware");
    }

    #[tokio::test]
    async fn test_not_found_invoked_exactly_when_unmatched() {
        let hits = Arc::new(Mutex::new(0_u32));
        let counter = hits.clone();
        let fallback = handler_fn(move |_req, res, _next| {
            let counter = counter.clone();
            Box::pin(async move {
                *counter.lock().unwrap() += 1;
                res.status(StatusCode::NOT_FOUND).text("custom");
                Ok(())
            })
        });

        let log = Log::default();
        let mut router = Router::new();
        router.get("/known", leaf("H", &log));

        let mut req = Request::new(Method::POST, "/known");
        let mut res = Response::new();
        router.handle(&mut req, &mut res, &fallback).await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(*hits.lock().unwrap(), 1);

        let mut req = Request::new(Method::GET, "/known");
        let mut res = Response::new();
        router.handle(&mut req, &mut res, &fallback).await;
        assert_eq!(res.status_code(), StatusCode::OK);
        assert_eq!(*hits.lock().unwrap(), 1);
        assert!(log.lock().unwrap().contains(&"H".to_string()));
    }

    #[tokio::test]
    async fn test_default_not_found_response() {
        let router = Router::new();
        let res = dispatch(&router, Method::GET, "/missing").await;
        assert_eq!(res.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(res.header("content-type"), Some("text/plain"));
        assert_eq!(res.body().as_ref(), b"Not Found");
    }

    #[tokio::test]
    async fn test_middleware_can_stop_chain() {
        let log = Log::default();
        let mut router = Router::new();
        router
            .use_middleware(handler_fn(|_req, res, _next| {
                Box::pin(async move {
                    res.status(StatusCode::UNAUTHORIZED).text("stop");
                    Ok(())
                })
            }))
            .get("/", leaf("H", &log));

        let res = dispatch(&router, Method::GET, "/").await;
        assert_eq!(res.status_code(), StatusCode::UNAUTHORIZED);
        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_route_handlers_nest() {
        let log = Log::default();
        let mut router = Router::new();
        router.use_middleware(record("G", &log)).route(
            Method::GET,
            "/multi",
            vec![boxed(record("R1", &log)), boxed(record("R2", &log)), boxed(leaf("H", &log))],
        );

        let res = dispatch(&router, Method::GET, "/multi").await;
        assert_eq!(res.body().as_ref(), b"H");
        assert_eq!(
            *log.lock().unwrap(),
            vec!["G-start", "R1-start", "R2-start", "H", "R2-end", "R1-end", "G-end"]
        );
    }

    #[tokio::test]
    async fn test_handler_error_after_send_keeps_first_response() {
        let mut router = Router::new();
        router.get(
            "/",
            handler_fn(|_req, res, _next| {
                Box::pin(async move {
                    res.status(StatusCode::CREATED).text("created");
                    Err(RouteError::new("after send"))
                })
            }),
        );

        let res = dispatch(&router, Method::GET, "/").await;
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.body().as_ref(), b"created");
    }

    #[tokio::test]
    async fn test_error_in_route_handler_skips_later_handlers() {
        let log = Log::default();
        let mut router = Router::new();
        router.route(
            Method::DELETE,
            "/item/:id",
            vec![
                boxed(handler_fn(|_req, _res, _next| {
                    Box::pin(async move { Err(RouteError::new("locked")) })
                })),
                boxed(leaf("H", &log)),
            ],
        );

        let res = dispatch(&router, Method::DELETE, "/item/9").await;
        assert_eq!(res.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(log.lock().unwrap().is_empty());
    }

    #[test]
    fn test_try_route_reports_invalid_template() {
        let mut router = Router::new();
        assert!(router.try_route(Method::GET, "/:", Vec::new()).is_err());
        assert!(router.try_route(Method::GET, "/ok", Vec::new()).is_ok());
        assert_eq!(router.routes().len(), 1);
    }

    #[test]
    #[should_panic(expected = "empty parameter name")]
    fn test_route_panics_on_invalid_template() {
        Router::new().route(Method::GET, "/a/:", Vec::new());
    }

    #[tokio::test]
    async fn test_concurrent_requests_do_not_share_position() {
        let mut router = Router::new();
        router.use_middleware(handler_fn(|req, res, next| {
            Box::pin(async move {
                if req.path() == "/slow" {
                    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
                }
                next.run(req, res).await;
                Ok(())
            })
        }));
        router.get(
            "/:name",
            handler_fn(|req, res, _next| {
                Box::pin(async move {
                    let name = req.param("name").unwrap_or_default().to_string();
                    res.text(name);
                    Ok(())
                })
            }),
        );

        let router = Arc::new(router);
        let (slow, fast) = tokio::join!(
            dispatch(&router, Method::GET, "/slow"),
            dispatch(&router, Method::GET, "/fast")
        );
        assert_eq!(slow.body().as_ref(), b"slow");
        assert_eq!(fast.body().as_ref(), b"fast");
    }
}
