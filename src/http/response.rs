//! Outbound response written by middlewares and route handlers.
//!
//! # Responsibilities
//! - Collect status, headers and body for the listening layer
//! - Track whether a response has been emitted
//!
//! # Design Decisions
//! - First `send` wins; later sends are logged and dropped
//! - Status and headers freeze with the body once sent
//! - Conversion to a hyper response happens once, after the chain ends

use axum::http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode};
use bytes::Bytes;
use serde::Serialize;

#[derive(Debug, Default)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Bytes,
    sent: bool,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&mut self, status: StatusCode) -> &mut Self {
        if self.sent {
            tracing::warn!(sent = %self.status, ignored = %status, "Response already sent, keeping status");
            return self;
        }
        self.status = status;
        self
    }

    pub fn status_code(&self) -> StatusCode {
        self.status
    }

    /// Set a header. Invalid names or values are ignored with a warning.
    pub fn set(&mut self, name: &str, value: &str) -> &mut Self {
        if self.sent {
            tracing::warn!(header = %name, "Response already sent, ignoring header");
            return self;
        }
        match (
            HeaderName::try_from(name),
            HeaderValue::try_from(value),
        ) {
            (Ok(name), Ok(value)) => {
                self.headers.insert(name, value);
            }
            _ => tracing::warn!(header = %name, "Ignoring invalid response header"),
        }
        self
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Emit the body. Only the first call takes effect.
    pub fn send(&mut self, body: impl Into<Bytes>) {
        if self.sent {
            tracing::warn!(status = %self.status, "Response already sent, dropping body");
            return;
        }
        self.body = body.into();
        self.sent = true;
    }

    /// Emit a plain-text body.
    pub fn text(&mut self, body: impl Into<String>) {
        if !self.sent && !self.headers.contains_key(header::CONTENT_TYPE) {
            self.headers.insert(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; charset=utf-8"),
            );
        }
        self.send(body.into());
    }

    /// Emit a JSON body.
    pub fn json<T: Serialize>(&mut self, value: &T) -> Result<(), serde_json::Error> {
        let body = serde_json::to_vec(value)?;
        if self.sent {
            tracing::warn!(status = %self.status, "Response already sent, dropping JSON body");
            return Ok(());
        }
        self.headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.send(body);
        Ok(())
    }

    /// Emit an empty body.
    pub fn end(&mut self) {
        self.send(Bytes::new());
    }

    /// Whether a response has been emitted.
    pub fn is_sent(&self) -> bool {
        self.sent
    }

    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Convert into an `http` response for the listening layer.
    pub fn into_http(self) -> axum::http::Response<Bytes> {
        let mut response = axum::http::Response::new(self.body);
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_send_wins() {
        let mut res = Response::new();
        assert!(!res.is_sent());

        res.status(StatusCode::CREATED).send("first");
        res.status(StatusCode::INTERNAL_SERVER_ERROR).send("second");

        assert!(res.is_sent());
        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.body().as_ref(), b"first");
    }

    #[test]
    fn test_sent_response_keeps_status_and_headers() {
        let mut res = Response::new();
        res.status(StatusCode::CREATED)
            .set("content-type", "text/plain")
            .send("created");

        res.status(StatusCode::INTERNAL_SERVER_ERROR)
            .set("content-type", "application/json")
            .set("x-late", "1");
        res.json(&serde_json::json!({ "late": true })).unwrap();
        res.text("later");

        assert_eq!(res.status_code(), StatusCode::CREATED);
        assert_eq!(res.header("content-type"), Some("text/plain"));
        assert_eq!(res.header("x-late"), None);
        assert_eq!(res.body().as_ref(), b"created");
    }

    #[test]
    fn test_text_and_json_set_content_type() {
        let mut res = Response::new();
        res.text("hi");
        assert_eq!(res.header("content-type"), Some("text/plain; charset=utf-8"));

        let mut res = Response::new();
        res.json(&serde_json::json!({ "ok": true })).unwrap();
        assert_eq!(res.header("content-type"), Some("application/json"));
        assert_eq!(res.body().as_ref(), br#"{"ok":true}"#);
    }

    #[test]
    fn test_into_http() {
        let mut res = Response::new();
        res.status(StatusCode::ACCEPTED).set("x-trace", "abc").end();

        let http = res.into_http();
        assert_eq!(http.status(), StatusCode::ACCEPTED);
        assert_eq!(http.headers()["x-trace"], "abc");
    }
}
