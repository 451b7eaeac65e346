//! Request body parsing middleware.
//!
//! Decodes the buffered body of `POST`, `PUT` and `PATCH` requests by
//! `Content-Type` and stores the result in `Request::parsed_body`.

use axum::http::Method;

use crate::dispatch::{BoxFuture, Handler, HandlerResult, Next};
use crate::http::{Request, Response};

/// A decoded request body.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedBody {
    Json(serde_json::Value),
    /// `application/x-www-form-urlencoded` pairs, in body order.
    Form(Vec<(String, String)>),
    Text(String),
}

impl ParsedBody {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            ParsedBody::Json(value) => Some(value),
            _ => None,
        }
    }

    /// First form value for `key`.
    pub fn form_value(&self, key: &str) -> Option<&str> {
        match self {
            ParsedBody::Form(pairs) => pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            ParsedBody::Text(text) => Some(text),
            _ => None,
        }
    }
}

/// Decode `body` according to `content_type`. Malformed JSON falls back to
/// the raw text.
pub fn parse_body(content_type: Option<&str>, body: &[u8]) -> ParsedBody {
    let text = String::from_utf8_lossy(body);
    let content_type = content_type.unwrap_or_default();

    if content_type.contains("application/json") {
        let source = if text.trim().is_empty() { "{}" } else { text.as_ref() };
        match serde_json::from_str(source) {
            Ok(value) => ParsedBody::Json(value),
            Err(err) => {
                tracing::debug!(error = %err, "Malformed JSON body, keeping raw text");
                ParsedBody::Text(text.into_owned())
            }
        }
    } else if content_type.contains("application/x-www-form-urlencoded") {
        ParsedBody::Form(
            url::form_urlencoded::parse(body)
                .map(|(k, v)| (k.into_owned(), v.into_owned()))
                .collect(),
        )
    } else {
        ParsedBody::Text(text.into_owned())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BodyParser;

pub fn body_parser() -> BodyParser {
    BodyParser
}

impl Handler for BodyParser {
    fn call<'a>(
        &'a self,
        req: &'a mut Request,
        res: &'a mut Response,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            if matches!(*req.method(), Method::POST | Method::PUT | Method::PATCH) {
                let parsed = parse_body(req.header("content-type"), req.body());
                req.parsed_body = Some(parsed);
            }
            next.run(req, res).await;
            Ok(())
        })
    }
}
