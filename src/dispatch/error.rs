//! Route errors and the terminal error response.

use std::any::Any;

use axum::http::StatusCode;
use thiserror::Error;

use crate::http::{Request, Response};

/// Boxed error accepted from handler code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error raised inside a middleware or route handler.
///
/// Every variant funnels into the same terminal handler: one 500 response
/// with a `text/plain` body of `Error: <message>`.
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("{0}")]
    Message(String),

    /// The handler panicked; the payload is rendered as text.
    #[error("handler panicked: {0}")]
    Panic(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] BoxError),
}

impl RouteError {
    pub fn new(message: impl Into<String>) -> Self {
        Self::Message(message.into())
    }

    pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic payload".to_string()
        };
        Self::Panic(message)
    }
}

impl From<String> for RouteError {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<&str> for RouteError {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

/// Body written for a failed request.
pub fn error_body(err: &RouteError) -> String {
    format!("Error: {err}")
}

/// Log `err` and emit the 500 response unless one was already sent.
pub(crate) fn emit_error(req: &Request, res: &mut Response, err: &RouteError) {
    tracing::error!(
        method = %req.method(),
        path = %req.path(),
        error = %err,
        "Request handler failed"
    );

    if res.is_sent() {
        tracing::warn!(
            path = %req.path(),
            "Response already sent, error response suppressed"
        );
        return;
    }

    res.status(StatusCode::INTERNAL_SERVER_ERROR)
        .set("content-type", "text/plain")
        .send(error_body(err));
}
