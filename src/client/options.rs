//! Per-request client options.

use std::fmt;
use std::pin::Pin;

use axum::http::Method;
use bytes::Bytes;
use futures_util::Stream;

use crate::resilience::AbortSignal;

/// A streaming request or response body.
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, std::io::Error>> + Send>>;

/// Requested wire protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Protocol {
    #[default]
    Http,
    Https,
    /// HTTP/2; honored for `https` URLs only.
    Http2,
}

/// How the body is labelled and how the response is delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BodyType {
    #[default]
    Json,
    Binary,
    Text,
    /// Resolve as soon as the response head arrives and stream the body.
    Sockets,
}

impl BodyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BodyType::Json => "json",
            BodyType::Binary => "binary",
            BodyType::Text => "text",
            BodyType::Sockets => "sockets",
        }
    }

    /// `Content-Type` applied when the caller set none and a body is present.
    pub fn default_content_type(&self) -> Option<&'static str> {
        match self {
            BodyType::Json => Some("application/json"),
            BodyType::Binary => Some("application/octet-stream"),
            BodyType::Text | BodyType::Sockets => None,
        }
    }
}

/// Request payload, written in this priority: raw bytes or text as-is,
/// then a piped stream, then a JSON-serialized value.
pub enum RequestBody {
    Bytes(Bytes),
    Text(String),
    Stream(BodyStream),
    Json(serde_json::Value),
}

impl fmt::Debug for RequestBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestBody::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            RequestBody::Text(text) => f.debug_tuple("Text").field(&text.len()).finish(),
            RequestBody::Stream(_) => f.write_str("Stream(..)"),
            RequestBody::Json(value) => f.debug_tuple("Json").field(value).finish(),
        }
    }
}

impl From<Bytes> for RequestBody {
    fn from(bytes: Bytes) -> Self {
        RequestBody::Bytes(bytes)
    }
}

impl From<Vec<u8>> for RequestBody {
    fn from(bytes: Vec<u8>) -> Self {
        RequestBody::Bytes(bytes.into())
    }
}

impl From<String> for RequestBody {
    fn from(text: String) -> Self {
        RequestBody::Text(text)
    }
}

impl From<&str> for RequestBody {
    fn from(text: &str) -> Self {
        RequestBody::Text(text.to_string())
    }
}

impl From<serde_json::Value> for RequestBody {
    fn from(value: serde_json::Value) -> Self {
        RequestBody::Json(value)
    }
}

/// Options for a single `fetch`.
#[derive(Debug)]
pub struct FetchOptions {
    pub method: Method,
    /// Extra request headers, in send order.
    pub headers: Vec<(String, String)>,
    pub body: Option<RequestBody>,
    pub body_type: BodyType,
    pub protocol: Protocol,
    /// Deadline in milliseconds; 0 disables it.
    pub timeout_ms: u64,
    pub reject_unauthorized: bool,
    /// ALPN ids offered on the HTTP/2 transport.
    pub alpn_protocols: Vec<String>,
    pub signal: Option<AbortSignal>,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            method: Method::GET,
            headers: Vec::new(),
            body: None,
            body_type: BodyType::default(),
            protocol: Protocol::default(),
            timeout_ms: 0,
            reject_unauthorized: true,
            alpn_protocols: vec!["h2".to_string(), "http/1.1".to_string()],
            signal: None,
        }
    }
}

impl FetchOptions {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            ..Self::default()
        }
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: impl Into<RequestBody>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn body_type(mut self, body_type: BodyType) -> Self {
        self.body_type = body_type;
        self
    }

    pub fn protocol(mut self, protocol: Protocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn reject_unauthorized(mut self, reject: bool) -> Self {
        self.reject_unauthorized = reject;
        self
    }

    pub fn signal(mut self, signal: AbortSignal) -> Self {
        self.signal = Some(signal);
        self
    }

    /// Whether the caller already supplied a header named `name`.
    pub fn has_header(&self, name: &str) -> bool {
        self.headers.iter().any(|(k, _)| k.eq_ignore_ascii_case(name))
    }
}
