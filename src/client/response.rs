//! The normalized client response.
//!
//! # Responsibilities
//! - Expose status, reason text, headers and the final URL uniformly for
//!   every transport
//! - Hold the body either fully buffered or as a live stream
//! - Allow exactly one read of the body
//!
//! # Design Decisions
//! - Header names are Title-Cased; repeated headers are joined with `", "`
//! - Reading takes the body out; a second read is `BodyConsumed`
//! - `stream()` on a buffered body fails without consuming it

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::http::{HeaderMap, StatusCode};
use bytes::{Bytes, BytesMut};
use futures_util::{Stream, StreamExt};
use serde::de::DeserializeOwned;

use crate::client::options::{BodyStream, BodyType};
use crate::client::transport::ConnectionTask;
use crate::client::FetchError;

/// A response body delivered while the connection is still open.
pub struct ResponseStream {
    inner: BodyStream,
    _connection: Option<ConnectionTask>,
}

impl ResponseStream {
    pub(crate) fn new(inner: BodyStream, connection: Option<ConnectionTask>) -> Self {
        Self {
            inner,
            _connection: connection,
        }
    }

    /// Wrap an arbitrary byte stream.
    pub fn from_stream(inner: BodyStream) -> Self {
        Self::new(inner, None)
    }
}

impl Stream for ResponseStream {
    type Item = Result<Bytes, std::io::Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.get_mut().inner.as_mut().poll_next(cx)
    }
}

impl fmt::Debug for ResponseStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream").finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum ResponseBody {
    Buffered(Bytes),
    Streaming(ResponseStream),
}

/// Response returned by [`fetch`](crate::client::fetch).
pub struct FetchResponse {
    status: StatusCode,
    status_text: String,
    headers: Vec<(String, String)>,
    url: String,
    body_type: BodyType,
    body: Option<ResponseBody>,
}

impl FetchResponse {
    pub fn new(
        status: StatusCode,
        status_text: impl Into<String>,
        headers: Vec<(String, String)>,
        url: impl Into<String>,
        body_type: BodyType,
        body: ResponseBody,
    ) -> Self {
        Self {
            status,
            status_text: status_text.into(),
            headers,
            url: url.into(),
            body_type,
            body: Some(body),
        }
    }

    pub fn status(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn status_text(&self) -> &str {
        &self.status_text
    }

    /// `true` for 2xx statuses.
    pub fn ok(&self) -> bool {
        self.status.is_success()
    }

    /// Always `false`: redirects are never followed.
    pub fn redirected(&self) -> bool {
        false
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn body_type(&self) -> BodyType {
        self.body_type
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Header value by case-insensitive name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn body_used(&self) -> bool {
        self.body.is_none()
    }

    pub fn is_stream(&self) -> bool {
        matches!(self.body, Some(ResponseBody::Streaming(_)))
    }

    fn take_body(&mut self) -> Result<ResponseBody, FetchError> {
        self.body.take().ok_or(FetchError::BodyConsumed)
    }

    /// Whole body as bytes; drains a streaming body.
    pub async fn bytes(&mut self) -> Result<Bytes, FetchError> {
        match self.take_body()? {
            ResponseBody::Buffered(bytes) => Ok(bytes),
            ResponseBody::Streaming(mut stream) => {
                let mut buf = BytesMut::new();
                while let Some(chunk) = stream.next().await {
                    buf.extend_from_slice(&chunk.map_err(FetchError::Body)?);
                }
                Ok(buf.freeze())
            }
        }
    }

    /// Body decoded as UTF-8 (lossy).
    pub async fn text(&mut self) -> Result<String, FetchError> {
        let bytes = self.bytes().await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    pub async fn json<T: DeserializeOwned>(&mut self) -> Result<T, FetchError> {
        let bytes = self.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// The live body stream. Only available for `BodyType::Sockets`.
    pub fn stream(&mut self) -> Result<ResponseStream, FetchError> {
        if matches!(self.body, Some(ResponseBody::Buffered(_))) {
            return Err(FetchError::NotAStream);
        }
        match self.take_body()? {
            ResponseBody::Streaming(stream) => Ok(stream),
            ResponseBody::Buffered(_) => Err(FetchError::NotAStream),
        }
    }

    /// Copy of an unread, buffered response.
    pub fn try_clone(&self) -> Result<Self, FetchError> {
        match &self.body {
            None => Err(FetchError::BodyConsumed),
            Some(ResponseBody::Streaming(_)) => Err(FetchError::NotAStream),
            Some(ResponseBody::Buffered(bytes)) => Ok(Self {
                status: self.status,
                status_text: self.status_text.clone(),
                headers: self.headers.clone(),
                url: self.url.clone(),
                body_type: self.body_type,
                body: Some(ResponseBody::Buffered(bytes.clone())),
            }),
        }
    }
}

impl fmt::Debug for FetchResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FetchResponse")
            .field("status", &self.status.as_u16())
            .field("status_text", &self.status_text)
            .field("url", &self.url)
            .field("body_type", &self.body_type)
            .field("body_used", &self.body_used())
            .finish()
    }
}

/// `content-type` → `Content-Type`.
pub fn title_case(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Flatten a header map into Title-Cased names, first-seen order, repeated
/// values joined with `", "`.
pub fn collect_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    headers
        .keys()
        .map(|name| {
            let joined = headers
                .get_all(name)
                .iter()
                .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
                .collect::<Vec<_>>()
                .join(", ");
            (title_case(name.as_str()), joined)
        })
        .collect()
}
