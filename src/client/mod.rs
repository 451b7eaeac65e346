//! HTTP client subsystem.
//!
//! # Data Flow
//! ```text
//! fetch(url, options)
//!     → transport.rs (scheme + protocol → HTTP/1.1 | HTTPS | HTTP/2)
//!     → resilience::timeouts (deadline / abort signal race)
//!     → tls.rs (rustls handshake, ALPN)
//!     → transport.rs (write body, read head)
//!     → response.rs (buffered or streaming FetchResponse)
//! ```
//!
//! # Design Decisions
//! - No retries and no connection pooling
//! - An abort always reports "The operation was aborted"; every other
//!   failure has its own message
//! - Verb helpers are thin wrappers with a fixed method

pub mod api;
pub mod error;
pub mod options;
pub mod response;
pub mod tls;
pub mod transport;

use std::time::Instant;

use axum::http::Method;
use url::Url;

use crate::observability::metrics;
use crate::resilience::with_deadline;

pub use api::ApiClient;
pub use error::FetchError;
pub use options::{BodyStream, BodyType, FetchOptions, Protocol, RequestBody};
pub use response::{FetchResponse, ResponseBody, ResponseStream};
pub use transport::{select_transport, TransportKind};

/// Issue one request and normalize the response.
pub async fn fetch(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    let parsed = Url::parse(url).map_err(|source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    })?;
    fetch_url(parsed, options).await
}

pub(crate) async fn fetch_url(url: Url, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    let start = Instant::now();
    let kind = select_transport(&url, options.protocol)?;
    let timeout_ms = options.timeout_ms;
    let signal = options.signal.clone();

    tracing::debug!(
        method = %options.method,
        url = %url,
        transport = kind.as_str(),
        timeout_ms,
        "Sending request"
    );

    let result = with_deadline(timeout_ms, signal.as_ref(), transport::send(url, kind, options)).await;

    let outcome = match &result {
        Ok(_) => "ok",
        Err(FetchError::Aborted) => "aborted",
        Err(err) => {
            tracing::debug!(error = %err, "Request failed");
            "error"
        }
    };
    metrics::record_fetch(kind.as_str(), outcome, start);
    result
}

async fn fetch_with(method: Method, url: &str, mut options: FetchOptions) -> Result<FetchResponse, FetchError> {
    options.method = method;
    fetch(url, options).await
}

pub async fn get(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    fetch_with(Method::GET, url, options).await
}

pub async fn post(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    fetch_with(Method::POST, url, options).await
}

pub async fn put(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    fetch_with(Method::PUT, url, options).await
}

pub async fn patch(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    fetch_with(Method::PATCH, url, options).await
}

pub async fn delete(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    fetch_with(Method::DELETE, url, options).await
}

pub async fn head(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    fetch_with(Method::HEAD, url, options).await
}

pub async fn options(url: &str, options: FetchOptions) -> Result<FetchResponse, FetchError> {
    fetch_with(Method::OPTIONS, url, options).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let err = fetch("::nope::", FetchOptions::default()).await.unwrap_err();
        assert!(matches!(err, FetchError::InvalidUrl { .. }));
    }

    #[tokio::test]
    async fn test_unsupported_scheme_rejected() {
        let err = get("ftp://example.com/file", FetchOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "unsupported URL scheme `ftp`");
    }

    #[tokio::test]
    async fn test_refused_connection_is_not_an_abort() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = get(&format!("http://{addr}/"), FetchOptions::default().timeout_ms(1000))
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Connect { .. }), "{err}");
        assert_ne!(err.to_string(), "The operation was aborted");
    }
}
