//! Client-side error taxonomy.

use thiserror::Error;

/// Why a fetch failed.
///
/// `Aborted` is the only variant produced by a timeout or an explicit
/// cancellation; every other variant is a transport or usage failure.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("The operation was aborted")]
    Aborted,

    #[error("invalid URL `{url}`: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported URL scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("invalid header `{0}`")]
    InvalidHeader(String),

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS error: {0}")]
    Tls(String),

    #[error("HTTP handshake failed: {0}")]
    Handshake(#[source] hyper::Error),

    #[error("request failed: {0}")]
    Request(#[source] hyper::Error),

    #[error("failed to read response body: {0}")]
    Body(#[source] std::io::Error),

    #[error("Body has already been consumed")]
    BodyConsumed,

    #[error("Response body is not a stream")]
    NotAStream,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

impl FetchError {
    /// Whether this error came from a timeout or an abort signal.
    pub fn is_abort(&self) -> bool {
        matches!(self, FetchError::Aborted)
    }
}
