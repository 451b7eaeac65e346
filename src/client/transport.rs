//! Transport selection and the wire exchange.
//!
//! # Responsibilities
//! - Pick HTTP/1.1, HTTPS or HTTP/2 from the URL scheme and options
//! - Connect, run the TLS and HTTP handshakes
//! - Write the request body and normalize the response head
//! - Buffer the body or hand back a live stream (`BodyType::Sockets`)
//!
//! # Design Decisions
//! - One connection per request; nothing is pooled
//! - HTTP/2 over plaintext is not supported; `http` URLs always use HTTP/1.1
//! - When ALPN does not settle on `h2`, the same TLS stream carries HTTP/1.1
//! - The connection driver task is aborted when its owner is dropped

use std::io;

use axum::http::header::{HeaderName, HeaderValue, CONTENT_TYPE, HOST};
use axum::http::{Request, Response, StatusCode};
use bytes::Bytes;
use futures_util::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Empty, Full, StreamBody};
use hyper::body::{Frame, Incoming};
use hyper::client::conn::{http1, http2};
use hyper_util::rt::{TokioExecutor, TokioIo};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use url::{Position, Url};

use crate::client::options::{BodyType, FetchOptions, Protocol, RequestBody};
use crate::client::response::{collect_headers, FetchResponse, ResponseBody, ResponseStream};
use crate::client::{tls, FetchError};

type ReqBody = UnsyncBoxBody<Bytes, io::Error>;

/// Wire transport chosen for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Http1,
    Https,
    Http2,
}

impl TransportKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportKind::Http1 => "http1",
            TransportKind::Https => "https",
            TransportKind::Http2 => "http2",
        }
    }
}

/// HTTP/2 only when explicitly requested on an `https` URL.
pub fn select_transport(url: &Url, protocol: Protocol) -> Result<TransportKind, FetchError> {
    match url.scheme() {
        "http" => {
            if protocol == Protocol::Http2 {
                tracing::debug!(url = %url, "HTTP/2 requested over plaintext, using HTTP/1.1");
            }
            Ok(TransportKind::Http1)
        }
        "https" if protocol == Protocol::Http2 => Ok(TransportKind::Http2),
        "https" => Ok(TransportKind::Https),
        other => Err(FetchError::UnsupportedScheme(other.to_string())),
    }
}

/// Aborts the spawned connection driver on drop.
#[derive(Debug)]
pub(crate) struct ConnectionTask(JoinHandle<()>);

impl Drop for ConnectionTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum Sender {
    Http1(http1::SendRequest<ReqBody>),
    Http2(http2::SendRequest<ReqBody>),
}

impl Sender {
    fn is_http2(&self) -> bool {
        matches!(self, Sender::Http2(_))
    }

    async fn send(&mut self, request: Request<ReqBody>) -> Result<Response<Incoming>, hyper::Error> {
        match self {
            Sender::Http1(sender) => {
                sender.ready().await?;
                sender.send_request(request).await
            }
            Sender::Http2(sender) => {
                sender.ready().await?;
                sender.send_request(request).await
            }
        }
    }
}

/// Perform one request over a fresh connection.
pub(crate) async fn send(
    url: Url,
    kind: TransportKind,
    options: FetchOptions,
) -> Result<FetchResponse, FetchError> {
    let (host, port) = host_and_port(&url)?;
    let addr = format!("{host}:{port}");

    let tcp = TcpStream::connect((host.as_str(), port))
        .await
        .map_err(|source| FetchError::Connect {
            addr: addr.clone(),
            source,
        })?;
    if let Err(err) = tcp.set_nodelay(true) {
        tracing::debug!(addr = %addr, error = %err, "Failed to set TCP_NODELAY");
    }
    tracing::debug!(addr = %addr, transport = kind.as_str(), "Connected");

    let (mut sender, connection) = match kind {
        TransportKind::Http1 => handshake_http1(tcp).await?,
        TransportKind::Https => {
            let connector = tls::connector(&["http/1.1".to_string()], options.reject_unauthorized)?;
            let stream = tls::handshake(&connector, &host, tcp).await?;
            handshake_http1(stream).await?
        }
        TransportKind::Http2 => {
            let connector = tls::connector(&options.alpn_protocols, options.reject_unauthorized)?;
            let stream = tls::handshake(&connector, &host, tcp).await?;
            if tls::negotiated_h2(&stream) {
                handshake_http2(stream).await?
            } else {
                tracing::debug!(addr = %addr, "Server did not negotiate h2, falling back to HTTP/1.1");
                handshake_http1(stream).await?
            }
        }
    };

    let body_type = options.body_type;
    let request = build_request(&url, sender.is_http2(), options)?;
    let response = sender.send(request).await.map_err(FetchError::Request)?;

    normalize(response, url, body_type, connection).await
}

fn host_and_port(url: &Url) -> Result<(String, u16), FetchError> {
    let invalid = |source| FetchError::InvalidUrl {
        url: url.to_string(),
        source,
    };
    let host = match url.host() {
        Some(url::Host::Domain(domain)) => domain.to_string(),
        Some(url::Host::Ipv4(addr)) => addr.to_string(),
        Some(url::Host::Ipv6(addr)) => addr.to_string(),
        None => return Err(invalid(url::ParseError::EmptyHost)),
    };
    let port = url
        .port_or_known_default()
        .ok_or_else(|| invalid(url::ParseError::InvalidPort))?;
    Ok((host, port))
}

async fn handshake_http1<T>(io: T) -> Result<(Sender, ConnectionTask), FetchError>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (sender, conn) = http1::handshake(TokioIo::new(io))
        .await
        .map_err(FetchError::Handshake)?;
    let task = tokio::spawn(async move {
        if let Err(err) = conn.await {
            tracing::debug!(error = %err, "HTTP/1.1 connection closed with error");
        }
    });
    Ok((Sender::Http1(sender), ConnectionTask(task)))
}

async fn handshake_http2<T>(io: T) -> Result<(Sender, ConnectionTask), FetchError>
where
    T: AsyncRead + AsyncWrite + Send + Unpin + 'static,
{
    let (sender, conn) = http2::handshake(TokioExecutor::new(), TokioIo::new(io))
        .await
        .map_err(FetchError::Handshake)?;
    let task = tokio::spawn(async move {
        if let Err(err) = conn.await {
            tracing::debug!(error = %err, "HTTP/2 session closed with error");
        }
    });
    Ok((Sender::Http2(sender), ConnectionTask(task)))
}

/// HTTP/1.1 gets an origin-form target plus `Host`; HTTP/2 gets the
/// absolute URL so hyper can fill in `:scheme` and `:authority`.
fn build_request(url: &Url, http2: bool, options: FetchOptions) -> Result<Request<ReqBody>, FetchError> {
    let target = if http2 {
        &url[..Position::AfterQuery]
    } else {
        &url[Position::BeforePath..Position::AfterQuery]
    };

    let mut builder = Request::builder().method(options.method.clone()).uri(target);
    let headers = builder
        .headers_mut()
        .ok_or_else(|| FetchError::InvalidHeader(target.to_string()))?;

    for (name, value) in &options.headers {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| FetchError::InvalidHeader(name.clone()))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|_| FetchError::InvalidHeader(name.clone()))?;
        headers.append(header_name, header_value);
    }

    if options.body.is_some() && !headers.contains_key(CONTENT_TYPE) {
        if let Some(content_type) = options.body_type.default_content_type() {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        }
    }

    if !http2 && !headers.contains_key(HOST) {
        let authority = &url[Position::BeforeHost..Position::AfterPort];
        let value = HeaderValue::from_str(authority)
            .map_err(|_| FetchError::InvalidHeader(HOST.to_string()))?;
        headers.insert(HOST, value);
    }

    let body = encode_body(options.body)?;
    builder
        .body(body)
        .map_err(|e| FetchError::InvalidHeader(e.to_string()))
}

fn encode_body(body: Option<RequestBody>) -> Result<ReqBody, FetchError> {
    let body = match body {
        None => Empty::<Bytes>::new().map_err(|never| match never {}).boxed_unsync(),
        Some(RequestBody::Bytes(bytes)) => full(bytes),
        Some(RequestBody::Text(text)) => full(Bytes::from(text)),
        Some(RequestBody::Stream(stream)) => StreamBody::new(stream.map_ok(Frame::data)).boxed_unsync(),
        Some(RequestBody::Json(value)) => full(Bytes::from(serde_json::to_vec(&value)?)),
    };
    Ok(body)
}

fn full(bytes: Bytes) -> ReqBody {
    Full::new(bytes).map_err(|never| match never {}).boxed_unsync()
}

/// Reason phrase from the wire, else the canonical one, else `Unknown`.
pub(crate) fn status_text(status: StatusCode, reason: Option<&hyper::ext::ReasonPhrase>) -> String {
    reason
        .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
        .or_else(|| status.canonical_reason().map(str::to_string))
        .unwrap_or_else(|| "Unknown".to_string())
}

async fn normalize(
    response: Response<Incoming>,
    url: Url,
    body_type: BodyType,
    connection: ConnectionTask,
) -> Result<FetchResponse, FetchError> {
    let (parts, incoming) = response.into_parts();
    let status_text = status_text(parts.status, parts.extensions.get::<hyper::ext::ReasonPhrase>());
    let headers = collect_headers(&parts.headers);

    tracing::debug!(status = parts.status.as_u16(), url = %url, "Response head received");

    let body = if body_type == BodyType::Sockets {
        let stream = incoming.into_data_stream().map_err(io::Error::other);
        ResponseBody::Streaming(ResponseStream::new(Box::pin(stream), Some(connection)))
    } else {
        let collected = incoming
            .collect()
            .await
            .map_err(|e| FetchError::Body(io::Error::other(e)))?;
        drop(connection);
        ResponseBody::Buffered(collected.to_bytes())
    };

    Ok(FetchResponse::new(
        parts.status,
        status_text,
        headers,
        url.to_string(),
        body_type,
        body,
    ))
}
