//! A small API client bound to one base URL.

use axum::http::Method;
use url::Url;

use crate::client::options::{BodyType, FetchOptions, Protocol, RequestBody};
use crate::client::{fetch_url, FetchError, FetchResponse};
use crate::config::ClientConfig;

/// Resolves paths against a base URL and sends JSON-typed requests with a
/// fixed set of default headers.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: Url,
    headers: Vec<(String, String)>,
    timeout_ms: u64,
    reject_unauthorized: bool,
    alpn_protocols: Vec<String>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, FetchError> {
        Self::with_config(base_url, &ClientConfig::default())
    }

    pub fn with_config(base_url: &str, config: &ClientConfig) -> Result<Self, FetchError> {
        let base = Url::parse(base_url).map_err(|source| FetchError::InvalidUrl {
            url: base_url.to_string(),
            source,
        })?;
        Ok(Self {
            base,
            headers: Vec::new(),
            timeout_ms: config.timeout_ms,
            reject_unauthorized: config.reject_unauthorized,
            alpn_protocols: config.alpn_protocols.clone(),
        })
    }

    /// Add a header sent with every request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// `path` joined onto the base URL with standard relative-reference rules.
    pub fn resolve(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(|source| FetchError::InvalidUrl {
            url: path.to_string(),
            source,
        })
    }

    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        headers: &[(&str, &str)],
    ) -> Result<FetchResponse, FetchError> {
        let url = self.resolve(path)?;
        let protocol = if url.scheme() == "https" {
            Protocol::Https
        } else {
            Protocol::Http
        };

        let mut options = FetchOptions {
            method,
            headers: headers
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            body,
            body_type: BodyType::Json,
            protocol,
            timeout_ms: self.timeout_ms,
            reject_unauthorized: self.reject_unauthorized,
            alpn_protocols: self.alpn_protocols.clone(),
            signal: None,
        };
        for (name, value) in &self.headers {
            if !options.has_header(name) {
                options.headers.push((name.clone(), value.clone()));
            }
        }
        fetch_url(url, options).await
    }

    pub async fn get(&self, path: &str) -> Result<FetchResponse, FetchError> {
        self.request(Method::GET, path, None, &[]).await
    }

    pub async fn post(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
    ) -> Result<FetchResponse, FetchError> {
        self.request(Method::POST, path, Some(body.into()), &[]).await
    }

    pub async fn put(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
    ) -> Result<FetchResponse, FetchError> {
        self.request(Method::PUT, path, Some(body.into()), &[]).await
    }

    pub async fn patch(
        &self,
        path: &str,
        body: impl Into<RequestBody>,
    ) -> Result<FetchResponse, FetchError> {
        self.request(Method::PATCH, path, Some(body.into()), &[]).await
    }

    pub async fn delete(&self, path: &str) -> Result<FetchResponse, FetchError> {
        self.request(Method::DELETE, path, None, &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_follows_url_join() {
        let client = ApiClient::new("http://api.local/v1/").unwrap();
        assert_eq!(client.resolve("users").unwrap().as_str(), "http://api.local/v1/users");
        assert_eq!(client.resolve("/health").unwrap().as_str(), "http://api.local/health");

        let client = ApiClient::new("http://api.local/v1").unwrap();
        assert_eq!(client.resolve("users").unwrap().as_str(), "http://api.local/users");
    }

    #[test]
    fn test_config_defaults_carried() {
        let config = ClientConfig {
            timeout_ms: 250,
            reject_unauthorized: false,
            alpn_protocols: vec!["http/1.1".into()],
        };
        let client = ApiClient::with_config("https://api.local/", &config).unwrap();
        assert_eq!(client.timeout_ms, 250);
        assert!(!client.reject_unauthorized);
    }

    #[test]
    fn test_invalid_base() {
        assert!(matches!(
            ApiClient::new("not a url"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }
}
