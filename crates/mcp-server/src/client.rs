//! HTTP client for the backend that tool calls are proxied to

use reqwest::{Client, Method, RequestBuilder};
use std::time::Duration;
use url::Url;

use crate::error::{Result, ServerError};

/// Reusable async HTTP client bound to a backend base address.
///
/// Construction performs no network I/O; connections are opened lazily by
/// the first request.
#[derive(Debug, Clone)]
pub struct BackendClient {
    http: Client,
    base_url: String,
    url: Url,
    timeout: Duration,
}

impl BackendClient {
    /// Create a client for `base_url` applying `timeout` to every request
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let trimmed = base_url.trim().trim_end_matches('/');
        let url = Url::parse(trimmed).map_err(|e| ServerError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            return Err(ServerError::InvalidBaseUrl {
                url: base_url.to_string(),
                reason: "expected an absolute http(s) URL".to_string(),
            });
        }

        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ServerError::ClientBuild)?;

        Ok(Self {
            http,
            base_url: trimmed.to_string(),
            url,
            timeout,
        })
    }

    /// Base address as configured, without a trailing slash
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Timeout applied to each request
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Build a URL by appending already-substituted path segments to the base address.
    /// Each segment is percent-encoded.
    pub fn endpoint<'s>(&self, segments: impl IntoIterator<Item = &'s str>) -> Url {
        let mut url = self.url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// Start a request against an absolute URL produced by [`Self::endpoint`]
    pub fn request(&self, method: Method, url: Url) -> RequestBuilder {
        self.http.request(method, url)
    }
}
