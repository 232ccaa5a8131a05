//! Request and response values exchanged across the fetch interception
//! boundary.

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::NetworkError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Method {
    Get,
    Head,
    Post,
}

impl Method {
    pub fn as_reqwest(&self) -> reqwest::Method {
        match self {
            Method::Get => reqwest::Method::GET,
            Method::Head => reqwest::Method::HEAD,
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// How a request interacts with intermediary HTTP caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    #[default]
    Default,
    /// Always revalidate against the origin server
    Reload,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: Method,
    /// Absolute URL, or a path relative to the origin
    pub url: String,
    pub cache_mode: CacheMode,
}

impl Request {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            url: url.into(),
            cache_mode: CacheMode::Default,
        }
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self {
            method: Method::Post,
            url: url.into(),
            cache_mode: CacheMode::Default,
        }
    }

    pub fn with_cache_mode(mut self, mode: CacheMode) -> Self {
        self.cache_mode = mode;
        self
    }

    /// Key this request is stored under, relative to `origin`
    pub fn cache_key(&self, origin: &Url) -> Result<String, NetworkError> {
        cache_key(origin, &self.url)
    }
}

/// Where a response came from, mirroring the fetch response types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseKind {
    /// Same-origin network response
    Basic,
    /// Cross-origin network response
    Cors,
    /// Synthesised locally
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    pub status: u16,
    pub kind: ResponseKind,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Response {
    pub fn new(status: u16, kind: ResponseKind, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            kind,
            content_type: None,
            body: body.into(),
        }
    }

    /// Locally built plain-text response
    pub fn text(body: &str) -> Self {
        Self {
            status: 200,
            kind: ResponseKind::Default,
            content_type: Some("text/plain;charset=UTF-8".to_string()),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Only complete same-origin responses are written back into the cache
    pub fn is_cacheable(&self) -> bool {
        self.status == 200 && self.kind == ResponseKind::Basic
    }

    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Resolve a possibly relative URL against the origin
pub fn resolve_url(origin: &Url, url: &str) -> Result<Url, NetworkError> {
    origin
        .join(url)
        .map_err(|e| NetworkError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Normalised cache key: the absolute URL without its fragment.
/// `cards.json`, `/cards.json` and the absolute form all share one entry.
pub fn cache_key(origin: &Url, url: &str) -> Result<String, NetworkError> {
    let mut resolved = resolve_url(origin, url)?;
    resolved.set_fragment(None);
    Ok(resolved.to_string())
}
