//! Network transport used by cache workers on a cache miss.

use std::future::Future;
use std::time::Duration;

use reqwest::{header, Client, Url};
use tracing::debug;

use super::{resolve_url, CacheMode, NetworkError, Request, Response, ResponseKind};

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Something that can carry a request to the origin server.
pub trait Network: Send + Sync + 'static {
    fn fetch(&self, request: &Request)
        -> impl Future<Output = Result<Response, NetworkError>> + Send;
}

/// reqwest-backed network for one origin.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct HttpNetwork {
    client: Client,
    origin: Url,
}

impl HttpNetwork {
    pub fn new(origin: Url) -> Result<Self, NetworkError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self { client, origin })
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    fn kind_for(&self, url: &Url) -> ResponseKind {
        if url.origin() == self.origin.origin() {
            ResponseKind::Basic
        } else {
            ResponseKind::Cors
        }
    }
}

impl Network for HttpNetwork {
    async fn fetch(&self, request: &Request) -> Result<Response, NetworkError> {
        let url = resolve_url(&self.origin, &request.url)?;

        let mut builder = self.client.request(request.method.as_reqwest(), url.clone());
        if request.cache_mode == CacheMode::Reload {
            builder = builder
                .header(header::CACHE_CONTROL, "no-cache")
                .header(header::PRAGMA, "no-cache");
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        // Redirects may land on another origin
        let kind = self.kind_for(response.url());
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        debug!(url = %url, status = status, bytes = body.len(), "Network response");

        Ok(Response {
            status,
            kind,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_kind_by_origin() {
        let network =
            HttpNetwork::new(Url::parse("https://cards.example/").unwrap()).unwrap();

        let same = Url::parse("https://cards.example/cards.json").unwrap();
        let other = Url::parse("https://cdn.example/app.js").unwrap();
        let other_port = Url::parse("https://cards.example:8443/cards.json").unwrap();

        assert_eq!(network.kind_for(&same), ResponseKind::Basic);
        assert_eq!(network.kind_for(&other), ResponseKind::Cors);
        assert_eq!(network.kind_for(&other_port), ResponseKind::Cors);
    }
}
