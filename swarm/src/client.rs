//! HTTP client handed to every simulated user.
use metrics_util::AtomicBucket;
use reqwest::{Body, Method, Response, StatusCode};
use std::fmt;
use std::sync::Arc;
use swarm_core::RequestEvent;
use thiserror::Error;
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, trace, warn};
use url::Url;

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Invalid URL {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// HTTP client bound to the host under test.
///
/// Every request is timed and reported to the run's statistics. A request counts as a failure
/// when it cannot be sent or when the response status is 400 or above; error statuses are still
/// returned as `Ok(Response)`.
///
/// Each simulated user gets its own client, so users never share pooled connections.
///
/// NOTE: Response time stops at the response headers and the body is not read, so the recorded
/// content length is the `Content-Length` header. Chunked responses without it record 0.
#[derive(Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
    host: String,
    events: Arc<AtomicBucket<RequestEvent>>,
}

impl HttpClient {
    /// A standalone client whose request events can be read with [`HttpClient::drain_events`].
    pub fn new(host: &str) -> Result<Self, RequestError> {
        Self::with_events(host, reqwest::Client::new(), Arc::new(AtomicBucket::new()))
    }

    pub(crate) fn with_events(
        host: &str,
        inner: reqwest::Client,
        events: Arc<AtomicBucket<RequestEvent>>,
    ) -> Result<Self, RequestError> {
        Url::parse(host).map_err(|source| RequestError::Url {
            url: host.to_string(),
            source,
        })?;

        Ok(Self {
            inner,
            host: host.to_string(),
            events,
        })
    }

    /// Same host and event sink, with a connection pool of its own.
    pub(crate) fn fork(&self) -> Self {
        Self {
            inner: reqwest::Client::new(),
            host: self.host.clone(),
            events: self.events.clone(),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub async fn get(&self, path: &str) -> Result<Response, RequestError> {
        self.send(Method::GET, path, None, None).await
    }

    pub async fn post(&self, path: &str, body: impl Into<Body>) -> Result<Response, RequestError> {
        self.send(Method::POST, path, None, Some(body.into())).await
    }

    /// Issue a request with an explicit stats name, e.g. to group `/item/1` and `/item/2`.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        name: Option<&str>,
    ) -> Result<Response, RequestError> {
        self.send(method, path, name, None).await
    }

    /// Take every request event recorded so far.
    pub fn drain_events(&self) -> Vec<RequestEvent> {
        let mut drained = vec![];
        self.events
            .clear_with(|events| drained.extend_from_slice(events));
        drained
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        name: Option<&str>,
        body: Option<Body>,
    ) -> Result<Response, RequestError> {
        let url = build_url(&self.host, path)?;
        let name = name
            .map(str::to_string)
            .unwrap_or_else(|| request_name(path, &url));

        let mut request = self.inner.request(method.clone(), url);
        if let Some(body) = body {
            request = request.body(body);
        }

        let start = Instant::now();
        let res = request.send().await;
        let response_time = start.elapsed();

        let (content_length, failure) = match &res {
            Ok(response) => (
                response.content_length().unwrap_or(0),
                status_failure(response.status()),
            ),
            Err(err) => (0, Some(err.to_string())),
        };

        trace!(
            "{method} {name} took {response_time:?} (failure: {})",
            failure.as_deref().unwrap_or("none")
        );

        self.events.push(RequestEvent {
            method: method.to_string(),
            name,
            response_time,
            content_length,
            failure,
        });

        Ok(res?)
    }
}

impl fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpClient")
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

fn is_absolute(path: &str) -> bool {
    path.starts_with("http://") || path.starts_with("https://")
}

/// Absolute URLs are used as-is, anything else is appended to the host.
pub(crate) fn build_url(host: &str, path: &str) -> Result<Url, RequestError> {
    let raw = if is_absolute(path) {
        path.to_string()
    } else {
        format!("{host}{path}")
    };

    Url::parse(&raw).map_err(|source| RequestError::Url { url: raw, source })
}

/// Default stats name of a request: the URL path (and query) relative to the host.
pub(crate) fn request_name(path: &str, url: &Url) -> String {
    if is_absolute(path) {
        return url.to_string();
    }

    match url.query() {
        Some(query) => format!("{}?{query}", url.path()),
        None => url.path().to_string(),
    }
}

fn status_failure(status: StatusCode) -> Option<String> {
    if status.is_client_error() || status.is_server_error() {
        Some(status.to_string())
    } else {
        None
    }
}
