//! HTTP client with cancellable requests
//!
//! [`HttpClient`] wraps a `reqwest::Client` with optional base URL and
//! default headers. Every verb operation attaches a fresh cancellation
//! source to the returned [`CancellableRequest`] before handing it back,
//! so the request (and anything chained from it) can be cancelled through
//! the result itself.

pub mod config;
pub mod response;

use indexmap::IndexMap;
use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Method;
use std::time::Duration;
use url::Url;

use crate::cancel::{CancelSource, CancellableRequest};
use crate::errors::{HttpollError, Result};
use crate::poll::{self, PollConfig, PollHandle};
use config::{RequestBody, RequestConfig, RequestDescriptor};
use response::HttpResponse;

pub const USER_AGENT_STRING: &str = concat!("httpoll/", env!("CARGO_PKG_VERSION"));

/// HTTP client handle. Cheap to clone; clones share the connection pool.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
    base_url: Option<Url>,
    default_headers: IndexMap<String, String>,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// A client with no base URL and no default headers.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: None,
            default_headers: IndexMap::new(),
        }
    }

    pub fn builder() -> HttpClientBuilder {
        HttpClientBuilder::default()
    }

    /// Issue a request described entirely by `config` (method and URL
    /// required; missing fields fail through the result's failure path).
    pub fn request(&self, config: RequestConfig) -> CancellableRequest<HttpResponse> {
        self.execute(RequestDescriptor::from_config(config))
    }

    pub fn get(&self, url: &str, config: Option<RequestConfig>) -> CancellableRequest<HttpResponse> {
        self.execute(Ok(RequestDescriptor::simple(Method::GET, url, config)))
    }

    pub fn delete(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> CancellableRequest<HttpResponse> {
        self.execute(Ok(RequestDescriptor::simple(Method::DELETE, url, config)))
    }

    pub fn head(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> CancellableRequest<HttpResponse> {
        self.execute(Ok(RequestDescriptor::simple(Method::HEAD, url, config)))
    }

    pub fn options(
        &self,
        url: &str,
        config: Option<RequestConfig>,
    ) -> CancellableRequest<HttpResponse> {
        self.execute(Ok(RequestDescriptor::simple(Method::OPTIONS, url, config)))
    }

    pub fn post(
        &self,
        url: &str,
        body: RequestBody,
        config: Option<RequestConfig>,
    ) -> CancellableRequest<HttpResponse> {
        self.execute(Ok(RequestDescriptor::with_body(Method::POST, url, body, config)))
    }

    pub fn put(
        &self,
        url: &str,
        body: RequestBody,
        config: Option<RequestConfig>,
    ) -> CancellableRequest<HttpResponse> {
        self.execute(Ok(RequestDescriptor::with_body(Method::PUT, url, body, config)))
    }

    pub fn patch(
        &self,
        url: &str,
        body: RequestBody,
        config: Option<RequestConfig>,
    ) -> CancellableRequest<HttpResponse> {
        self.execute(Ok(RequestDescriptor::with_body(Method::PATCH, url, body, config)))
    }

    /// Start a long-polling loop against `url`. See [`crate::poll`].
    ///
    /// Must be called from within a tokio runtime; the loop runs as a
    /// spawned task controlled through the returned [`PollHandle`].
    pub fn poll<S, F>(
        &self,
        url: &str,
        config: PollConfig,
        on_success: S,
        on_failure: F,
    ) -> PollHandle
    where
        S: FnMut(HttpResponse) + Send + 'static,
        F: FnMut(HttpollError) + Send + 'static,
    {
        poll::spawn(self.clone(), url.to_string(), config, on_success, on_failure)
    }

    /// Attach a fresh cancellation source and run the descriptor through
    /// the transport. Descriptor construction errors surface through the
    /// returned future, not as panics.
    fn execute(&self, descriptor: Result<RequestDescriptor>) -> CancellableRequest<HttpResponse> {
        let source = CancelSource::new();
        let client = self.clone();
        CancellableRequest::new(async move { client.send(descriptor?).await }, source)
    }

    /// Send a descriptor and buffer the response. Used by the one-shot
    /// verbs (through [`Self::execute`]) and directly by the poller.
    pub(crate) async fn send(&self, descriptor: RequestDescriptor) -> Result<HttpResponse> {
        let url = self.resolve_url(&descriptor.url)?;
        tracing::debug!(method = %descriptor.method, url = %url, "sending request");

        let mut request = self.client.request(descriptor.method, url);

        // Shallow merge: caller headers override same-named defaults.
        let mut headers = self.default_headers.clone();
        for (name, value) in &descriptor.config.headers {
            headers.insert(name.clone(), value.clone());
        }
        for (name, value) in &headers {
            let name = HeaderName::try_from(name.as_str()).map_err(|e| {
                HttpollError::Parse(format!("Invalid header name '{}': {}", name, e))
            })?;
            let value = HeaderValue::try_from(value.as_str()).map_err(|e| {
                HttpollError::Parse(format!("Invalid header value '{}': {}", value, e))
            })?;
            request = request.header(name, value);
        }

        if !descriptor.config.params.is_empty() {
            request = request.query(&descriptor.config.params);
        }
        if let Some(timeout) = descriptor.config.timeout {
            request = request.timeout(timeout);
        }
        if let Some(body) = descriptor.body {
            request = match body {
                RequestBody::Json(value) => request.json(&value),
                RequestBody::Form(fields) => request.form(&fields),
                RequestBody::Text(text) => request.body(text),
                RequestBody::Raw(bytes) => request.body(bytes),
            };
        }

        let response = request.send().await?.error_for_status()?;
        HttpResponse::read(response).await
    }

    fn resolve_url(&self, raw: &str) -> Result<Url> {
        match &self.base_url {
            Some(base) => Ok(base.join(raw)?),
            None => Ok(raw.parse()?),
        }
    }
}

/// Builder for [`HttpClient`]
#[derive(Debug, Default)]
pub struct HttpClientBuilder {
    base_url: Option<String>,
    default_headers: IndexMap<String, String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    /// Base URL that relative request URLs are joined against.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Header sent with every request unless overridden per request.
    pub fn default_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.default_headers.insert(name.into(), value.into());
        self
    }

    /// Client-wide request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient> {
        let mut builder = reqwest::Client::builder().user_agent(
            self.user_agent
                .unwrap_or_else(|| USER_AGENT_STRING.to_string()),
        );
        if let Some(timeout) = self.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(HttpollError::Request)?;
        let base_url = self.base_url.map(|u| u.parse()).transpose()?;
        Ok(HttpClient {
            client,
            base_url,
            default_headers: self.default_headers,
        })
    }
}
