//! Request configuration and the structured request descriptor

use std::time::Duration;

use indexmap::IndexMap;
use reqwest::Method;
use serde_json::Value as JsonValue;

use crate::errors::{HttpollError, Result};

/// Per-request configuration, merged shallowly over the client defaults
/// (caller fields win).
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// HTTP method; only consulted by [`HttpClient::request`](crate::HttpClient::request)
    pub method: Option<Method>,
    /// Target URL; only consulted by [`HttpClient::request`](crate::HttpClient::request)
    pub url: Option<String>,
    /// Additional headers, overriding same-named client defaults
    pub headers: IndexMap<String, String>,
    /// Query parameters appended to the URL
    pub params: Vec<(String, String)>,
    /// Request body; the body argument of post/put/patch overrides this
    pub body: Option<RequestBody>,
    /// Per-request timeout override
    pub timeout: Option<Duration>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn method(mut self, method: Method) -> Self {
        self.method = Some(method);
        self
    }

    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn body(mut self, body: RequestBody) -> Self {
        self.body = Some(body);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Request body variants
#[derive(Debug, Clone)]
pub enum RequestBody {
    /// JSON body
    Json(JsonValue),
    /// Form-urlencoded body
    Form(Vec<(String, String)>),
    /// Plain text body
    Text(String),
    /// Raw bytes
    Raw(Vec<u8>),
}

/// Fully resolved request shape shared by every verb operation and by the
/// poller. Verbs differ only in how they populate this.
#[derive(Debug, Clone)]
pub(crate) struct RequestDescriptor {
    pub(crate) method: Method,
    pub(crate) url: String,
    pub(crate) body: Option<RequestBody>,
    pub(crate) config: RequestConfig,
}

impl RequestDescriptor {
    /// Descriptor for bodyless verbs (get/delete/head/options).
    pub(crate) fn simple(method: Method, url: &str, config: Option<RequestConfig>) -> Self {
        let config = config.unwrap_or_default();
        Self {
            method,
            url: url.to_string(),
            body: config.body.clone(),
            config,
        }
    }

    /// Descriptor for body-carrying verbs (post/put/patch). The explicit
    /// body argument wins over any body in the config.
    pub(crate) fn with_body(
        method: Method,
        url: &str,
        body: RequestBody,
        config: Option<RequestConfig>,
    ) -> Self {
        Self {
            method,
            url: url.to_string(),
            body: Some(body),
            config: config.unwrap_or_default(),
        }
    }

    /// Descriptor for the bare `request` verb, which carries everything in
    /// its config. Fails fast if method or URL is missing.
    pub(crate) fn from_config(config: RequestConfig) -> Result<Self> {
        let method = config
            .method
            .clone()
            .ok_or_else(|| HttpollError::Config("request() requires a method".to_string()))?;
        let url = config
            .url
            .clone()
            .ok_or_else(|| HttpollError::Config("request() requires a url".to_string()))?;
        let body = config.body.clone();
        Ok(Self {
            method,
            url,
            body,
            config,
        })
    }
}
