//! Buffered HTTP response

use bytes::Bytes;
use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use url::Url;

use crate::errors::Result;

/// A fully buffered response from a completed request.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    status: StatusCode,
    headers: HeaderMap,
    url: Url,
    body: Bytes,
}

impl HttpResponse {
    /// Buffer a reqwest response. Non-2xx statuses have already been
    /// rejected by the caller at this point.
    pub(crate) async fn read(response: reqwest::Response) -> Result<Self> {
        let status = response.status();
        let url = response.url().clone();
        let headers = response.headers().clone();
        let body = response.bytes().await?;
        Ok(Self {
            status,
            headers,
            url,
            body,
        })
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Final URL of the response (after any redirects).
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn bytes(&self) -> &Bytes {
        &self.body
    }

    /// Body decoded as UTF-8, lossily.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).to_string()
    }

    /// Deserialize the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Serialized form of the payload, used for change detection between
    /// successive polls. JSON bodies are re-serialized to a canonical
    /// compact form so formatting differences do not count as a change;
    /// anything else compares as raw bytes. Headers and status are
    /// deliberately excluded.
    pub(crate) fn fingerprint(&self) -> Bytes {
        match serde_json::from_slice::<JsonValue>(&self.body) {
            Ok(value) => {
                Bytes::from(serde_json::to_vec(&value).unwrap_or_else(|_| self.body.to_vec()))
            }
            Err(_) => self.body.clone(),
        }
    }

    #[cfg(test)]
    pub(crate) fn fake(body: &[u8]) -> Self {
        Self {
            status: StatusCode::OK,
            headers: HeaderMap::new(),
            url: Url::parse("http://localhost/").expect("static url"),
            body: Bytes::copy_from_slice(body),
        }
    }
}
