//! HTTP transport to the service under test
//!
//! [`HttpTransport`] posts encoded requests with reqwest. The client is built
//! once per run with the configured connect and read timeouts and keeps no
//! idle connections, so each call opens its own connection and closes it
//! when the response is dropped, on success and failure paths alike.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Client, StatusCode, Url};

use super::codec::{self, Variables, MEDIATYPE_JSON};
use super::Headers;
use crate::common::{Config, Error, Result};

/// Sends one query to the endpoint and returns the response body
#[async_trait]
pub trait Transport: Send + Sync {
    /// Post `query` with `variables` and `headers`
    ///
    /// Returns the body of a 200 response. Any other status, a connection
    /// failure or an elapsed timeout is a transport error.
    async fn send(
        &self,
        query: &str,
        variables: Option<&Variables>,
        headers: &Headers,
    ) -> Result<String>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(
        &self,
        query: &str,
        variables: Option<&Variables>,
        headers: &Headers,
    ) -> Result<String> {
        (**self).send(query, variables, headers).await
    }
}

/// Transport implementation using reqwest
pub struct HttpTransport {
    client: Client,
    endpoint: Url,
}

impl HttpTransport {
    /// Create a transport for the configured endpoint and timeouts
    pub fn new(config: &Config) -> Result<Self> {
        let url = config.endpoint.url();
        let endpoint = Url::parse(&url)
            .map_err(|e| Error::Config(format!("Invalid endpoint URL '{}': {}", url, e)))?;

        let client = Client::builder()
            .user_agent(concat!("tck-runner/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(config.timeouts.connect())
            .read_timeout(config.timeouts.read())
            .pool_max_idle_per_host(0)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, endpoint })
    }

    /// The target endpoint URL
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Default JSON headers with the case headers layered on top
    pub fn build_headers(headers: &Headers) -> Result<HeaderMap> {
        let mut map = HeaderMap::new();
        map.insert(CONTENT_TYPE, HeaderValue::from_static(MEDIATYPE_JSON));
        map.insert(ACCEPT, HeaderValue::from_static(MEDIATYPE_JSON));

        for (name, value) in headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| Error::Encode(format!("invalid header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| Error::Encode(format!("invalid value for header '{}': {}", name, e)))?;
            map.insert(name, value);
        }

        Ok(map)
    }

    /// Maps reqwest errors to transport errors
    fn map_error(&self, error: reqwest::Error) -> Error {
        let url = self.endpoint.as_str();

        if error.is_timeout() {
            return Error::Timeout {
                url: url.to_string(),
            };
        }

        if error.is_body() || error.is_decode() {
            return Error::ResponseBody(error_chain(&error));
        }

        Error::connection(url, &error_chain(&error))
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        query: &str,
        variables: Option<&Variables>,
        headers: &Headers,
    ) -> Result<String> {
        let body = codec::encode_request(query, variables)?;
        let headers = Self::build_headers(headers)?;

        tracing::debug!(endpoint = %self.endpoint, body = %body, "POST");

        let response = self
            .client
            .post(self.endpoint.clone())
            .headers(headers)
            .body(body)
            .send()
            .await
            .map_err(|e| self.map_error(e))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::debug!(status = status.as_u16(), "Endpoint rejected request");
            return Err(Error::status(
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown status"),
            ));
        }

        let raw = response.text().await.map_err(|e| self.map_error(e))?;
        tracing::debug!(response = %raw, "Response received");

        Ok(codec::decode_response(&raw))
    }
}

/// Render an error with its source chain on one line
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
