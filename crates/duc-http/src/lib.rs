// # reqwest HTTP Executor
//
// This crate provides the production `HttpExecutor` for autoduc.
//
// ## Behavior
//
// - One request per call; no retries, no backoff
// - Finite per-request timeout (default 15 seconds)
// - 2xx: body decoded as JSON, falling back to raw text
// - Non-2xx: `Error::HttpStatus` with the status and body
// - Connect/timeout/IO failures: `Error::Transport`
//
// ## Security
//
// Header values are never logged. Only the method and URL are.

use async_trait::async_trait;
use duc_core::traits::{HttpExecutor, HttpRequest, Method, ResponseBody};
use duc_core::{Error, Result};
use std::time::Duration;

/// Default HTTP timeout for requests (15 seconds)
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

/// `HttpExecutor` backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestExecutor {
    /// HTTP client for all requests
    client: reqwest::Client,

    /// Per-request timeout
    timeout: Duration,
}

impl ReqwestExecutor {
    /// Create an executor with the given per-request timeout
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("autoduc/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, timeout })
    }

    /// Create an executor with [`DEFAULT_HTTP_TIMEOUT`]
    pub fn with_default_timeout() -> Result<Self> {
        Self::new(DEFAULT_HTTP_TIMEOUT)
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Post => reqwest::Method::POST,
    }
}

fn describe_transport_error(e: &reqwest::Error) -> String {
    if e.is_timeout() {
        format!("request timed out: {}", e)
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else {
        format!("HTTP request failed: {}", e)
    }
}

#[async_trait]
impl HttpExecutor for ReqwestExecutor {
    async fn execute(&self, request: HttpRequest) -> Result<ResponseBody> {
        let HttpRequest {
            method,
            url,
            headers,
            payload,
        } = request;

        tracing::debug!("{} {}", method, url);

        let mut builder = self.client.request(to_reqwest_method(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(payload) = &payload {
            builder = builder.json(payload);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::transport(&url, describe_transport_error(&e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::transport(&url, format!("Failed to read response: {}", e)))?;

        if !status.is_success() {
            tracing::debug!("{} {} -> {}", method, url, status);
            return Err(Error::http_status(url, status.as_u16(), body));
        }

        Ok(ResponseBody::from_text(body))
    }
}
