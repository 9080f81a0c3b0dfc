// # HTTP Executor Trait
//
// The single seam through which every remote call in autoduc flows.
//
// ## Implementations
//
// - reqwest: `duc-http` crate
// - Test doubles: `tests/common/mod.rs`
//
// ## Contract
//
// - 2xx: body decoded as JSON, or returned as raw text when it is not JSON
// - anything else: `Error::HttpStatus` carrying the status and body
// - connection failure / timeout: `Error::Transport`
// - no retries, ever; callers decide what a failure means for the run

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;

/// HTTP methods used against the provider and IP service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Put,
    Patch,
    Post,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Post => "POST",
        }
    }

    /// Whether this method mutates remote state
    pub fn is_write(&self) -> bool {
        !matches!(self, Self::Get)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An outgoing request
#[derive(Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    /// Absolute URL
    pub url: String,
    pub headers: Vec<(String, String)>,
    /// Serialized as the JSON request body when present
    pub payload: Option<Value>,
}

// Header values carry credentials, so only their names are shown.
impl fmt::Debug for HttpRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let header_names: Vec<&str> = self.headers.iter().map(|(name, _)| name.as_str()).collect();
        f.debug_struct("HttpRequest")
            .field("method", &self.method)
            .field("url", &self.url)
            .field("headers", &header_names)
            .field("payload", &self.payload)
            .finish()
    }
}

impl HttpRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: Vec::new(),
            payload: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::Get, url)
    }

    /// Add a header
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Add several headers
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Attach a JSON payload
    pub fn json(mut self, payload: Value) -> Self {
        self.payload = Some(payload);
        self
    }

    /// Look up a header value by case-insensitive name
    pub fn header_value(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// A successfully received response body
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseBody {
    /// The body parsed as JSON
    Json(Value),
    /// The body was not JSON; raw text
    Text(String),
}

impl ResponseBody {
    /// Decode a raw body, falling back to text when it is not JSON
    pub fn from_text(text: String) -> Self {
        match serde_json::from_str(&text) {
            Ok(value) => Self::Json(value),
            Err(_) => Self::Text(text),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            Self::Text(_) => None,
        }
    }
}

/// Trait for HTTP executor implementations
///
/// Implementations must be thread-safe and must not retry.
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    /// Execute a request
    ///
    /// # Returns
    ///
    /// - `Ok(ResponseBody)`: status was in `[200, 300)`
    /// - `Err(Error::Transport)`: the request never completed
    /// - `Err(Error::HttpStatus)`: any other status
    async fn execute(&self, request: HttpRequest) -> Result<ResponseBody, crate::Error>;
}
