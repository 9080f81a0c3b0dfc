//! Error types for autoduc
//!
//! This module defines all error types used throughout the workspace.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for autoduc operations
pub type Result<T> = std::result::Result<T, Error>;

/// A single error or message entry reported by the provider API
///
/// Cloudflare reports these as `{ "code": 1004, "message": "..." }`, while some
/// endpoints emit bare strings. Both shapes deserialize into this type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "RawApiMessage")]
pub struct ApiMessage {
    /// Provider-specific error code, if any
    pub code: Option<i64>,
    /// Human-readable message
    pub message: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawApiMessage {
    Structured {
        #[serde(default)]
        code: Option<i64>,
        #[serde(default)]
        message: String,
    },
    Plain(String),
}

impl From<RawApiMessage> for ApiMessage {
    fn from(raw: RawApiMessage) -> Self {
        match raw {
            RawApiMessage::Structured { code, message } => Self { code, message },
            RawApiMessage::Plain(message) => Self { code: None, message },
        }
    }
}

impl fmt::Display for ApiMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Core error type for autoduc
#[derive(Error, Debug)]
pub enum Error {
    /// Network-level failure: DNS resolution, connection refused, timeout
    #[error("transport error for {url}: {message}")]
    Transport {
        /// Request URL (never contains credentials)
        url: String,
        /// Underlying cause
        message: String,
    },

    /// The remote end answered with a non-2xx status
    #[error("HTTP {status} from {url}: {body}")]
    HttpStatus {
        /// Request URL
        url: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// A configured record does not exist in the zone
    #[error("DNS record {record} not found in zone {zone_id}")]
    RecordNotFound {
        /// Zone that was searched
        zone_id: String,
        /// Record id or name that was looked up
        record: String,
    },

    /// The provider accepted the HTTP envelope but rejected the update
    #[error("update of DNS record {record_id} rejected by provider: {}", join_messages(.errors))]
    RecordUpdateRejected {
        /// Record that failed to update
        record_id: String,
        /// Errors and messages reported by the provider
        errors: Vec<ApiMessage>,
    },

    /// A response body did not have the expected shape
    #[error("unexpected response: {0}")]
    Decode(String),

    /// The public IP service returned something that is not an address
    #[error("invalid IP address: {0}")]
    InvalidIp(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Provider-specific error
    #[error("provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

fn join_messages(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "no details given".to_string();
    }
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

impl Error {
    /// Create a transport error
    pub fn transport(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Transport {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP status error
    pub fn http_status(url: impl Into<String>, status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a "record not found" error
    pub fn record_not_found(zone_id: impl Into<String>, record: impl Into<String>) -> Self {
        Self::RecordNotFound {
            zone_id: zone_id.into(),
            record: record.into(),
        }
    }

    /// Create a decode error
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Create an invalid IP error
    pub fn invalid_ip(msg: impl Into<String>) -> Self {
        Self::InvalidIp(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether the failure happened on the wire rather than in the provider's
    /// application layer
    pub fn is_transport_level(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::HttpStatus { .. })
    }

    /// Short stable label for structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Transport { .. } => "transport",
            Self::HttpStatus { .. } => "http_status",
            Self::RecordNotFound { .. } => "record_not_found",
            Self::RecordUpdateRejected { .. } => "update_rejected",
            Self::Decode(_) => "decode",
            Self::InvalidIp(_) => "invalid_ip",
            Self::Config(_) => "config",
            Self::Provider { .. } => "provider",
            Self::Json(_) => "json",
            Self::Other(_) => "other",
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
