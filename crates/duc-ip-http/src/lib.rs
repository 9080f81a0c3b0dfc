// # HTTP Public IP Source
//
// This crate provides the public IP resolver for autoduc.
//
// ## Purpose
//
// Asks an external echo service (ipify, icanhazip, ifconfig.me, ...) which
// address our requests come from.
//
// ## Response Shapes
//
// Services disagree on format, so the body is inspected rather than assumed:
// - plain text: `203.0.113.7\n`
// - JSON string: `"203.0.113.7"`
// - JSON object: `{"ip": "203.0.113.7"}` (field name configurable)
//
// Every call hits the service; nothing is cached between runs.

use async_trait::async_trait;
use duc_core::config::{IpFamily, PublicIpConfig};
use duc_core::traits::{HttpExecutor, HttpRequest, PublicIpSource, ResponseBody};
use duc_core::{Error, Result};
use serde_json::Value;
use std::net::IpAddr;
use std::sync::Arc;

/// Public IP source backed by an HTTP echo service
pub struct HttpIpSource {
    /// URL to fetch the IP from
    url: String,

    /// Field holding the address in JSON object answers
    json_field: String,

    /// Address family to require, if any
    family: Option<IpFamily>,

    /// Executor for the request
    executor: Arc<dyn HttpExecutor>,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch the IP from (e.g., "https://api.ipify.org")
    /// - `executor`: Shared HTTP executor
    pub fn new(url: impl Into<String>, executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            url: url.into(),
            json_field: "ip".to_string(),
            family: None,
            executor,
        }
    }

    /// Create from configuration
    pub fn from_config(config: &PublicIpConfig, executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            url: config.url.clone(),
            json_field: config.json_field.clone(),
            family: config.family,
            executor,
        }
    }

    /// Require answers of one address family
    pub fn with_family(mut self, family: IpFamily) -> Self {
        self.family = Some(family);
        self
    }

    /// Read the address from a different JSON field
    pub fn with_json_field(mut self, field: impl Into<String>) -> Self {
        self.json_field = field.into();
        self
    }

    /// Pull the address text out of whatever the service answered
    fn extract(&self, body: &ResponseBody) -> Result<String> {
        match body {
            ResponseBody::Text(text) => Ok(text.trim().to_string()),
            ResponseBody::Json(Value::String(text)) => Ok(text.trim().to_string()),
            ResponseBody::Json(Value::Object(map)) => map
                .get(&self.json_field)
                .and_then(Value::as_str)
                .map(|text| text.trim().to_string())
                .ok_or_else(|| {
                    Error::invalid_ip(format!(
                        "JSON answer from {} has no string field \"{}\"",
                        self.url, self.json_field
                    ))
                }),
            ResponseBody::Json(other) => Err(Error::invalid_ip(format!(
                "unexpected JSON answer from {}: {}",
                self.url, other
            ))),
        }
    }
}

#[async_trait]
impl PublicIpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let body = self.executor.execute(HttpRequest::get(&self.url)).await?;

        let text = self.extract(&body)?;
        let ip: IpAddr = text
            .parse()
            .map_err(|_| Error::invalid_ip(format!("{:?} from {}", text, self.url)))?;

        if let Some(family) = self.family
            && !family.matches(ip)
        {
            return Err(Error::invalid_ip(format!(
                "expected {:?} address from {}, got {}",
                family, self.url, ip
            )));
        }

        tracing::debug!("Public IP from {}: {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &str {
        &self.url
    }
}
