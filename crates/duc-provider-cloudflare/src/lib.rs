// # Cloudflare DNS Record Accessor
//
// This crate implements `RecordAccessor` against the Cloudflare API v4.
//
// ## Behavior
//
// - One logical operation per call; every HTTP request goes through the
//   injected `HttpExecutor`
// - No retries, no caching, no update decisions (owned by `Reconciler`)
// - The envelope's own `success` flag is checked on top of the HTTP status
//
// ## Security
//
// - The credential is attached as headers and never logged
// - The Debug implementation does not expose it
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - List DNS Records: GET `/zones/:zone_id/dns_records?page=N&per_page=100`
// - Update DNS Record: PATCH or PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use duc_core::config::{Credential, DEFAULT_API_BASE, DucConfig, UpdateMethod};
use duc_core::error::ApiMessage;
use duc_core::record::{DnsRecord, RecordFilter, UpdateOverrides};
use duc_core::traits::{HttpExecutor, HttpRequest, Method, RecordAccessor, ResponseBody, UpdateConfirmation};
use duc_core::{Error, Result};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::net::IpAddr;
use std::sync::Arc;

const PROVIDER: &str = "cloudflare";

/// Records requested per listing page (Cloudflare's maximum is 5000, default 100)
pub const PAGE_SIZE: u32 = 100;

/// Cloudflare's response envelope
///
/// ```json
/// {
///   "success": true,
///   "errors": [],
///   "messages": [],
///   "result": { ... },
///   "result_info": { "page": 1, "per_page": 100, "total_pages": 3 }
/// }
/// ```
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    #[serde(default)]
    messages: Vec<ApiMessage>,
    result: Option<T>,
    #[serde(default)]
    result_info: Option<ResultInfo>,
}

// The echoed `page` is not trusted; the client's own counter drives paging.
#[derive(Debug, Deserialize)]
struct ResultInfo {
    #[serde(default)]
    total_pages: u32,
}

impl ResultInfo {
    fn has_more_after(&self, page: u32) -> bool {
        page < self.total_pages
    }
}

fn decode_envelope<T: DeserializeOwned>(body: ResponseBody, url: &str) -> Result<Envelope<T>> {
    match body {
        ResponseBody::Json(value) => serde_json::from_value(value)
            .map_err(|e| Error::decode(format!("malformed Cloudflare envelope from {}: {}", url, e))),
        ResponseBody::Text(text) => Err(Error::decode(format!(
            "non-JSON body from {}: {:?}",
            url,
            truncate(&text, 200)
        ))),
    }
}

fn truncate(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((index, _)) => &text[..index],
        None => text,
    }
}

fn join(messages: &[ApiMessage]) -> String {
    if messages.is_empty() {
        return "success: false without details".to_string();
    }
    messages
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Cloudflare API client
pub struct CloudflareClient {
    /// Executor for every request
    executor: Arc<dyn HttpExecutor>,

    /// API credential
    /// ⚠️ NEVER log this value
    credential: Credential,

    /// API base URL without trailing slash
    api_base: String,

    /// Method used for record updates
    update_method: UpdateMethod,
}

// Custom Debug implementation that hides the credential
impl std::fmt::Debug for CloudflareClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareClient")
            .field("credential", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("update_method", &self.update_method)
            .finish()
    }
}

impl CloudflareClient {
    /// Create a client against the public Cloudflare API using PATCH updates
    pub fn new(credential: Credential, executor: Arc<dyn HttpExecutor>) -> Self {
        Self {
            executor,
            credential,
            api_base: DEFAULT_API_BASE.to_string(),
            update_method: UpdateMethod::default(),
        }
    }

    /// Create a client from the run configuration
    pub fn from_config(config: &DucConfig, executor: Arc<dyn HttpExecutor>) -> Self {
        Self::new(config.credential.clone(), executor)
            .with_api_base(&config.http.api_base)
            .with_update_method(config.update.method)
    }

    /// Point the client at another API root (tests use a mock server)
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_update_method(mut self, method: UpdateMethod) -> Self {
        self.update_method = method;
        self
    }

    fn records_url(&self, zone_id: &str) -> String {
        format!("{}/zones/{}/dns_records", self.api_base, zone_id)
    }

    /// Build a request carrying the credential headers
    fn request(&self, method: Method, url: impl Into<String>) -> HttpRequest {
        HttpRequest::new(method, url)
            .header("Content-Type", "application/json")
            .headers(self.credential.auth_headers())
    }

    async fn list_page(&self, zone_id: &str, page: u32) -> Result<Envelope<Vec<DnsRecord>>> {
        let url = format!(
            "{}?page={}&per_page={}",
            self.records_url(zone_id),
            page,
            PAGE_SIZE
        );
        let body = self.executor.execute(self.request(Method::Get, &url)).await?;
        decode_envelope(body, &url)
    }
}

#[async_trait]
impl RecordAccessor for CloudflareClient {
    async fn list_records(&self, zone_id: &str, filter: RecordFilter) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let envelope = self.list_page(zone_id, page).await?;
            if !envelope.success {
                return Err(Error::provider(
                    PROVIDER,
                    format!("listing zone {} failed: {}", zone_id, join(&envelope.errors)),
                ));
            }

            let batch = envelope.result.ok_or_else(|| {
                Error::decode(format!("listing of zone {} has no result", zone_id))
            })?;
            let fetched = batch.len();
            records.extend(batch.into_iter().filter(|record| filter.admits(record)));

            match envelope.result_info {
                Some(info) if info.has_more_after(page) && fetched > 0 => page += 1,
                _ => break,
            }
        }

        tracing::debug!(
            zone_id = %zone_id,
            pages = page,
            count = records.len(),
            "Listed DNS records"
        );
        Ok(records)
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record: &DnsRecord,
        new_ip: IpAddr,
        overrides: &UpdateOverrides,
    ) -> Result<UpdateConfirmation> {
        let url = format!("{}/{}", self.records_url(zone_id), record.id);
        let payload = record.update_payload(new_ip, overrides)?;

        tracing::debug!(
            record_id = %record.id,
            method = %self.update_method.as_method(),
            "Submitting DNS record update"
        );

        let body = self
            .executor
            .execute(self.request(self.update_method.as_method(), &url).json(payload))
            .await?;
        let envelope: Envelope<DnsRecord> = decode_envelope(body, &url)?;

        if !envelope.success {
            let mut errors = envelope.errors;
            errors.extend(envelope.messages);
            return Err(Error::RecordUpdateRejected {
                record_id: record.id.clone(),
                errors,
            });
        }

        let updated = envelope
            .result
            .ok_or_else(|| Error::decode(format!("update of {} has no result", record.id)))?;

        Ok(UpdateConfirmation {
            record: updated,
            messages: envelope.messages,
        })
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
