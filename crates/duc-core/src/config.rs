//! Configuration types for autoduc
//!
//! The core never reads ambient process state: everything it needs arrives
//! through these types, built by the binary from a file or the environment.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use crate::record::{AUTOMATIC_TTL, UpdateOverrides};
use crate::traits::Method;

/// Cloudflare API v4 base URL
pub const DEFAULT_API_BASE: &str = "https://api.cloudflare.com/client/v4";

/// Default public IP echo service (plain-text body)
pub const DEFAULT_PUBLIC_IP_URL: &str = "https://api.ipify.org";

/// Main configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DucConfig {
    /// Zone holding the managed records
    pub zone_id: String,

    /// Provider credential
    pub credential: Credential,

    /// Where to discover the public IP
    pub public_ip: PublicIpConfig,

    /// Which records to reconcile
    #[serde(default)]
    pub records: RecordSelection,

    /// How updates are submitted
    #[serde(default)]
    pub update: UpdateConfig,

    /// HTTP client settings
    #[serde(default)]
    pub http: HttpConfig,

    /// What a single record failure means for the rest of the run
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Decide and log, but never write
    #[serde(default)]
    pub dry_run: bool,

    /// Dump the zone's records instead of reconciling
    #[serde(default)]
    pub list_only: bool,

    /// Display names for record ids, used in logs and reports
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub record_labels: BTreeMap<String, String>,
}

impl DucConfig {
    /// Create a configuration with defaults for everything optional
    pub fn new(zone_id: impl Into<String>, credential: Credential) -> Self {
        Self {
            zone_id: zone_id.into(),
            credential,
            public_ip: PublicIpConfig::default(),
            records: RecordSelection::All,
            update: UpdateConfig::default(),
            http: HttpConfig::default(),
            failure_policy: FailurePolicy::Continue,
            dry_run: false,
            list_only: false,
            record_labels: BTreeMap::new(),
        }
    }

    /// Set the public IP service URL
    pub fn with_public_ip_url(mut self, url: impl Into<String>) -> Self {
        self.public_ip.url = url.into();
        self
    }

    /// Restrict the run to explicit targets
    pub fn with_records(mut self, targets: Vec<RecordTarget>) -> Self {
        self.records = RecordSelection::Only(targets);
        self
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Parse a JSON configuration file
    ///
    /// Accepts the native shape and the classic `conf.json` shape
    /// (`AuthKey`, `ZoneID`, `Records`, `PublicAddressAPI`, `ListRecords`).
    pub fn from_json_str(input: &str) -> Result<Self, crate::Error> {
        let value: Value = serde_json::from_str(input)?;

        if value.get("ZoneID").is_some() {
            let legacy: LegacyConfig = serde_json::from_value(value)?;
            return Ok(legacy.into());
        }

        Ok(serde_json::from_value(value)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.zone_id.trim().is_empty() {
            return Err(crate::Error::config("zone_id cannot be empty"));
        }

        self.credential.validate()?;
        self.public_ip.validate()?;
        self.records.validate()?;
        self.update.validate()?;
        self.http.validate()?;

        Ok(())
    }
}

/// Provider credential
///
/// The Debug implementation intentionally does NOT expose secrets.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Credential {
    /// Scoped API token, sent as `Authorization: Bearer`
    ApiToken {
        /// ⚠️ NEVER log this value
        token: String,
    },

    /// Legacy global API key, sent as `X-Auth-Email` + `X-Auth-Key`
    ApiKey {
        /// Account email
        email: String,
        /// ⚠️ NEVER log this value
        key: String,
    },
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ApiToken { .. } => f
                .debug_struct("ApiToken")
                .field("token", &"<REDACTED>")
                .finish(),
            Self::ApiKey { email, .. } => f
                .debug_struct("ApiKey")
                .field("email", email)
                .field("key", &"<REDACTED>")
                .finish(),
        }
    }
}

impl Credential {
    pub fn api_token(token: impl Into<String>) -> Self {
        Self::ApiToken {
            token: token.into(),
        }
    }

    pub fn api_key(email: impl Into<String>, key: impl Into<String>) -> Self {
        Self::ApiKey {
            email: email.into(),
            key: key.into(),
        }
    }

    /// Authentication headers for this credential
    pub fn auth_headers(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::ApiToken { token } => vec![("Authorization", format!("Bearer {}", token))],
            Self::ApiKey { email, key } => vec![
                ("X-Auth-Email", email.clone()),
                ("X-Auth-Key", key.clone()),
            ],
        }
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            Self::ApiToken { token } if token.trim().is_empty() => {
                Err(crate::Error::config("API token cannot be empty"))
            }
            Self::ApiKey { email, key } if email.trim().is_empty() || key.trim().is_empty() => {
                Err(crate::Error::config("API key credential needs both email and key"))
            }
            _ => Ok(()),
        }
    }
}

/// Public IP discovery settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicIpConfig {
    /// URL of the echo service
    pub url: String,

    /// Field holding the address when the service answers with a JSON object
    #[serde(default = "default_json_field")]
    pub json_field: String,

    /// Reject answers of the other address family
    #[serde(default)]
    pub family: Option<IpFamily>,
}

impl Default for PublicIpConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_PUBLIC_IP_URL.to_string(),
            json_field: default_json_field(),
            family: None,
        }
    }
}

impl PublicIpConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        validate_http_url("public_ip.url", &self.url)?;
        if self.json_field.trim().is_empty() {
            return Err(crate::Error::config("public_ip.json_field cannot be empty"));
        }
        Ok(())
    }
}

fn default_json_field() -> String {
    "ip".to_string()
}

/// IP address family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IpFamily {
    V4,
    V6,
}

impl IpFamily {
    pub fn matches(&self, ip: std::net::IpAddr) -> bool {
        match self {
            Self::V4 => ip.is_ipv4(),
            Self::V6 => ip.is_ipv6(),
        }
    }
}

/// Which records a run reconciles
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordSelection {
    /// Every A/AAAA record in the zone
    #[default]
    All,
    /// Only the named records
    Only(Vec<RecordTarget>),
}

impl RecordSelection {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let Self::Only(targets) = self {
            for target in targets {
                if target.key().trim().is_empty() {
                    return Err(crate::Error::config("record targets cannot be blank"));
                }
            }
        }
        Ok(())
    }
}

/// A record named in configuration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordTarget {
    /// Match by provider record id
    Id(String),
    /// Match by fully-qualified name (may select both A and AAAA)
    Name(String),
}

impl RecordTarget {
    /// The id or name this target matches on
    pub fn key(&self) -> &str {
        match self {
            Self::Id(key) | Self::Name(key) => key,
        }
    }

    pub fn matches(&self, record: &crate::record::DnsRecord) -> bool {
        match self {
            Self::Id(id) => record.id == *id,
            Self::Name(name) => record.name.eq_ignore_ascii_case(name),
        }
    }
}

impl fmt::Display for RecordTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "id:{}", id),
            Self::Name(name) => write!(f, "name:{}", name),
        }
    }
}

/// Update submission settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct UpdateConfig {
    /// HTTP method for updates
    #[serde(default)]
    pub method: UpdateMethod,

    /// Field overrides applied to every update
    #[serde(flatten)]
    pub overrides: UpdateOverrides,
}

impl UpdateConfig {
    pub fn validate(&self) -> Result<(), crate::Error> {
        if let Some(ttl) = self.overrides.ttl
            && ttl != AUTOMATIC_TTL
            && !(60..=86400).contains(&ttl)
        {
            return Err(crate::Error::config(format!(
                "update.ttl must be 1 (automatic) or between 60 and 86400 seconds. Got: {}",
                ttl
            )));
        }
        Ok(())
    }
}

/// HTTP method used for record updates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMethod {
    /// Partial update
    #[default]
    Patch,
    /// Full overwrite
    Put,
}

impl UpdateMethod {
    pub fn as_method(&self) -> Method {
        match self {
            Self::Patch => Method::Patch,
            Self::Put => Method::Put,
        }
    }
}

/// HTTP client settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Provider API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            api_base: default_api_base(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), crate::Error> {
        if !(1..=300).contains(&self.timeout_secs) {
            return Err(crate::Error::config(format!(
                "http.timeout_secs must be between 1 and 300 seconds. Got: {}",
                self.timeout_secs
            )));
        }
        validate_http_url("http.api_base", &self.api_base)
    }
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

/// What a per-record failure means for the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failure and keep going
    #[default]
    Continue,
    /// Stop at the first failed record
    Abort,
}

fn validate_http_url(field: &str, url: &str) -> Result<(), crate::Error> {
    if !url.starts_with("https://") && !url.starts_with("http://") {
        return Err(crate::Error::config(format!(
            "{} must use HTTP or HTTPS scheme. Got: {}",
            field, url
        )));
    }
    Ok(())
}

/// The classic `conf.json` layout
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct LegacyConfig {
    pub auth_key: String,
    #[serde(rename = "ZoneID")]
    pub zone_id: String,
    pub records: Vec<LegacyRecord>,
    #[serde(rename = "PublicAddressAPI")]
    pub public_address_api: String,
    #[serde(default)]
    pub list_records: bool,
}

/// A record entry in the classic layout
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRecord {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

// Classic setups always PUT with proxying off and a 60s TTL.
impl From<LegacyConfig> for DucConfig {
    fn from(legacy: LegacyConfig) -> Self {
        let record_labels = legacy
            .records
            .iter()
            .filter(|record| !record.name.trim().is_empty())
            .map(|record| (record.id.clone(), record.name.clone()))
            .collect();

        let mut config = DucConfig::new(legacy.zone_id, Credential::api_token(legacy.auth_key))
            .with_public_ip_url(legacy.public_address_api)
            .with_records(
                legacy
                    .records
                    .into_iter()
                    .map(|record| RecordTarget::Id(record.id))
                    .collect(),
            );
        config.record_labels = record_labels;
        config.update = UpdateConfig {
            method: UpdateMethod::Put,
            overrides: UpdateOverrides {
                proxied: Some(false),
                ttl: Some(60),
            },
        };
        config.list_only = legacy.list_records;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> DucConfig {
        DucConfig::new("zone-1", Credential::api_token("token-abc"))
    }

    #[test]
    fn defaults_validate() {
        let config = valid();
        assert!(config.validate().is_ok());
        assert_eq!(config.records, RecordSelection::All);
        assert_eq!(config.update.method, UpdateMethod::Patch);
        assert_eq!(config.http.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn rejects_bad_values() {
        let mut config = valid();
        config.zone_id = " ".to_string();
        assert!(config.validate().is_err());

        let config = DucConfig::new("zone-1", Credential::api_token(""));
        assert!(config.validate().is_err());

        let config = DucConfig::new("zone-1", Credential::api_key("ops@example.com", ""));
        assert!(config.validate().is_err());

        let config = valid().with_public_ip_url("ftp://ip.example.com");
        assert!(config.validate().is_err());

        let mut config = valid();
        config.http.timeout_secs = 0;
        assert!(config.validate().is_err());

        let mut config = valid();
        config.update.overrides.ttl = Some(30);
        assert!(config.validate().is_err());

        let config = valid().with_records(vec![RecordTarget::Id(String::new())]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn automatic_ttl_is_allowed() {
        let mut config = valid();
        config.update.overrides.ttl = Some(1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn parses_native_json() {
        let config = DucConfig::from_json_str(
            r#"{
                "zone_id": "zone-1",
                "credential": { "type": "api_key", "email": "ops@example.com", "key": "k" },
                "public_ip": { "url": "https://ip.example.com/json", "family": "v4" },
                "records": { "only": [ { "id": "r1" }, { "name": "home.example.com" } ] },
                "update": { "method": "put", "proxied": false },
                "failure_policy": "abort",
                "dry_run": true
            }"#,
        )
        .unwrap();

        assert_eq!(config.credential, Credential::api_key("ops@example.com", "k"));
        assert_eq!(config.public_ip.json_field, "ip");
        assert_eq!(config.public_ip.family, Some(IpFamily::V4));
        assert_eq!(
            config.records,
            RecordSelection::Only(vec![
                RecordTarget::Id("r1".to_string()),
                RecordTarget::Name("home.example.com".to_string()),
            ])
        );
        assert_eq!(config.update.method, UpdateMethod::Put);
        assert_eq!(config.update.overrides.proxied, Some(false));
        assert_eq!(config.update.overrides.ttl, None);
        assert_eq!(config.failure_policy, FailurePolicy::Abort);
        assert!(config.dry_run);
        assert!(!config.list_only);
    }

    #[test]
    fn parses_classic_conf_json() {
        let config = DucConfig::from_json_str(
            r#"{
                "AuthKey": "token-abc",
                "ZoneID": "zone-1",
                "Records": [ { "id": "r1", "name": "home.example.com" } ],
                "PublicAddressAPI": "https://api.ipify.org",
                "ListRecords": false
            }"#,
        )
        .unwrap();

        assert_eq!(config.zone_id, "zone-1");
        assert_eq!(config.credential, Credential::api_token("token-abc"));
        assert_eq!(config.records, RecordSelection::Only(vec![RecordTarget::Id("r1".to_string())]));
        assert_eq!(config.update.method, UpdateMethod::Put);
        assert_eq!(config.update.overrides, UpdateOverrides { proxied: Some(false), ttl: Some(60) });
        assert_eq!(
            config.record_labels.get("r1").map(String::as_str),
            Some("home.example.com")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn credential_headers() {
        assert_eq!(
            Credential::api_token("t").auth_headers(),
            vec![("Authorization", "Bearer t".to_string())]
        );
        assert_eq!(
            Credential::api_key("ops@example.com", "k").auth_headers(),
            vec![
                ("X-Auth-Email", "ops@example.com".to_string()),
                ("X-Auth-Key", "k".to_string())
            ]
        );
    }

    #[test]
    fn credential_debug_is_redacted() {
        let debug_str = format!("{:?}", valid());
        assert!(!debug_str.contains("token-abc"));
        assert!(debug_str.contains("<REDACTED>"));
    }
}
