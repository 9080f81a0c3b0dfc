//! DNS record model
//!
//! Records are read from the provider at the start of a run, compared against
//! the observed public IP, and sent back as update payloads when they drift.

use std::fmt;
use std::net::IpAddr;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use crate::error::{Error, Result};

/// Provider fields that are reported on read but must not be echoed back
const READ_ONLY_FIELDS: &[&str] = &[
    "id",
    "zone_id",
    "zone_name",
    "created_on",
    "modified_on",
    "proxiable",
    "locked",
    "meta",
];

/// TTL value the provider interprets as "automatic"
pub const AUTOMATIC_TTL: u32 = 1;

/// DNS record type
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RecordType {
    /// IPv4 address record
    A,
    /// IPv6 address record
    Aaaa,
    Cname,
    Mx,
    Txt,
    Ns,
    Srv,
    Caa,
    /// Any type this client does not model explicitly
    Other(String),
}

impl RecordType {
    /// Whether records of this type hold an IP address
    pub fn is_address(&self) -> bool {
        matches!(self, Self::A | Self::Aaaa)
    }

    /// The address record type that can hold `ip`
    pub fn for_ip(ip: IpAddr) -> Self {
        match ip {
            IpAddr::V4(_) => Self::A,
            IpAddr::V6(_) => Self::Aaaa,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::A => "A",
            Self::Aaaa => "AAAA",
            Self::Cname => "CNAME",
            Self::Mx => "MX",
            Self::Txt => "TXT",
            Self::Ns => "NS",
            Self::Srv => "SRV",
            Self::Caa => "CAA",
            Self::Other(other) => other,
        }
    }
}

impl From<String> for RecordType {
    fn from(value: String) -> Self {
        match value.to_ascii_uppercase().as_str() {
            "A" => Self::A,
            "AAAA" => Self::Aaaa,
            "CNAME" => Self::Cname,
            "MX" => Self::Mx,
            "TXT" => Self::Txt,
            "NS" => Self::Ns,
            "SRV" => Self::Srv,
            "CAA" => Self::Caa,
            _ => Self::Other(value),
        }
    }
}

impl From<RecordType> for String {
    fn from(value: RecordType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A DNS record as reported by the provider
///
/// `id`, `type` and `content` are required; a provider response missing any
/// of them fails to deserialize. Fields this client does not model are kept
/// in `extra` so they survive an update round trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsRecord {
    /// Provider-assigned identifier, unique per zone
    pub id: String,

    /// Fully-qualified record name
    #[serde(default)]
    pub name: String,

    /// Record type
    #[serde(rename = "type")]
    pub record_type: RecordType,

    /// Record content (an IP address for A/AAAA records)
    pub content: String,

    /// Time-to-live in seconds, `1` meaning automatic
    #[serde(default = "default_ttl")]
    pub ttl: u32,

    /// Whether traffic is proxied through the provider
    #[serde(default, deserialize_with = "null_as_false")]
    pub proxied: bool,

    /// Any additional provider-specific fields
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_ttl() -> u32 {
    AUTOMATIC_TTL
}

fn null_as_false<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<bool>::deserialize(deserializer)?.unwrap_or(false))
}

/// Field overrides applied on top of the existing record when updating
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateOverrides {
    /// Force the proxied flag (the classic setup forces `false`)
    #[serde(default)]
    pub proxied: Option<bool>,

    /// Force a TTL
    #[serde(default)]
    pub ttl: Option<u32>,
}

impl DnsRecord {
    /// Create a record with the fields the core cares about
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        record_type: RecordType,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            record_type,
            content: content.into(),
            ttl: AUTOMATIC_TTL,
            proxied: false,
            extra: Map::new(),
        }
    }

    /// Whether the record already points at `ip`
    ///
    /// Content is compared as a parsed address so equivalent spellings of the
    /// same IPv6 address match. Unparsable content never matches.
    pub fn points_to(&self, ip: IpAddr) -> bool {
        self.content
            .trim()
            .parse::<IpAddr>()
            .is_ok_and(|current| current == ip)
    }

    /// Whether this record's type can hold `ip`
    pub fn accepts(&self, ip: IpAddr) -> bool {
        self.record_type == RecordType::for_ip(ip)
    }

    /// Build the update payload for this record with `content` set to `new_ip`
    ///
    /// Every other writable field is carried over unchanged unless `overrides`
    /// says otherwise.
    pub fn update_payload(&self, new_ip: IpAddr, overrides: &UpdateOverrides) -> Result<Value> {
        let Value::Object(mut payload) = serde_json::to_value(self)? else {
            return Err(Error::decode("DNS record did not serialize to an object"));
        };

        for field in READ_ONLY_FIELDS {
            payload.remove(*field);
        }

        payload.insert("content".to_string(), Value::String(new_ip.to_string()));

        if let Some(proxied) = overrides.proxied {
            payload.insert("proxied".to_string(), Value::Bool(proxied));
        }
        if let Some(ttl) = overrides.ttl {
            payload.insert("ttl".to_string(), Value::from(ttl));
        }

        Ok(Value::Object(payload))
    }
}

/// Which records a zone listing should return
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordFilter {
    /// Every record in the zone
    All,
    /// Only A and AAAA records
    #[default]
    AddressOnly,
}

impl RecordFilter {
    pub fn admits(&self, record: &DnsRecord) -> bool {
        match self {
            Self::All => true,
            Self::AddressOnly => record.record_type.is_address(),
        }
    }
}
