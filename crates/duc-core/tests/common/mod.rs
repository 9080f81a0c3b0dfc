//! Test doubles and common utilities for reconciliation contract tests
//!
//! These doubles stand in for the network: they count calls and record what
//! would have been sent, without doing any I/O.

#![allow(dead_code)]

use duc_core::config::{Credential, DucConfig, RecordTarget};
use duc_core::error::{ApiMessage, Error, Result};
use duc_core::record::{DnsRecord, RecordFilter, RecordType, UpdateOverrides};
use duc_core::traits::{PublicIpSource, RecordAccessor, UpdateConfirmation};
use serde_json::Value;
use std::collections::HashSet;
use std::net::IpAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// An IP source that always answers with the same address
pub struct StaticIpSource {
    ip: IpAddr,
    /// Call counter for current()
    current_call_count: Arc<AtomicUsize>,
}

impl StaticIpSource {
    pub fn new(ip: &str) -> Self {
        Self {
            ip: ip.parse().expect("valid test IP"),
            current_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get the number of times current() was called
    pub fn current_call_count(&self) -> usize {
        self.current_call_count.load(Ordering::SeqCst)
    }

    /// Create a new StaticIpSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            ip: other.ip,
            current_call_count: Arc::clone(&other.current_call_count),
        }
    }
}

#[async_trait::async_trait]
impl PublicIpSource for StaticIpSource {
    async fn current(&self) -> Result<IpAddr> {
        self.current_call_count.fetch_add(1, Ordering::SeqCst);
        Ok(self.ip)
    }
}

/// An IP source whose service is unreachable
pub struct UnreachableIpSource;

#[async_trait::async_trait]
impl PublicIpSource for UnreachableIpSource {
    async fn current(&self) -> Result<IpAddr> {
        Err(Error::transport("https://ip.example.test", "connection refused"))
    }
}

/// One recorded write
#[derive(Debug, Clone)]
pub struct UpdateCall {
    pub zone_id: String,
    pub record_id: String,
    pub new_ip: IpAddr,
    /// The payload the accessor would have sent
    pub payload: Value,
}

/// A mock RecordAccessor that serves a fixed zone and tracks writes
pub struct MockRecordAccessor {
    /// Records in the zone
    records: Vec<DnsRecord>,
    /// Record ids whose update the provider rejects (`success: false`)
    rejected: HashSet<String>,
    /// Record ids whose update fails on the wire
    unreachable: HashSet<String>,
    /// Whether listing the zone fails
    listing_fails: bool,
    /// Call counter for list_records()
    list_call_count: Arc<AtomicUsize>,
    /// Recorded update calls
    updates: Arc<Mutex<Vec<UpdateCall>>>,
}

impl MockRecordAccessor {
    pub fn new(records: Vec<DnsRecord>) -> Self {
        Self {
            records,
            rejected: HashSet::new(),
            unreachable: HashSet::new(),
            listing_fails: false,
            list_call_count: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Make the provider reject updates of `record_id`
    pub fn rejecting(mut self, record_id: &str) -> Self {
        self.rejected.insert(record_id.to_string());
        self
    }

    /// Make updates of `record_id` fail with a transport error
    pub fn unreachable_for(mut self, record_id: &str) -> Self {
        self.unreachable.insert(record_id.to_string());
        self
    }

    /// Make zone listing fail
    pub fn failing_listing(mut self) -> Self {
        self.listing_fails = true;
        self
    }

    /// Get the number of times list_records() was called
    pub fn list_call_count(&self) -> usize {
        self.list_call_count.load(Ordering::SeqCst)
    }

    /// Get the number of update attempts
    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Get the recorded update calls
    pub fn updates(&self) -> Vec<UpdateCall> {
        self.updates.lock().unwrap().clone()
    }

    /// Get the ids of records that were written
    pub fn updated_ids(&self) -> Vec<String> {
        self.updates()
            .into_iter()
            .map(|call| call.record_id)
            .collect()
    }

    /// Create a new MockRecordAccessor that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            records: other.records.clone(),
            rejected: other.rejected.clone(),
            unreachable: other.unreachable.clone(),
            listing_fails: other.listing_fails,
            list_call_count: Arc::clone(&other.list_call_count),
            updates: Arc::clone(&other.updates),
        }
    }
}

#[async_trait::async_trait]
impl RecordAccessor for MockRecordAccessor {
    async fn list_records(&self, zone_id: &str, filter: RecordFilter) -> Result<Vec<DnsRecord>> {
        self.list_call_count.fetch_add(1, Ordering::SeqCst);

        if self.listing_fails {
            return Err(Error::http_status(
                format!("https://api.example.test/zones/{}/dns_records", zone_id),
                403,
                "forbidden",
            ));
        }

        Ok(self
            .records
            .iter()
            .filter(|record| filter.admits(record))
            .cloned()
            .collect())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record: &DnsRecord,
        new_ip: IpAddr,
        overrides: &UpdateOverrides,
    ) -> Result<UpdateConfirmation> {
        let payload = record.update_payload(new_ip, overrides)?;
        self.updates.lock().unwrap().push(UpdateCall {
            zone_id: zone_id.to_string(),
            record_id: record.id.clone(),
            new_ip,
            payload,
        });

        if self.unreachable.contains(&record.id) {
            return Err(Error::transport(
                format!("https://api.example.test/zones/{}/dns_records/{}", zone_id, record.id),
                "operation timed out",
            ));
        }

        if self.rejected.contains(&record.id) {
            return Err(Error::RecordUpdateRejected {
                record_id: record.id.clone(),
                errors: vec![ApiMessage {
                    code: Some(9005),
                    message: "Content for A record is invalid.".to_string(),
                }],
            });
        }

        let mut updated = record.clone();
        updated.content = new_ip.to_string();
        Ok(UpdateConfirmation {
            record: updated,
            messages: Vec::new(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// Shorthand for an A record
pub fn a_record(id: &str, content: &str) -> DnsRecord {
    DnsRecord::new(id, format!("{}.example.com", id), RecordType::A, content)
}

/// Shorthand for an AAAA record
pub fn aaaa_record(id: &str, content: &str) -> DnsRecord {
    DnsRecord::new(id, format!("{}.example.com", id), RecordType::Aaaa, content)
}

/// Helper to create a minimal DucConfig for testing
pub fn minimal_config() -> DucConfig {
    DucConfig::new("zone-test", Credential::api_token("test-token"))
        .with_public_ip_url("https://ip.example.test")
}

/// Helper to create a config restricted to record ids
pub fn config_for_ids(ids: &[&str]) -> DucConfig {
    minimal_config().with_records(
        ids.iter()
            .map(|id| RecordTarget::Id((*id).to_string()))
            .collect(),
    )
}
