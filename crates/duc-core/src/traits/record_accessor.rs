// # DNS Record Accessor Trait
//
// Defines the interface for reading and updating DNS records via a provider
// API.
//
// ## Implementations
//
// - Cloudflare: `duc-provider-cloudflare` crate
//
// ## Usage
//
// ```rust,ignore
// use duc_core::{RecordAccessor, RecordFilter, UpdateOverrides};
//
// async fn bump(accessor: &dyn RecordAccessor) -> duc_core::Result<()> {
//     let record = accessor.get_record("zone-id", "record-id").await?;
//     accessor
//         .update_record("zone-id", &record, "203.0.113.7".parse().unwrap(), &UpdateOverrides::default())
//         .await?;
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

use crate::error::ApiMessage;
use crate::record::{DnsRecord, RecordFilter, UpdateOverrides};

/// Confirmation of an accepted update
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateConfirmation {
    /// The record as the provider reports it after the update
    pub record: DnsRecord,
    /// Informational messages returned alongside the result
    pub messages: Vec<ApiMessage>,
}

/// Trait for DNS record accessor implementations
///
/// Accessors are stateless and single-shot. They never decide whether an
/// update is needed and never retry; both belong to the `Reconciler`.
///
/// The credential is part of the accessor's own configuration and is attached
/// to every request it makes.
#[async_trait]
pub trait RecordAccessor: Send + Sync {
    /// List records in a zone
    ///
    /// # Parameters
    ///
    /// - `zone_id`: The zone identifier
    /// - `filter`: Which record types to keep
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<DnsRecord>)`: Records admitted by `filter`, possibly empty
    /// - `Err(Error)`: If the listing could not be fetched or decoded
    async fn list_records(
        &self,
        zone_id: &str,
        filter: RecordFilter,
    ) -> Result<Vec<DnsRecord>, crate::Error>;

    /// Look up a single record by id
    ///
    /// The default implementation scans the full zone listing.
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The record
    /// - `Err(Error::RecordNotFound)`: No record in the zone has this id
    async fn get_record(&self, zone_id: &str, record_id: &str) -> Result<DnsRecord, crate::Error> {
        self.list_records(zone_id, RecordFilter::All)
            .await?
            .into_iter()
            .find(|record| record.id == record_id)
            .ok_or_else(|| crate::Error::record_not_found(zone_id, record_id))
    }

    /// Point `record` at `new_ip`
    ///
    /// The payload is built from `record` with only `content` replaced, plus
    /// whatever `overrides` sets. The provider's application-level success
    /// flag is checked in addition to the HTTP status.
    ///
    /// # Returns
    ///
    /// - `Ok(UpdateConfirmation)`: The provider accepted the update
    /// - `Err(Error::RecordUpdateRejected)`: 2xx envelope with `success: false`
    /// - `Err(Error)`: Transport, status or decode failures
    async fn update_record(
        &self,
        zone_id: &str,
        record: &DnsRecord,
        new_ip: IpAddr,
        overrides: &UpdateOverrides,
    ) -> Result<UpdateConfirmation, crate::Error>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
