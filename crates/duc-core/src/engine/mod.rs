//! Reconciliation engine
//!
//! The Reconciler is responsible for:
//! - Observing the public IP once per run via PublicIpSource
//! - Listing the zone's address records via RecordAccessor
//! - Deciding, per record, whether an update is needed
//! - Driving the accessor to correct drifted records
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────┐      ┌──────────────────┐
//! │ PublicIpSource │      │  RecordAccessor  │
//! └────────────────┘      └──────────────────┘
//!          │  observed IP        ▲     │ records
//!          ▼                     │     ▼
//!        ┌─────────────────────────────────┐
//!        │           Reconciler            │
//!        └─────────────────────────────────┘
//!                        │
//!                        ▼
//!                   RunSummary
//! ```
//!
//! ## Run Flow
//!
//! 1. Fetch the public IP (failure aborts the run, nothing is written)
//! 2. List the zone once (failure aborts the run)
//! 3. For each candidate: skip when current, otherwise update
//! 4. Per-record failures are recorded and, by default, do not stop the run

mod summary;

pub use summary::{RecordOutcome, RecordReport, RunStatus, RunSummary, SkipReason};

use std::collections::{BTreeMap, HashSet};
use std::net::IpAddr;

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::config::{DucConfig, FailurePolicy, RecordSelection, RecordTarget};
use crate::error::{Error, Result};
use crate::record::{DnsRecord, RecordFilter, UpdateOverrides};
use crate::traits::{PublicIpSource, RecordAccessor};

/// Core reconciliation engine
///
/// Holds no state across runs: every call to [`Reconciler::reconcile()`]
/// re-derives everything from the IP source and the provider.
pub struct Reconciler {
    /// Public IP source
    ip_source: Box<dyn PublicIpSource>,

    /// DNS record accessor
    accessor: Box<dyn RecordAccessor>,

    /// Zone holding the managed records
    zone_id: String,

    /// Which records to reconcile
    records: RecordSelection,

    /// Field overrides applied to every update
    overrides: UpdateOverrides,

    /// What a per-record failure means for the run
    failure_policy: FailurePolicy,

    /// Decide and log, but never write
    dry_run: bool,

    /// Configured display names by record id
    labels: BTreeMap<String, String>,
}

/// A configured target that matched nothing in the zone
struct MissingTarget {
    target: RecordTarget,
    error: Error,
}

impl Reconciler {
    /// Create a new reconciler
    ///
    /// # Parameters
    ///
    /// - `ip_source`: Public IP source implementation
    /// - `accessor`: DNS record accessor implementation
    /// - `config`: Run configuration (validated here)
    pub fn new(
        ip_source: Box<dyn PublicIpSource>,
        accessor: Box<dyn RecordAccessor>,
        config: DucConfig,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            ip_source,
            accessor,
            zone_id: config.zone_id,
            records: config.records,
            overrides: config.update.overrides,
            failure_policy: config.failure_policy,
            dry_run: config.dry_run,
            labels: config.record_labels,
        })
    }

    /// Run one reconciliation pass
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: The run completed; individual records may have failed
    /// - `Err(Error)`: The run was aborted (public IP or zone listing failed,
    ///   or a record failed under [`FailurePolicy::Abort`])
    pub async fn reconcile(&self) -> Result<RunSummary> {
        let started_at = Utc::now();

        let observed_ip = self.ip_source.current().await.map_err(|e| {
            error!(
                source = self.ip_source.source_name(),
                error_kind = e.kind(),
                "Failed to fetch current public IP: {}",
                e
            );
            e
        })?;
        info!(
            observed_ip = %observed_ip,
            source = self.ip_source.source_name(),
            "Public IP observed"
        );

        let (candidates, missing) = self.resolve_candidates().await?;
        let mut missing = missing.into_iter();

        if self.failure_policy == FailurePolicy::Abort
            && let Some(first) = missing.next()
        {
            warn!(target = %first.target, "Aborting run: configured record missing");
            return Err(first.error);
        }

        let mut reports: Vec<RecordReport> = missing
            .map(|missing| RecordReport {
                record_id: missing.target.key().to_string(),
                record_name: self.target_name(&missing.target),
                outcome: RecordOutcome::Failed(missing.error),
            })
            .collect();

        for record in candidates {
            let outcome = match (self.failure_policy, self.reconcile_record(&record, observed_ip).await) {
                (FailurePolicy::Abort, RecordOutcome::Failed(err)) => {
                    error!(
                        record_id = %record.id,
                        record_name = %self.record_name(&record),
                        "Aborting run after failed record"
                    );
                    return Err(err);
                }
                (_, outcome) => outcome,
            };

            reports.push(RecordReport {
                record_name: self.record_name(&record).to_string(),
                record_id: record.id,
                outcome,
            });
        }

        let summary = RunSummary {
            observed_ip,
            reports,
            started_at,
            finished_at: Utc::now(),
        };

        info!(
            observed_ip = %summary.observed_ip,
            updated = summary.updated(),
            skipped = summary.skipped(),
            failed = summary.failed(),
            "Reconciliation finished"
        );

        Ok(summary)
    }

    /// List every record in the zone, unfiltered
    ///
    /// The list-only side branch: no public IP lookup, no writes.
    pub async fn list_zone(&self) -> Result<Vec<DnsRecord>> {
        let records = self
            .accessor
            .list_records(&self.zone_id, RecordFilter::All)
            .await
            .map_err(|e| {
                error!(zone_id = %self.zone_id, "Failed to list DNS records: {}", e);
                e
            })?;

        info!(zone_id = %self.zone_id, count = records.len(), "Listed zone records");
        Ok(records)
    }

    /// Work out which records this run touches
    ///
    /// Returns the candidates plus the configured targets that matched nothing.
    async fn resolve_candidates(&self) -> Result<(Vec<DnsRecord>, Vec<MissingTarget>)> {
        if let RecordSelection::Only(targets) = &self.records
            && targets.is_empty()
        {
            debug!("No records configured, nothing to reconcile");
            return Ok((Vec::new(), Vec::new()));
        }

        let listed = self
            .accessor
            .list_records(&self.zone_id, RecordFilter::AddressOnly)
            .await
            .map_err(|e| {
                error!(
                    zone_id = %self.zone_id,
                    provider = self.accessor.provider_name(),
                    error_kind = e.kind(),
                    "Failed to list DNS records: {}",
                    e
                );
                e
            })?;

        debug!(zone_id = %self.zone_id, count = listed.len(), "Fetched address records");

        let targets = match &self.records {
            RecordSelection::All => return Ok((listed, Vec::new())),
            RecordSelection::Only(targets) => targets,
        };

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();
        let mut missing = Vec::new();

        for target in targets {
            let mut matched = false;
            for record in listed.iter().filter(|record| target.matches(record)) {
                matched = true;
                if seen.insert(record.id.clone()) {
                    candidates.push(record.clone());
                }
            }

            if !matched {
                error!(
                    zone_id = %self.zone_id,
                    target = %target,
                    record_name = %self.target_name(target),
                    "Configured DNS record not found in zone"
                );
                missing.push(MissingTarget {
                    target: target.clone(),
                    error: Error::record_not_found(&self.zone_id, target.to_string()),
                });
            }
        }

        Ok((candidates, missing))
    }

    /// Name to show for a listed record: the configured label, else the provider's name
    fn record_name<'a>(&'a self, record: &'a DnsRecord) -> &'a str {
        self.labels
            .get(&record.id)
            .map(String::as_str)
            .unwrap_or(&record.name)
    }

    fn target_name(&self, target: &RecordTarget) -> String {
        match target {
            RecordTarget::Id(id) => self.labels.get(id).cloned().unwrap_or_default(),
            RecordTarget::Name(name) => name.clone(),
        }
    }

    /// Decide and act on a single record
    async fn reconcile_record(&self, record: &DnsRecord, observed_ip: IpAddr) -> RecordOutcome {
        if !record.accepts(observed_ip) {
            debug!(
                record_id = %record.id,
                record_name = %self.record_name(record),
                record_type = %record.record_type,
                observed_ip = %observed_ip,
                "Record type cannot hold observed address, skipping"
            );
            return RecordOutcome::Skipped(SkipReason::AddressFamilyMismatch);
        }

        if record.points_to(observed_ip) {
            info!(
                record_id = %record.id,
                record_name = %self.record_name(record),
                content = %record.content,
                outcome = "skipped",
                "DNS record already current"
            );
            return RecordOutcome::Skipped(SkipReason::AlreadyCurrent);
        }

        if self.dry_run {
            match record.update_payload(observed_ip, &self.overrides) {
                Ok(payload) => {
                    info!(
                        record_id = %record.id,
                        record_name = %self.record_name(record),
                        "[DRY-RUN] Would update {} -> {} with payload: {}",
                        record.content,
                        observed_ip,
                        payload
                    );
                    return RecordOutcome::Skipped(SkipReason::DryRun);
                }
                Err(e) => return RecordOutcome::Failed(e),
            }
        }

        info!(
            record_id = %record.id,
            record_name = %self.record_name(record),
            previous = %record.content,
            new_ip = %observed_ip,
            "New public IP detected, updating DNS record"
        );

        match self
            .accessor
            .update_record(&self.zone_id, record, observed_ip, &self.overrides)
            .await
        {
            Ok(confirmation) => {
                info!(
                    record_id = %record.id,
                    record_name = %self.record_name(record),
                    content = %confirmation.record.content,
                    outcome = "updated",
                    "DNS record updated"
                );
                RecordOutcome::Updated {
                    previous: record.content.clone(),
                    current: observed_ip,
                }
            }
            Err(e) => {
                warn!(
                    record_id = %record.id,
                    record_name = %self.record_name(record),
                    provider = self.accessor.provider_name(),
                    error_kind = e.kind(),
                    outcome = "failed",
                    "Failed to update DNS record: {}",
                    e
                );
                RecordOutcome::Failed(e)
            }
        }
    }
}
