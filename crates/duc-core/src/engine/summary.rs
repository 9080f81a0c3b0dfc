//! Per-record outcomes and the run summary

use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, Utc};

use crate::error::Error;

/// Why a record was left alone
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Content already equals the observed IP
    AlreadyCurrent,
    /// The record type cannot hold the observed address (A vs IPv6, AAAA vs IPv4)
    AddressFamilyMismatch,
    /// An update was due but dry-run mode suppressed it
    DryRun,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyCurrent => "already_current",
            Self::AddressFamilyMismatch => "address_family_mismatch",
            Self::DryRun => "dry_run",
        }
    }
}

/// Result of reconciling one record
#[derive(Debug)]
pub enum RecordOutcome {
    /// The provider accepted the new content
    Updated {
        /// Content before the update
        previous: String,
        /// The address now held by the record
        current: IpAddr,
    },
    /// No write was issued
    Skipped(SkipReason),
    /// The record could not be reconciled
    Failed(Error),
}

impl RecordOutcome {
    /// Short stable label for structured logs
    pub fn label(&self) -> &'static str {
        match self {
            Self::Updated { .. } => "updated",
            Self::Skipped(_) => "skipped",
            Self::Failed(_) => "failed",
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Outcome for one record, with enough identity to log it
#[derive(Debug)]
pub struct RecordReport {
    pub record_id: String,
    pub record_name: String,
    pub outcome: RecordOutcome,
}

/// Overall status of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// Every record is updated or already current
    Clean,
    /// The run finished but at least one record failed
    CompletedWithFailures,
}

/// Everything a completed run decided
#[derive(Debug)]
pub struct RunSummary {
    /// The public IP observed at the start of the run
    pub observed_ip: IpAddr,
    /// One report per candidate record, in processing order
    pub reports: Vec<RecordReport>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    pub fn updated(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Updated { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|outcome| matches!(outcome, RecordOutcome::Skipped(_)))
    }

    pub fn failed(&self) -> usize {
        self.count(RecordOutcome::is_failure)
    }

    /// Reports whose outcome is a failure
    pub fn failures(&self) -> impl Iterator<Item = &RecordReport> {
        self.reports.iter().filter(|report| report.outcome.is_failure())
    }

    pub fn status(&self) -> RunStatus {
        if self.failed() == 0 {
            RunStatus::Clean
        } else {
            RunStatus::CompletedWithFailures
        }
    }

    fn count(&self, predicate: impl Fn(&RecordOutcome) -> bool) -> usize {
        self.reports
            .iter()
            .filter(|report| predicate(&report.outcome))
            .count()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "observed {}: {} updated, {} skipped, {} failed",
            self.observed_ip,
            self.updated(),
            self.skipped(),
            self.failed()
        )
    }
}
