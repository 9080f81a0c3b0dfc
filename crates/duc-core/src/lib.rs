// # duc-core
//
// Core library for the autoduc dynamic DNS client.
//
// ## Architecture Overview
//
// This library provides the decision-making half of a dynamic DNS update run:
// - **HttpExecutor**: Trait for issuing HTTP requests (JSON or raw text back)
// - **PublicIpSource**: Trait for discovering the host's public IP
// - **RecordAccessor**: Trait for listing and updating DNS records
// - **Reconciler**: Compares the observed IP with each record and fixes drift
//
// ## Design Principles
//
// 1. **Stateless runs**: Nothing is cached or persisted between runs
// 2. **Explicit configuration**: The core never reads the environment
// 3. **Typed outcomes**: Per-record results are values, not control flow
// 4. **Library-First**: The binary is a thin shell around this crate

pub mod config;
pub mod engine;
pub mod error;
pub mod record;
pub mod traits;

// Re-export core types for convenience
pub use config::{Credential, DucConfig, FailurePolicy, RecordSelection, RecordTarget};
pub use engine::{Reconciler, RecordOutcome, RecordReport, RunStatus, RunSummary, SkipReason};
pub use error::{ApiMessage, Error, Result};
pub use record::{DnsRecord, RecordFilter, RecordType, UpdateOverrides};
pub use traits::{HttpExecutor, HttpRequest, Method, PublicIpSource, RecordAccessor, ResponseBody};
