//! Core traits for autoduc
//!
//! This module defines the seams between the reconciliation engine and the
//! outside world.
//!
//! - [`HttpExecutor`]: Issue HTTP requests
//! - [`PublicIpSource`]: Discover the host's public IP
//! - [`RecordAccessor`]: Read and update DNS records via a provider API

pub mod http_executor;
pub mod ip_source;
pub mod record_accessor;

pub use http_executor::{HttpExecutor, HttpRequest, Method, ResponseBody};
pub use ip_source::PublicIpSource;
pub use record_accessor::{RecordAccessor, UpdateConfirmation};
