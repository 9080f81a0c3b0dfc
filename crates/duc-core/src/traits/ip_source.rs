// # Public IP Source Trait
//
// Defines the interface for discovering the host's current public IP.
//
// ## Implementations
//
// - HTTP echo services: `duc-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use duc_core::PublicIpSource;
//
// async fn show(source: &dyn PublicIpSource) -> duc_core::Result<()> {
//     let ip = source.current().await?;
//     println!("public IP: {}", ip);
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for public IP source implementations
///
/// A source is asked exactly once per run and must not cache between calls:
/// every observation is fresh.
#[async_trait]
pub trait PublicIpSource: Send + Sync {
    /// Fetch the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current public IP
    /// - `Err(Error)`: If the service is unreachable or returned garbage
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Short name for logging
    fn source_name(&self) -> &str {
        "public-ip"
    }
}
