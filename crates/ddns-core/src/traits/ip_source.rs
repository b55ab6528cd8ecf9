// # IP Source Trait
//
// Defines the interface for discovering the machine's public address.
//
// ## Implementations
//
// - HTTP IP-echo service: `ddns-ip-http` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::IpSource;
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let source = /* IpSource implementation */;
//
//     let current_ip = source.current().await?;
//     println!("public address: {current_ip}");
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::net::IpAddr;

/// Trait for IP source implementations
///
/// The engine calls [`IpSource::current`] once per cycle. Implementations
/// are observers only:
///
/// - no retries (the next cycle is the retry)
/// - no caching between calls
/// - no background tasks
#[async_trait]
pub trait IpSource: Send + Sync {
    /// Get the current public IP address
    ///
    /// # Returns
    ///
    /// - `Ok(IpAddr)`: The current IP address
    /// - `Err(Error)`: If unable to determine the current IP
    async fn current(&self) -> Result<IpAddr, crate::Error>;

    /// Short name for logging (e.g. "http")
    fn source_name(&self) -> &'static str;
}
