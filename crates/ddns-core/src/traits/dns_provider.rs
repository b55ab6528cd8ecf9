// # DNS Provider Trait
//
// Defines the interface for reading and editing DNS records via provider APIs.
//
// ## Implementations
//
// - DigitalOcean: `ddns-provider-digitalocean` crate
//
// ## Usage
//
// ```rust,ignore
// use ddns_core::traits::dns_provider::{find_a_record, DnsProvider};
//
// #[tokio::main]
// async fn main() -> anyhow::Result<()> {
//     let provider = /* DnsProvider implementation */;
//
//     let records = provider.list_records("example.com").await?;
//     let record = find_a_record(&records, "home")?;
//     provider
//         .edit_record("example.com", record, "203.0.113.7".parse()?)
//         .await?;
//
//     Ok(())
// }
// ```

use async_trait::async_trait;
use std::fmt;
use std::net::IpAddr;

use crate::error::{Error, Result};

/// Record type managed by the updater
pub const A_RECORD: &str = "A";

/// A provider-side DNS record
///
/// The engine only holds these for the duration of one cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// The record ID (provider-specific)
    pub id: String,
    /// The record type ("A", "AAAA", "CNAME", ...)
    pub record_type: String,
    /// Name relative to the root domain ("@"-style apex records use the root)
    pub name: String,
    /// Record value, an IP literal for address records
    pub data: String,
    /// Time-to-live for the record
    pub ttl: Option<u32>,
}

impl DnsRecord {
    /// Parse the record value as an IP address
    ///
    /// Whitespace around the stored value is tolerated, so `" 203.0.113.5\n"`
    /// reads as `203.0.113.5`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAddress`] carrying the stored value.
    pub fn address(&self) -> Result<IpAddr> {
        self.data
            .trim()
            .parse()
            .map_err(|_| Error::invalid_address(self.data.clone()))
    }
}

impl fmt::Display for DnsRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} (id {})",
            self.name, self.record_type, self.data, self.id
        )
    }
}

/// Find the A record with exactly the given name
///
/// # Errors
///
/// Returns [`Error::NotFound`] when no such record exists. The updater
/// never creates records, so this ends the cycle.
pub fn find_a_record<'a>(records: &'a [DnsRecord], name: &str) -> Result<&'a DnsRecord> {
    records
        .iter()
        .find(|record| record.record_type == A_RECORD && record.name == name)
        .ok_or_else(|| {
            Error::not_found(format!(
                "no {A_RECORD} record named {name:?} among {} record(s)",
                records.len()
            ))
        })
}

/// Trait for DNS provider implementations
///
/// This trait defines the two calls the engine makes per cycle. Both are
/// authenticated with the credential the provider was built from.
///
/// # Trust Level: Untrusted
///
/// ## Allowed Capabilities
/// - ✅ Perform HTTP/HTTPS API calls to their endpoints only
/// - ✅ Parse provider-specific responses
/// - ✅ Return success or failure
///
/// ## Forbidden Capabilities
/// - ❌ Spawn tasks or threads
/// - ❌ Implement retry logic or backoff (the next cycle retries)
/// - ❌ Cache records between calls
/// - ❌ Decide whether an update is needed (owned by `DdnsEngine`)
/// - ❌ Create records that do not exist
#[async_trait]
pub trait DnsProvider: Send + Sync {
    /// List every record in the root domain's zone
    ///
    /// # Parameters
    ///
    /// - `root`: The registrable domain (e.g., "example.com")
    async fn list_records(&self, root: &str) -> Result<Vec<DnsRecord>>;

    /// Point an existing record at a new address
    ///
    /// # Parameters
    ///
    /// - `root`: The registrable domain the record belongs to
    /// - `record`: The record to edit, as returned by [`DnsProvider::list_records`]
    /// - `new_ip`: The new record value
    ///
    /// # Returns
    ///
    /// - `Ok(DnsRecord)`: The record as stored after the edit
    /// - `Err(Error)`: If the edit failed
    async fn edit_record(&self, root: &str, record: &DnsRecord, new_ip: IpAddr)
    -> Result<DnsRecord>;

    /// Get the provider name (for logging/debugging)
    fn provider_name(&self) -> &'static str;
}
