// # HTTP IP Source
//
// This crate provides the IP-echo source for the DDNS updater.
//
// ## Contract
//
// One GET per call against a plaintext endpoint (e.g. api.ipify.org):
// - the answer must be HTTP 200, anything else is an error carrying the status
// - the body, trimmed, must be an IPv4 or IPv6 literal
// - nothing is cached and nothing is retried; the engine's next cycle asks again

use ddns_core::config::IpSourceConfig;
use ddns_core::traits::IpSource;
use ddns_core::{Error, Result};

use reqwest::StatusCode;
use std::net::IpAddr;
use std::time::Duration;

/// Request timeout for the IP-echo service
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Service name used in errors and logs
const SERVICE: &str = "ip-echo";

/// HTTP-based IP source
#[derive(Debug, Clone)]
pub struct HttpIpSource {
    /// URL to fetch IP from
    url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `url`: URL to fetch IP from (e.g., "https://api.ipify.org/?format=plaintext")
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            url: url.into(),
            client,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &IpSourceConfig) -> Result<Self> {
        config.validate()?;
        Self::new(config.url.clone())
    }

    /// The endpoint this source queries
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch current IP from the echo service
    async fn fetch_ip(&self) -> Result<IpAddr> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|e| Error::ip_source(format!("Request to {} failed: {}", self.url, e)))?;

        let status = response.status();
        if status != StatusCode::OK {
            tracing::warn!("IP-echo service {} answered {}", self.url, status);
            return Err(Error::unexpected_status(SERVICE, status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::ip_source(format!("Failed to read response: {}", e)))?;

        parse_ip_body(&body)
    }
}

/// Parse an IP-echo response body
///
/// Surrounding whitespace (typically a trailing newline) is ignored.
pub fn parse_ip_body(body: &str) -> Result<IpAddr> {
    body.trim()
        .parse()
        .map_err(|_| Error::invalid_address(body))
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self) -> Result<IpAddr> {
        let ip = self.fetch_ip().await?;
        tracing::debug!("IP-echo service {} reports {}", self.url, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}
