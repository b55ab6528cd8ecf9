//! Configuration types for the DDNS updater
//!
//! This module defines all configuration structures used throughout the crate.

use crate::domain::SplitDomain;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Plaintext IP-echo endpoint used when none is configured
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org/?format=plaintext";

/// Default delay between update cycles (5 minutes)
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(300);

/// Main DDNS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DdnsConfig {
    /// Fully qualified domain name whose A record is kept current
    pub domain: String,

    /// IP source configuration
    #[serde(default)]
    pub ip_source: IpSourceConfig,

    /// DNS provider configuration
    pub provider: ProviderConfig,

    /// Optional engine settings
    #[serde(default)]
    pub engine: EngineConfig,
}

impl DdnsConfig {
    /// Create a configuration with default IP source and engine settings
    pub fn new(domain: impl Into<String>, provider: ProviderConfig) -> Self {
        Self {
            domain: domain.into(),
            ip_source: IpSourceConfig::default(),
            provider,
            engine: EngineConfig::default(),
        }
    }

    /// Set the cycle interval
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.engine.interval = interval;
        self
    }

    /// Validate the configuration
    ///
    /// The domain only has to split into root and subdomain. Label syntax
    /// is left to the provider, which owns the zone.
    pub fn validate(&self) -> Result<(), crate::Error> {
        SplitDomain::parse(&self.domain)?;
        self.ip_source.validate()?;
        self.provider.validate()?;
        self.engine.validate()?;

        Ok(())
    }
}

/// IP source configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpSourceConfig {
    /// URL returning the caller's public address as plain text
    pub url: String,
}

impl IpSourceConfig {
    /// Validate the IP source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("IP source URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "IP source URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        Ok(())
    }
}

impl Default for IpSourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_IP_ECHO_URL.to_string(),
        }
    }
}

/// DNS provider configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProviderConfig {
    /// DigitalOcean domain-records API
    #[serde(rename = "digitalocean")]
    DigitalOcean {
        /// Personal access token with write scope
        api_token: String,
        /// API base URL override (defaults to the public v2 endpoint)
        #[serde(default)]
        base_url: Option<String>,
        /// List records but never edit them
        #[serde(default)]
        dry_run: bool,
    },
}

impl ProviderConfig {
    /// DigitalOcean provider against the public API
    pub fn digitalocean(api_token: impl Into<String>) -> Self {
        ProviderConfig::DigitalOcean {
            api_token: api_token.into(),
            base_url: None,
            dry_run: false,
        }
    }

    /// Validate the provider configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            ProviderConfig::DigitalOcean {
                api_token,
                base_url,
                ..
            } => {
                if api_token.is_empty() {
                    return Err(crate::Error::config(
                        "DigitalOcean API token cannot be empty",
                    ));
                }
                if base_url.as_ref().is_some_and(|url| url.is_empty()) {
                    return Err(crate::Error::config(
                        "DigitalOcean API base URL cannot be empty",
                    ));
                }
                Ok(())
            }
        }
    }

}

// Keeps the token out of logs
impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProviderConfig::DigitalOcean {
                base_url, dry_run, ..
            } => f
                .debug_struct("DigitalOcean")
                .field("api_token", &"<REDACTED>")
                .field("base_url", base_url)
                .field("dry_run", dry_run)
                .finish(),
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Delay between the end of one cycle and the start of the next
    #[serde(default = "default_interval")]
    pub interval: Duration,

    /// Capacity of the monitoring event channel
    ///
    /// When full, new events are dropped (with a warning log).
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl EngineConfig {
    /// Validate the engine configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval.is_zero() {
            return Err(crate::Error::config("Update interval must be > 0"));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            interval: default_interval(),
            event_channel_capacity: default_event_channel_capacity(),
        }
    }
}

fn default_interval() -> Duration {
    DEFAULT_INTERVAL
}

fn default_event_channel_capacity() -> usize {
    100
}

/// Parse an interval such as `5m`, `90s`, `1h30m` or `1.5h`
///
/// A bare integer is read as seconds. Units: `ns`, `us`/`µs`, `ms`, `s`,
/// `m`, `h`.
pub fn parse_interval(input: &str) -> Result<Duration, crate::Error> {
    let text = input.trim();
    if text.is_empty() {
        return Err(crate::Error::config("interval cannot be empty"));
    }

    let interval = match text.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => parse_unit_sequence(text)?,
    };

    if interval.is_zero() {
        return Err(crate::Error::config(format!(
            "interval must be greater than zero: {text:?}"
        )));
    }
    Ok(interval)
}

fn parse_unit_sequence(text: &str) -> Result<Duration, crate::Error> {
    let invalid = || crate::Error::config(format!("invalid interval: {text:?}"));
    let is_number = |c: char| c.is_ascii_digit() || c == '.';

    let mut nanos = 0f64;
    let mut rest = text;
    while !rest.is_empty() {
        let number_end = rest.find(|c: char| !is_number(c)).ok_or_else(invalid)?;
        if number_end == 0 {
            return Err(invalid());
        }
        let value: f64 = rest[..number_end].parse().map_err(|_| invalid())?;
        rest = &rest[number_end..];

        let unit_end = rest.find(is_number).unwrap_or(rest.len());
        let scale = match &rest[..unit_end] {
            "ns" => 1.0,
            "us" | "µs" => 1e3,
            "ms" => 1e6,
            "s" => 1e9,
            "m" => 60e9,
            "h" => 3600e9,
            _ => return Err(invalid()),
        };
        nanos += value * scale;
        rest = &rest[unit_end..];
    }

    if !nanos.is_finite() || nanos > u64::MAX as f64 {
        return Err(invalid());
    }
    Ok(Duration::from_nanos(nanos.round() as u64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(domain: &str) -> DdnsConfig {
        DdnsConfig::new(domain, ProviderConfig::digitalocean("dop_v1_test"))
    }

    #[test]
    fn default_config_is_valid() {
        let config = config("home.example.com");
        assert!(config.validate().is_ok());
        assert_eq!(config.engine.interval, Duration::from_secs(300));
        assert_eq!(config.ip_source.url, DEFAULT_IP_ECHO_URL);
    }

    #[test]
    fn empty_token_is_rejected() {
        let config = DdnsConfig::new("example.com", ProviderConfig::digitalocean(""));
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let config = config("example.com").with_interval(Duration::ZERO);
        assert!(matches!(config.validate(), Err(crate::Error::Config(_))));
    }

    #[test]
    fn domain_needs_two_labels() {
        for bad in ["", "localhost"] {
            assert!(
                matches!(config(bad).validate(), Err(crate::Error::InvalidDomain(_))),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn domain_label_syntax_is_not_policed() {
        for domain in [
            "home_lab.example.com",
            "example.com.",
            "a..example.com",
            "my-host.home.example.com",
        ] {
            assert!(config(domain).validate().is_ok(), "{domain:?} should be accepted");
        }
    }

    #[test]
    fn provider_debug_redacts_token() {
        let provider = ProviderConfig::digitalocean("dop_v1_secret_value");
        let debug = format!("{provider:?}");
        assert!(!debug.contains("dop_v1_secret_value"));
        assert!(debug.contains("REDACTED"));
    }

    #[test]
    fn provider_config_deserializes_with_tag() {
        let json = r#"{"type":"digitalocean","api_token":"abc"}"#;
        let provider: ProviderConfig = serde_json::from_str(json).unwrap();
        let ProviderConfig::DigitalOcean {
            base_url, dry_run, ..
        } = provider;
        assert!(base_url.is_none());
        assert!(!dry_run);
    }

    #[test]
    fn parses_go_style_intervals() {
        assert_eq!(parse_interval("5m").unwrap(), Duration::from_secs(300));
        assert_eq!(parse_interval("90s").unwrap(), Duration::from_secs(90));
        assert_eq!(parse_interval("1h30m").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("1.5h").unwrap(), Duration::from_secs(5400));
        assert_eq!(parse_interval("250ms").unwrap(), Duration::from_millis(250));
        assert_eq!(parse_interval("10us").unwrap(), Duration::from_micros(10));
        assert_eq!(parse_interval(" 2m30s ").unwrap(), Duration::from_secs(150));
    }

    #[test]
    fn bare_integer_is_seconds() {
        assert_eq!(parse_interval("120").unwrap(), Duration::from_secs(120));
    }

    #[test]
    fn rejects_bad_intervals() {
        for bad in ["", "0", "0s", "m", "5x", "five minutes", "1..5s", "5m-"] {
            assert!(parse_interval(bad).is_err(), "{bad:?} should be rejected");
        }
    }
}
