//! Error types for the DDNS updater
//!
//! Startup errors (configuration, invalid domain) are fatal to the daemon.
//! Everything else is raised inside an update cycle, logged by the engine,
//! and retried on the next tick.

use std::net::IpAddr;
use thiserror::Error;

/// Result type alias for DDNS operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the DDNS updater
#[derive(Error, Debug)]
pub enum Error {
    /// IP source-related errors
    #[error("IP source error: {0}")]
    IpSource(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Domain string could not be split into root and subdomain
    #[error("Invalid domain: {0}")]
    InvalidDomain(String),

    /// A remote service answered with a status other than the expected one
    #[error("Unexpected status from {service}: {status}")]
    UnexpectedStatus {
        /// Service that answered (e.g. "ip-echo", "digitalocean")
        service: String,
        /// HTTP status code
        status: u16,
    },

    /// Text that should have been an IP address
    #[error("Failed to parse address: {0:?}")]
    InvalidAddress(String),

    /// A valid address the managed record type cannot hold
    #[error("Address {0} cannot be stored in an A record")]
    UnsupportedAddress(IpAddr),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport errors
    #[error("HTTP error: {0}")]
    Http(String),

    /// Authentication errors
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Rate limiting errors
    #[error("Rate limited: {0}")]
    RateLimited(String),

    /// Record not found
    #[error("Record not found: {0}")]
    NotFound(String),

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

}

impl Error {
    /// Create an IP source error
    pub fn ip_source(msg: impl Into<String>) -> Self {
        Self::IpSource(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid domain error
    pub fn invalid_domain(domain: impl Into<String>) -> Self {
        Self::InvalidDomain(domain.into())
    }

    /// Create an unexpected status error
    pub fn unexpected_status(service: impl Into<String>, status: u16) -> Self {
        Self::UnexpectedStatus {
            service: service.into(),
            status,
        }
    }

    /// Create an invalid address error carrying the offending text
    pub fn invalid_address(text: impl Into<String>) -> Self {
        Self::InvalidAddress(text.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Create a rate limit error
    pub fn rate_limited(msg: impl Into<String>) -> Self {
        Self::RateLimited(msg.into())
    }

    /// Create a "not found" error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Whether this error must stop the daemon before the loop starts
    pub fn is_startup_error(&self) -> bool {
        matches!(self, Self::Config(_) | Self::InvalidDomain(_))
    }
}
