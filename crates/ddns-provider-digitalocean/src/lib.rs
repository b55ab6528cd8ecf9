// # DigitalOcean DNS Provider
//
// This crate provides the DigitalOcean DNS provider for the DDNS updater.
//
// ## Behaviour
//
// - ✅ Lists every record of the root domain, following pagination
// - ✅ Edits an existing record by ID with a new `data` value
// - ✅ Full error propagation to the engine (the next cycle is the retry)
// - ✅ HTTP timeout configured (30 seconds)
// - ✅ Specific error handling for HTTP status codes (401/403, 404, 429, 5xx)
// - ✅ Dry-run mode for safe testing
// - ❌ NO record creation (the updater manages records, it does not provision them)
// - ❌ NO retry or backoff logic
// - ❌ NO caching between calls
//
// ## Security Requirements
//
// - API token NEVER appears in logs or Debug output
// - API token is sent only as `Authorization: Bearer <token>`
// - Provider MUST fail fast if token is empty
//
// ## API Reference
//
// - DigitalOcean API v2: https://docs.digitalocean.com/reference/api/
// - List records: GET `/v2/domains/:domain/records?page=N&per_page=M`
// - Update record: PUT `/v2/domains/:domain/records/:record_id`

use async_trait::async_trait;
use ddns_core::config::ProviderConfig;
use ddns_core::traits::{DnsProvider, DnsRecord};
use ddns_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// DigitalOcean API base URL
pub const DIGITALOCEAN_API_BASE: &str = "https://api.digitalocean.com/v2";

/// Default HTTP timeout for API requests (30 seconds)
const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Records requested per page (the API maximum)
const RECORDS_PER_PAGE: u32 = 200;

/// Upper bound on pages fetched by one listing
const MAX_PAGES: u32 = 50;

/// Provider name used in errors and logs
const PROVIDER: &str = "digitalocean";

/// One page of `GET /domains/:domain/records`
#[derive(Debug, Deserialize)]
struct RecordsPage {
    domain_records: Vec<WireRecord>,
    #[serde(default)]
    links: Links,
}

#[derive(Debug, Default, Deserialize)]
struct Links {
    #[serde(default)]
    pages: Option<Pages>,
}

#[derive(Debug, Deserialize)]
struct Pages {
    #[serde(default)]
    next: Option<String>,
}

/// Body of `PUT /domains/:domain/records/:id`
#[derive(Debug, Deserialize)]
struct RecordEnvelope {
    domain_record: WireRecord,
}

/// A domain record as DigitalOcean serializes it
#[derive(Debug, Deserialize)]
struct WireRecord {
    id: u64,
    #[serde(rename = "type")]
    record_type: String,
    name: String,
    #[serde(default)]
    data: String,
    #[serde(default)]
    ttl: Option<u32>,
}

impl From<WireRecord> for DnsRecord {
    fn from(wire: WireRecord) -> Self {
        DnsRecord {
            id: wire.id.to_string(),
            record_type: wire.record_type,
            name: wire.name,
            data: wire.data,
            ttl: wire.ttl,
        }
    }
}

#[derive(Debug, Serialize)]
struct EditRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    data: String,
}

/// DigitalOcean DNS provider
///
/// One concrete client built from the bearer token at startup and reused
/// for both reads and writes.
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (record listing)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct DigitalOceanProvider {
    /// DigitalOcean personal access token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without trailing slash
    base_url: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for DigitalOceanProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DigitalOceanProvider")
            .field("api_token", &"<REDACTED>")
            .field("base_url", &self.base_url)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl DigitalOceanProvider {
    /// Create a new DigitalOcean provider
    ///
    /// # Parameters
    ///
    /// - `api_token`: Personal access token with write scope
    /// - `base_url`: Optional API base URL (defaults to [`DIGITALOCEAN_API_BASE`])
    /// - `dry_run`: If true, perform GET requests but skip PUT updates
    ///
    /// # Errors
    ///
    /// An empty token is a configuration error.
    pub fn new(
        api_token: impl Into<String>,
        base_url: Option<String>,
        dry_run: bool,
    ) -> Result<Self> {
        let api_token = api_token.into();
        if api_token.is_empty() {
            return Err(Error::config("DigitalOcean API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(DEFAULT_HTTP_TIMEOUT)
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        let base_url = base_url
            .as_deref()
            .unwrap_or(DIGITALOCEAN_API_BASE)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_token,
            base_url,
            client,
            dry_run,
        })
    }

    /// Create a provider from configuration
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        match config {
            ProviderConfig::DigitalOcean {
                api_token,
                base_url,
                dry_run,
            } => {
                if *dry_run {
                    tracing::warn!(
                        "DigitalOcean provider running in DRY-RUN mode - no changes will be made"
                    );
                }
                Self::new(api_token.clone(), base_url.clone(), *dry_run)
            }
        }
    }

    /// Whether edits are skipped
    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    fn records_url(&self, root: &str) -> String {
        format!("{}/domains/{}/records", self.base_url, root)
    }

    /// Fetch one page of records
    ///
    /// # API Call
    ///
    /// ```http
    /// GET /v2/domains/example.com/records?page=1&per_page=200
    /// Authorization: Bearer <token>
    /// ```
    async fn fetch_page(&self, root: &str, page: u32) -> Result<RecordsPage> {
        let response = self
            .client
            .get(self.records_url(root))
            .query(&[("page", page), ("per_page", RECORDS_PER_PAGE)])
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let response = check_status(response, &format!("Listing records of {root}")).await?;

        response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))
    }
}

/// Map a non-success response onto the error taxonomy
async fn check_status(response: reqwest::Response, context: &str) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string());

    Err(match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        404 => Error::not_found(format!("{}: {} - {}", context, status, error_text)),
        429 => Error::rate_limited(format!(
            "Rate limit exceeded. Please retry later. Status: {}",
            status
        )),
        500..=599 => Error::provider(
            PROVIDER,
            format!("DigitalOcean server error (transient): {} - {}", status, error_text),
        ),
        _ => Error::provider(
            PROVIDER,
            format!("{} failed: {} - {}", context, status, error_text),
        ),
    })
}

#[async_trait]
impl DnsProvider for DigitalOceanProvider {
    async fn list_records(&self, root: &str) -> Result<Vec<DnsRecord>> {
        let mut records = Vec::new();

        for page in 1..=MAX_PAGES {
            let body = self.fetch_page(root, page).await?;
            let fetched = body.domain_records.len();
            records.extend(body.domain_records.into_iter().map(DnsRecord::from));

            let has_next = body
                .links
                .pages
                .and_then(|pages| pages.next)
                .is_some();
            if !has_next || fetched == 0 {
                tracing::debug!("Listed {} record(s) of {} in {} page(s)", records.len(), root, page);
                return Ok(records);
            }
        }

        tracing::warn!(
            "Stopped listing {} after {} pages ({} records)",
            root,
            MAX_PAGES,
            records.len()
        );
        Ok(records)
    }

    /// Point an existing record at a new address
    ///
    /// # API Call
    ///
    /// ```http
    /// PUT /v2/domains/example.com/records/3352896
    /// Authorization: Bearer <token>
    ///
    /// { "type": "A", "data": "203.0.113.7" }
    /// ```
    async fn edit_record(&self, root: &str, record: &DnsRecord, new_ip: IpAddr) -> Result<DnsRecord> {
        let url = format!("{}/{}", self.records_url(root), record.id);
        let payload = EditRequest {
            record_type: &record.record_type,
            data: new_ip.to_string(),
        };

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                url,
                serde_json::to_string(&payload)?
            );
            return Ok(DnsRecord {
                data: payload.data,
                ..record.clone()
            });
        }

        tracing::info!(
            "Updating DigitalOcean record {} ({}) in {}: {} -> {}",
            record.name,
            record.id,
            root,
            record.data,
            new_ip
        );

        let response = self
            .client
            .put(&url)
            .bearer_auth(&self.api_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("HTTP request failed: {}", e)))?;

        let response = check_status(response, &format!("Updating record {}", record.id)).await?;

        let envelope: RecordEnvelope = response
            .json()
            .await
            .map_err(|e| Error::provider(PROVIDER, format!("Failed to parse response: {}", e)))?;

        Ok(envelope.domain_record.into())
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
