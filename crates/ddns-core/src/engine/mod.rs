//! Core DDNS engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving the current public address via IpSource
//! - Locating the managed A record via DnsProvider
//! - Editing the record when the two disagree
//! - Repeating this on a fixed interval until shutdown
//!
//! ## Architecture
//!
//! ```text
//!                  ┌──────────────┐
//!   timer tick ───▶│  DdnsEngine  │◀─── shutdown signal
//!                  └──────────────┘
//!                          │
//!         ┌────────────────┼────────────────┐
//!         │                │                │
//!         ▼                ▼                ▼
//! ┌─────────────┐  ┌──────────────┐  ┌─────────────┐
//! │  IpSource   │  │ DnsProvider  │  │   Events    │
//! │ (resolve)   │  │ (list, edit) │  │  (notify)   │
//! └─────────────┘  └──────────────┘  └─────────────┘
//! ```
//!
//! ## Cycle
//!
//! 1. Resolve the public address
//! 2. List the root domain's records and find the A record
//! 3. If the addresses differ, edit the record
//!
//! Each stage short-circuits the cycle on error. Errors are logged and the
//! next tick starts again from scratch.

use crate::config::DdnsConfig;
use crate::domain::SplitDomain;
use crate::error::{Error, Result};
use crate::traits::dns_provider::find_a_record;
use crate::traits::{DnsProvider, DnsRecord, IpSource};
use std::fmt;
use std::future::Future;
use std::net::IpAddr;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started its loop
    Started {
        domain: String,
        interval: Duration,
    },

    /// Public address resolved at the start of a cycle
    AddressResolved {
        address: IpAddr,
    },

    /// Record already points at the current address
    UpdateSkipped {
        record_name: String,
        current_ip: IpAddr,
    },

    /// Record edited to the new address
    UpdateSucceeded {
        record_name: String,
        record_id: String,
        previous_ip: IpAddr,
        new_ip: IpAddr,
    },

    /// A cycle ended in error
    CycleFailed {
        stage: CycleStage,
        error: String,
    },

    /// Engine stopped
    Stopped {
        reason: String,
    },
}

/// Stage of an update cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleStage {
    /// Asking the IP source for the public address
    Resolve,
    /// Listing records and comparing against the matching A record
    Lookup,
    /// Writing the new address to the record
    Edit,
}

impl fmt::Display for CycleStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CycleStage::Resolve => "resolve",
            CycleStage::Lookup => "lookup",
            CycleStage::Edit => "edit",
        })
    }
}

/// Successful end of a cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Record already matched; nothing was written
    UpToDate {
        record: DnsRecord,
        address: IpAddr,
    },
    /// Record was edited
    Updated {
        record: DnsRecord,
        previous_ip: IpAddr,
        new_ip: IpAddr,
    },
}

/// Failed cycle, tagged with the stage that failed
#[derive(Debug, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct CycleError {
    /// Where the cycle stopped
    pub stage: CycleStage,
    /// What went wrong
    #[source]
    pub source: Error,
}

/// Core DDNS engine
///
/// The engine owns the split domain and both collaborators for the life of
/// the process. Cycles run strictly one after another on a single task.
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`] (fails on bad configuration)
/// 2. Start with [`DdnsEngine::run()`] or [`DdnsEngine::run_with_shutdown()`]
/// 3. First cycle runs immediately, then one cycle per interval
/// 4. Returns once the shutdown signal fires
pub struct DdnsEngine {
    /// IP source for the public address
    ip_source: Box<dyn IpSource>,

    /// DNS provider holding the record
    provider: Box<dyn DnsProvider>,

    /// Managed domain, split once at construction
    domain: SplitDomain,

    /// Delay between cycles
    interval: Duration,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `ip_source`: IP source implementation
    /// - `provider`: DNS provider implementation
    /// - `config`: DDNS configuration
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver) where event_receiver yields engine events
    ///
    /// # Errors
    ///
    /// Invalid configuration or a domain that cannot be split. Both are
    /// startup errors; no cycle runs.
    pub fn new(
        ip_source: Box<dyn IpSource>,
        provider: Box<dyn DnsProvider>,
        config: DdnsConfig,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        config.validate()?;
        let domain = SplitDomain::parse(&config.domain)?;

        let (tx, rx) = mpsc::channel(config.engine.event_channel_capacity);

        debug!(
            "Managing {} record {:?} in zone {} via {} / {}",
            crate::traits::dns_provider::A_RECORD,
            domain.record_name(),
            domain.root(),
            ip_source.source_name(),
            provider.provider_name()
        );

        let engine = Self {
            ip_source,
            provider,
            domain,
            interval: config.engine.interval,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// The managed domain
    pub fn domain(&self) -> &SplitDomain {
        &self.domain
    }

    /// Delay between cycles
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run the engine until Ctrl-C
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    pub async fn run(&self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Run the engine until the given oneshot fires (or its sender is dropped)
    ///
    /// `None` falls back to [`DdnsEngine::run()`].
    pub async fn run_with_shutdown(&self, shutdown_rx: Option<oneshot::Receiver<()>>) -> Result<()> {
        match shutdown_rx {
            Some(rx) => {
                self.run_until(async {
                    let _ = rx.await;
                })
                .await
            }
            None => self.run().await,
        }
    }

    /// Main loop: cycle now, then once per interval, until `shutdown` completes
    async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        info!(
            "Starting update loop for {} (interval {:?})",
            self.domain, self.interval
        );
        self.emit_event(EngineEvent::Started {
            domain: self.domain.to_string(),
            interval: self.interval,
        });

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                result = self.run_cycle() => self.report(result),
            }

            tokio::select! {
                biased;
                _ = &mut shutdown => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("Shutdown signal received, engine stopped");
        self.emit_event(EngineEvent::Stopped {
            reason: "Shutdown signal".to_string(),
        });

        Ok(())
    }

    /// Run one resolve, compare, update cycle
    ///
    /// The cycle ends at the first failing stage; nothing is retried.
    pub async fn run_cycle(&self) -> std::result::Result<CycleOutcome, CycleError> {
        let new_ip = self
            .resolve_address()
            .await
            .map_err(|e| self.fail(CycleStage::Resolve, e))?;

        let (record, current_ip) = self
            .lookup_record(new_ip)
            .await
            .map_err(|e| self.fail(CycleStage::Lookup, e))?;

        if current_ip == new_ip {
            info!(
                "Record is okay, domain: {}, record: {}",
                self.domain, record
            );
            self.emit_event(EngineEvent::UpdateSkipped {
                record_name: record.name.clone(),
                current_ip,
            });
            return Ok(CycleOutcome::UpToDate {
                record,
                address: current_ip,
            });
        }

        info!(
            "Record is out of date, domain: {}, record: {}, new address: {}",
            self.domain, record, new_ip
        );

        let updated = self
            .provider
            .edit_record(self.domain.root(), &record, new_ip)
            .await
            .map_err(|e| self.fail(CycleStage::Edit, e))?;

        info!("Record updated: {} ({} -> {})", updated, current_ip, new_ip);
        self.emit_event(EngineEvent::UpdateSucceeded {
            record_name: updated.name.clone(),
            record_id: updated.id.clone(),
            previous_ip: current_ip,
            new_ip,
        });

        Ok(CycleOutcome::Updated {
            record: updated,
            previous_ip: current_ip,
            new_ip,
        })
    }

    /// Ask the IP source for the public address
    async fn resolve_address(&self) -> Result<IpAddr> {
        // ::ffff:a.b.c.d compares equal to a.b.c.d
        let address = self.ip_source.current().await?.to_canonical();
        debug!("Resolved public address: {}", address);
        self.emit_event(EngineEvent::AddressResolved { address });
        Ok(address)
    }

    /// Find the managed A record and parse its current value
    async fn lookup_record(&self, new_ip: IpAddr) -> Result<(DnsRecord, IpAddr)> {
        if !new_ip.is_ipv4() {
            return Err(Error::UnsupportedAddress(new_ip));
        }

        let records = self.provider.list_records(self.domain.root()).await?;
        debug!(
            "Listed {} record(s) for {}",
            records.len(),
            self.domain.root()
        );

        let record = find_a_record(&records, self.domain.record_name())?.clone();
        let current_ip = record.address()?.to_canonical();

        Ok((record, current_ip))
    }

    /// Tag an error with its stage and publish it
    fn fail(&self, stage: CycleStage, source: Error) -> CycleError {
        self.emit_event(EngineEvent::CycleFailed {
            stage,
            error: source.to_string(),
        });
        CycleError { stage, source }
    }

    /// Log the end of a cycle run from the loop
    fn report(&self, result: std::result::Result<CycleOutcome, CycleError>) {
        match result {
            Ok(CycleOutcome::UpToDate { address, .. }) => {
                debug!("Cycle complete for {}: up to date at {}", self.domain, address);
            }
            Ok(CycleOutcome::Updated { new_ip, .. }) => {
                debug!("Cycle complete for {}: now {}", self.domain, new_ip);
            }
            Err(e) => {
                error!(
                    "Update cycle failed, domain: {}, stage: {}, error: {}",
                    self.domain, e.stage, e.source
                );
            }
        }
    }

    /// Emit an engine event
    ///
    /// # Parameters
    ///
    /// - `event`: The event to emit
    fn emit_event(&self, event: EngineEvent) {
        match self.event_tx.try_send(event) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(_)) => {
                warn!("Event channel full, dropping event. Consider increasing event_channel_capacity.");
            }
            // Nobody is listening; that's allowed
            Err(mpsc::error::TrySendError::Closed(_)) => {}
        }
    }
}
