// # ddns-core
//
// Core library for the polling DDNS updater.
//
// ## Architecture Overview
//
// This library provides the core functionality for keeping one A record
// pointed at the machine's public address:
// - **SplitDomain**: Splits the configured domain into root and subdomain
// - **IpSource**: Trait for discovering the current public address
// - **DnsProvider**: Trait for listing and editing records via provider APIs
// - **DdnsEngine**: Runs the resolve → compare → update cycle on a timer
//
// ## Design Principles
//
// 1. **Separation of Concerns**: Core logic is separate from HTTP implementations
// 2. **Manage, don't provision**: Existing records are edited, never created
// 3. **Library-First**: All core functionality can be used as a library
// 4. **The next tick is the retry**: Cycle errors are logged, never retried in place

pub mod traits;
pub mod engine;
pub mod config;
pub mod domain;
pub mod error;

// Re-export core types for convenience
pub use traits::{IpSource, DnsProvider, DnsRecord};
pub use engine::{CycleError, CycleOutcome, CycleStage, DdnsEngine, EngineEvent};
pub use config::{DdnsConfig, EngineConfig, IpSourceConfig, ProviderConfig};
pub use domain::SplitDomain;
pub use error::{Error, Result};
