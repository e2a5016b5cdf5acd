// # fwdsync-core
//
// Core library for keeping a router's static DNS forward entries in sync
// with a published domain list.
//
// ## Architecture Overview
//
// - **DomainSource**: Trait for retrieving the raw domain list
// - **RouterDnsStore / DnsSession**: Traits for reading and extending the
//   router's static DNS table
// - **normalize**: Reduces hostnames to canonical second-level keys
// - **Synchronizer**: Adds the keys the router does not have yet
// - **SyncJob**: One fetch → normalize → sync run
//
// ## Design Principles
//
// 1. **Additive only**: Entries are created, never modified or deleted
// 2. **Idempotent**: A repeated run with unchanged input adds nothing
// 3. **Single attempt**: No retries; failures are reported, the next run
//    picks up whatever is still missing
// 4. **Library-First**: Transports live in separate crates behind traits

pub mod traits;
pub mod normalize;
pub mod engine;
pub mod config;
pub mod error;
pub mod store;

// Re-export core types for convenience
pub use traits::{DnsSession, DomainSource, ForwardEntry, RouterDnsStore, StaticDomainSource};
pub use normalize::{CanonicalKey, canonicalize, normalize};
pub use engine::{FailedEntry, RunSummary, SyncJob, SyncReport, Synchronizer};
pub use config::{EntryConfig, JobConfig, RouterConfig, SourceConfig, SyncConfig, TransportSecurity};
pub use error::{Error, Result};
pub use store::MemoryDnsStore;
