// # Router DNS Store Trait
//
// Defines the interface for reading and extending a router's static DNS table.
//
// ## Implementations
//
// - RouterOS API: `fwdsync-routeros` crate
// - In-memory: `fwdsync_core::store::MemoryDnsStore`
//
// ## Usage
//
// ```rust,ignore
// use fwdsync_core::traits::{ForwardEntry, RouterDnsStore};
//
// let store = /* RouterDnsStore implementation */;
//
// let mut session = store.open().await?;
// let existing = session.list_names().await?;
// if !existing.contains("example.com") {
//     session.add_forward_entry(&entry).await?;
// }
// session.close().await?;
// ```

use async_trait::async_trait;
use std::collections::HashSet;
use std::net::IpAddr;

/// A static forward DNS entry as created on the router
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardEntry {
    /// Entry name (a canonical key)
    pub name: String,
    /// Resolver that queries for `name` are forwarded to
    pub forward_to: IpAddr,
    /// Whether subdomains of `name` match the entry as well
    pub match_subdomain: bool,
    /// Address list that resolved addresses are added to
    pub address_list: String,
}

/// Trait for router DNS store implementations
///
/// A store only knows how to open sessions. All reads and writes go
/// through a [`DnsSession`], which lives for exactly one sync batch.
///
/// # Trust Level: Untrusted
///
/// Stores are external integrations:
///
/// ## Allowed Capabilities
/// - ✅ Open a network connection to the configured router
/// - ✅ Translate entries to and from the router's wire format
/// - ✅ Return success or failure for each call
///
/// ## Forbidden Capabilities
/// - ❌ Retry failed calls (single-attempt semantics)
/// - ❌ Decide which entries should be added (owned by `Synchronizer`)
/// - ❌ Delete or modify entries
/// - ❌ Keep a connection open after the session is closed
#[async_trait]
pub trait RouterDnsStore: Send + Sync {
    /// Open and authenticate a session
    ///
    /// # Returns
    ///
    /// - `Ok(session)`: A session ready for reads and writes
    /// - `Err(Error::StoreConnection)`: Connect or login failed
    async fn open(&self) -> Result<Box<dyn DnsSession>, crate::Error>;

    /// Get the store name (for logging/debugging)
    fn store_name(&self) -> &'static str;
}

/// An open session against a router DNS store
///
/// # Lifecycle
///
/// The caller must call [`DnsSession::close`] when done, on success and
/// on failure. Implementations should also release the connection on drop.
#[async_trait]
pub trait DnsSession: Send {
    /// List the names of all static forward entries
    ///
    /// Must return a complete snapshot: no entry double-counted, no entry
    /// dropped because of paging.
    async fn list_names(&mut self) -> Result<HashSet<String>, crate::Error>;

    /// Create exactly one static forward entry
    ///
    /// # Returns
    ///
    /// - `Ok(())`: The entry was created
    /// - `Err(Error::StoreWrite)`: The router rejected the entry (including
    ///   when an entry with the same name already exists); the session is
    ///   still usable
    /// - `Err(Error::StoreConnection)` or `Err(Error::Protocol)`: The session
    ///   is lost
    async fn add_forward_entry(&mut self, entry: &ForwardEntry) -> Result<(), crate::Error>;

    /// Close the session and release the connection
    ///
    /// Calling `close` more than once is a no-op.
    async fn close(&mut self) -> Result<(), crate::Error>;
}
