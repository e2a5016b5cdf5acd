//! Diff-and-apply against the router's static DNS table
//!
//! ## Flow
//!
//! 1. Open a store session
//! 2. Snapshot existing entry names (once)
//! 3. Add every candidate key missing from the snapshot
//! 4. Close the session, on every exit path
//!
//! Entries are only ever added. A failed add is recorded and the batch
//! continues; if the session itself is lost, the remaining keys are
//! reported failed without further calls.

use crate::config::EntryConfig;
use crate::error::Result;
use crate::normalize::CanonicalKey;
use crate::traits::{DnsSession, ForwardEntry, RouterDnsStore};
use serde::Serialize;
use std::collections::BTreeSet;
use std::net::IpAddr;
use tracing::{debug, info, warn};

/// An entry that could not be created
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedEntry {
    /// Key of the entry
    pub name: CanonicalKey,
    /// Error reported by the store
    pub error: String,
}

/// Outcome of one sync batch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Keys added (or, in dry-run mode, keys that would have been added)
    pub added: Vec<CanonicalKey>,
    /// Number of candidates already present on the router
    pub skipped_count: usize,
    /// Entries the store refused or could not create
    pub failed: Vec<FailedEntry>,
    /// Whether writes were suppressed
    pub dry_run: bool,
}

impl SyncReport {
    fn new(dry_run: bool) -> Self {
        Self {
            dry_run,
            ..Self::default()
        }
    }

    /// Number of entries added
    pub fn added_count(&self) -> usize {
        self.added.len()
    }

    /// Number of entries that failed
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }

    /// Keys of the failed entries
    pub fn failed_keys(&self) -> impl Iterator<Item = &CanonicalKey> {
        self.failed.iter().map(|f| &f.name)
    }
}

/// Applies a candidate key set to a router DNS store
///
/// ## Idempotency
///
/// Keys already present on the router are skipped, so a second run with the
/// same candidates and no external changes adds nothing.
///
/// ## Concurrency
///
/// One `sync` call runs one sequential batch. Two concurrent calls against
/// the same router may both add a key missing from both snapshots; callers
/// must serialize runs.
pub struct Synchronizer {
    /// Store holding the router's static DNS table
    store: Box<dyn RouterDnsStore>,

    /// Resolver set as `forward-to` on new entries
    resolver: IpAddr,

    /// Address list set on new entries
    address_list: String,

    /// Compute the diff without writing
    dry_run: bool,
}

impl Synchronizer {
    /// Create a synchronizer that writes entries configured by `entry`
    pub fn new(store: Box<dyn RouterDnsStore>, entry: &EntryConfig) -> Self {
        Self {
            store,
            resolver: entry.resolver,
            address_list: entry.address_list.clone(),
            dry_run: false,
        }
    }

    /// Enable or disable dry-run mode
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Name of the underlying store
    pub fn store_name(&self) -> &'static str {
        self.store.store_name()
    }

    /// Add every candidate key that the router does not have yet
    ///
    /// # Returns
    ///
    /// - `Ok(SyncReport)`: The batch ran; per-entry failures are in the report
    /// - `Err(Error::StoreConnection)`: The session could not be opened or the
    ///   existing entries could not be listed; nothing was written
    pub async fn sync(&self, candidates: &BTreeSet<CanonicalKey>) -> Result<SyncReport> {
        debug!(
            "Opening {} session for {} candidate(s)",
            self.store_name(),
            candidates.len()
        );

        let mut session = self
            .store
            .open()
            .await
            .map_err(|e| e.into_connection("opening store session"))?;

        let outcome = self.apply(session.as_mut(), candidates).await;

        match session.close().await {
            Ok(()) => debug!("Store session closed"),
            Err(e) => warn!("Failed to close store session cleanly: {}", e),
        }

        outcome
    }

    async fn apply(
        &self,
        session: &mut dyn DnsSession,
        candidates: &BTreeSet<CanonicalKey>,
    ) -> Result<SyncReport> {
        let existing = session
            .list_names()
            .await
            .map_err(|e| e.into_connection("listing existing entries"))?;
        debug!("Router has {} static forward entries", existing.len());

        let mut report = SyncReport::new(self.dry_run);
        let mut session_lost: Option<String> = None;

        for key in candidates {
            if existing.contains(key.as_str()) {
                debug!("Entry {} already exists, skipping", key);
                report.skipped_count += 1;
                continue;
            }

            if let Some(cause) = &session_lost {
                report.failed.push(FailedEntry {
                    name: key.clone(),
                    error: cause.clone(),
                });
                continue;
            }

            if self.dry_run {
                info!(
                    "Would add DNS entry: {} resolver {} addr list {}",
                    key, self.resolver, self.address_list
                );
                report.added.push(key.clone());
                continue;
            }

            match session.add_forward_entry(&self.entry_for(key)).await {
                Ok(()) => {
                    info!(
                        "Added DNS entry: {} resolver {} addr list {}",
                        key, self.resolver, self.address_list
                    );
                    report.added.push(key.clone());
                }
                Err(e) => {
                    warn!("Failed to add DNS entry {}: {}", key, e);
                    if e.is_session_lost() {
                        session_lost = Some(format!("session lost: {e}"));
                    }
                    report.failed.push(FailedEntry {
                        name: key.clone(),
                        error: e.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }

    fn entry_for(&self, key: &CanonicalKey) -> ForwardEntry {
        ForwardEntry {
            name: key.as_str().to_string(),
            forward_to: self.resolver,
            match_subdomain: true,
            address_list: self.address_list.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::store::MemoryDnsStore;

    fn entry_config() -> EntryConfig {
        EntryConfig::new(IpAddr::from([1, 1, 1, 1]), "to_vpn")
    }

    #[tokio::test]
    async fn adds_only_missing_keys() {
        let store = MemoryDnsStore::with_names(["example.com"]);
        let sync = Synchronizer::new(Box::new(store.clone()), &entry_config());

        let report = sync
            .sync(&normalize(["example.com", "foo.com"]))
            .await
            .unwrap();

        assert_eq!(report.added_count(), 1);
        assert_eq!(report.skipped_count, 1);
        assert_eq!(report.added[0].as_str(), "foo.com");

        let created = store.entry("foo.com").await.unwrap();
        assert_eq!(created.forward_to, IpAddr::from([1, 1, 1, 1]));
        assert!(created.match_subdomain);
        assert_eq!(created.address_list, "to_vpn");
    }

    #[tokio::test]
    async fn dry_run_does_not_write() {
        let store = MemoryDnsStore::new();
        let sync = Synchronizer::new(Box::new(store.clone()), &entry_config()).with_dry_run(true);

        let report = sync.sync(&normalize(["foo.com", "bar.com"])).await.unwrap();

        assert!(report.dry_run);
        assert_eq!(report.added_count(), 2);
        assert!(store.is_empty().await);
    }
}
