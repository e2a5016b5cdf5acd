// # Memory DNS Store
//
// In-memory implementation of RouterDnsStore.
//
// ## Purpose
//
// Holds a static DNS table in a HashMap shared by all sessions. Useful for
// tests, for embedding, and for rehearsing a run against a table seeded
// with a known set of names.
//
// Like a real router, it refuses to create a second entry with an existing
// name.

use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::traits::{DnsSession, ForwardEntry, RouterDnsStore};
use crate::Error;

/// In-memory router DNS store
///
/// Cloning the store shares the table, so a test can keep a handle and
/// inspect what a `Synchronizer` wrote.
///
/// # Example
///
/// ```rust
/// use fwdsync_core::store::MemoryDnsStore;
/// use fwdsync_core::traits::RouterDnsStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryDnsStore::with_names(["example.com"]);
///
///     let mut session = store.open().await?;
///     let names = session.list_names().await?;
///     assert!(names.contains("example.com"));
///     session.close().await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryDnsStore {
    inner: Arc<RwLock<HashMap<String, ForwardEntry>>>,
}

impl MemoryDnsStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with forward entries for `names`
    ///
    /// Seeded entries forward to `0.0.0.0` with no address list.
    pub fn with_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = names
            .into_iter()
            .map(Into::into)
            .map(|name: String| {
                let entry = ForwardEntry {
                    name: name.clone(),
                    forward_to: std::net::IpAddr::from([0, 0, 0, 0]),
                    match_subdomain: false,
                    address_list: String::new(),
                };
                (name, entry)
            })
            .collect();

        Self {
            inner: Arc::new(RwLock::new(table)),
        }
    }

    /// Get the number of entries in the store
    pub async fn len(&self) -> usize {
        self.inner.read().await.len()
    }

    /// Check if the store is empty
    pub async fn is_empty(&self) -> bool {
        self.inner.read().await.is_empty()
    }

    /// Get a copy of the entry named `name`
    pub async fn entry(&self, name: &str) -> Option<ForwardEntry> {
        self.inner.read().await.get(name).cloned()
    }
}

#[async_trait]
impl RouterDnsStore for MemoryDnsStore {
    async fn open(&self) -> Result<Box<dyn DnsSession>, Error> {
        Ok(Box::new(MemorySession {
            inner: Some(Arc::clone(&self.inner)),
        }))
    }

    fn store_name(&self) -> &'static str {
        "memory"
    }
}

/// Session over a [`MemoryDnsStore`]
struct MemorySession {
    inner: Option<Arc<RwLock<HashMap<String, ForwardEntry>>>>,
}

impl MemorySession {
    fn table(&self) -> Result<&Arc<RwLock<HashMap<String, ForwardEntry>>>, Error> {
        self.inner
            .as_ref()
            .ok_or_else(|| Error::store_connection("session is closed"))
    }
}

#[async_trait]
impl DnsSession for MemorySession {
    async fn list_names(&mut self) -> Result<HashSet<String>, Error> {
        let guard = self.table()?.read().await;
        Ok(guard.keys().cloned().collect())
    }

    async fn add_forward_entry(&mut self, entry: &ForwardEntry) -> Result<(), Error> {
        let mut guard = self.table()?.write().await;
        if guard.contains_key(&entry.name) {
            return Err(Error::store_write(format!(
                "entry already exists: {}",
                entry.name
            )));
        }
        guard.insert(entry.name.clone(), entry.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<(), Error> {
        self.inner = None;
        Ok(())
    }
}
