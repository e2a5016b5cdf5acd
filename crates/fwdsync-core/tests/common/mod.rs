//! Test doubles and common utilities for sync contract tests
//!
//! The mocks count every call so tests can assert on what the
//! synchronizer did (and did not) ask the store to do.

#![allow(dead_code)]

use fwdsync_core::config::{EntryConfig, JobConfig, RouterConfig, SourceConfig, SyncConfig};
use fwdsync_core::error::{Error, Result};
use fwdsync_core::traits::{DnsSession, DomainSource, ForwardEntry, RouterDnsStore};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// How a [`MockDnsStore`] should misbehave
#[derive(Debug, Clone, Default)]
pub enum FailureMode {
    /// Everything succeeds
    #[default]
    None,
    /// `open()` fails
    Open,
    /// `list_names()` fails
    List,
    /// `add_forward_entry()` fails with a write error for these names
    RejectNames(Vec<String>),
    /// `add_forward_entry()` loses the session on the nth add (0-based)
    LoseSessionOnAdd(usize),
}

#[derive(Default)]
struct Counters {
    open: AtomicUsize,
    list: AtomicUsize,
    add: AtomicUsize,
    close: AtomicUsize,
}

/// A mock RouterDnsStore that tracks calls
#[derive(Clone)]
pub struct MockDnsStore {
    table: Arc<Mutex<HashMap<String, ForwardEntry>>>,
    added: Arc<Mutex<Vec<String>>>,
    counters: Arc<Counters>,
    failure: FailureMode,
}

impl MockDnsStore {
    pub fn new() -> Self {
        Self::with_names(Vec::<String>::new())
    }

    /// Create a store whose table already holds `names`
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
                    forward_to: "9.9.9.9".parse().unwrap(),
                    match_subdomain: true,
                    address_list: "existing".to_string(),
                };
                (name, entry)
            })
            .collect();

        Self {
            table: Arc::new(Mutex::new(table)),
            added: Arc::new(Mutex::new(Vec::new())),
            counters: Arc::new(Counters::default()),
            failure: FailureMode::None,
        }
    }

    /// Make the store fail in the given way
    pub fn failing(mut self, failure: FailureMode) -> Self {
        self.failure = failure;
        self
    }

    pub fn open_call_count(&self) -> usize {
        self.counters.open.load(Ordering::SeqCst)
    }

    pub fn list_call_count(&self) -> usize {
        self.counters.list.load(Ordering::SeqCst)
    }

    pub fn add_call_count(&self) -> usize {
        self.counters.add.load(Ordering::SeqCst)
    }

    pub fn close_call_count(&self) -> usize {
        self.counters.close.load(Ordering::SeqCst)
    }

    /// Names successfully added, in call order
    pub fn added_names(&self) -> Vec<String> {
        self.added.lock().unwrap().clone()
    }

    /// Entry currently stored under `name`
    pub fn entry(&self, name: &str) -> Option<ForwardEntry> {
        self.table.lock().unwrap().get(name).cloned()
    }
}

#[async_trait::async_trait]
impl RouterDnsStore for MockDnsStore {
    async fn open(&self) -> Result<Box<dyn DnsSession>> {
        self.counters.open.fetch_add(1, Ordering::SeqCst);
        if matches!(self.failure, FailureMode::Open) {
            return Err(Error::store_connection("connection refused"));
        }
        Ok(Box::new(MockSession {
            store: self.clone(),
            adds_in_session: 0,
            lost: false,
        }))
    }

    fn store_name(&self) -> &'static str {
        "mock"
    }
}

struct MockSession {
    store: MockDnsStore,
    adds_in_session: usize,
    lost: bool,
}

#[async_trait::async_trait]
impl DnsSession for MockSession {
    async fn list_names(&mut self) -> Result<HashSet<String>> {
        self.store.counters.list.fetch_add(1, Ordering::SeqCst);
        if matches!(self.store.failure, FailureMode::List) {
            return Err(Error::protocol("unexpected reply to print"));
        }
        Ok(self.store.table.lock().unwrap().keys().cloned().collect())
    }

    async fn add_forward_entry(&mut self, entry: &ForwardEntry) -> Result<()> {
        self.store.counters.add.fetch_add(1, Ordering::SeqCst);
        let nth = self.adds_in_session;
        self.adds_in_session += 1;

        if self.lost {
            return Err(Error::store_connection("session already lost"));
        }

        match &self.store.failure {
            FailureMode::RejectNames(names) if names.contains(&entry.name) => {
                return Err(Error::store_write(format!(
                    "failure: cannot add {}",
                    entry.name
                )));
            }
            FailureMode::LoseSessionOnAdd(at) if *at == nth => {
                self.lost = true;
                return Err(Error::store_connection("connection reset by peer"));
            }
            _ => {}
        }

        let mut table = self.store.table.lock().unwrap();
        if table.contains_key(&entry.name) {
            return Err(Error::store_write("failure: entry already exists"));
        }
        table.insert(entry.name.clone(), entry.clone());
        self.store.added.lock().unwrap().push(entry.name.clone());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.store.counters.close.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// A domain source that always fails
pub struct FailingDomainSource {
    fetch_call_count: Arc<AtomicUsize>,
}

impl FailingDomainSource {
    pub fn new() -> Self {
        Self {
            fetch_call_count: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn fetch_call_count(&self) -> usize {
        self.fetch_call_count.load(Ordering::SeqCst)
    }

    /// Create a new FailingDomainSource that shares counters with an existing one
    pub fn sharing_counters_with(other: &Self) -> Self {
        Self {
            fetch_call_count: Arc::clone(&other.fetch_call_count),
        }
    }
}

#[async_trait::async_trait]
impl DomainSource for FailingDomainSource {
    async fn fetch(&self) -> Result<Vec<String>> {
        self.fetch_call_count.fetch_add(1, Ordering::SeqCst);
        Err(Error::source_fetch("HTTP error: 503 Service Unavailable"))
    }

    fn source_name(&self) -> &'static str {
        "failing"
    }
}

/// Entry settings used by all contract tests
pub fn entry_config() -> EntryConfig {
    EntryConfig::new("1.1.1.1".parse().unwrap(), "to_vpn")
}

/// Helper to create a minimal SyncConfig for testing
pub fn minimal_config() -> SyncConfig {
    SyncConfig {
        router: RouterConfig::new("192.168.88.1", "api", "test-password"),
        source: SourceConfig::new("https://lists.example.net/domains.txt"),
        entry: entry_config(),
        job: JobConfig::default(),
    }
}
