//! One complete sync run
//!
//! fetch → normalize → sync → summary. A failed fetch degrades to an empty
//! list; a store connection failure aborts the run and is returned to the
//! caller, who may schedule another run later.

use crate::config::SyncConfig;
use crate::engine::synchronizer::{FailedEntry, Synchronizer};
use crate::error::Result;
use crate::normalize::{CanonicalKey, normalize};
use crate::traits::{DomainSource, RouterDnsStore};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

/// Counts reported at the end of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// When the run finished
    pub finished_at: DateTime<Utc>,
    /// Raw hostnames downloaded
    pub downloaded: usize,
    /// Unique keys after normalization
    pub unique: usize,
    /// Entries added (would-be additions in dry-run mode)
    pub added: usize,
    /// Keys already present on the router
    pub skipped: usize,
    /// Entries that could not be created
    pub failed: Vec<FailedEntry>,
    /// Whether writes were suppressed
    pub dry_run: bool,
    /// Why the domain list could not be fetched, if it could not
    pub source_error: Option<String>,
}

impl RunSummary {
    fn empty(started_at: DateTime<Utc>, dry_run: bool) -> Self {
        Self {
            started_at,
            finished_at: started_at,
            downloaded: 0,
            unique: 0,
            added: 0,
            skipped: 0,
            failed: Vec::new(),
            dry_run,
            source_error: None,
        }
    }

    /// Number of entries that could not be created
    pub fn failed_count(&self) -> usize {
        self.failed.len()
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "downloaded={} unique={} added={} skipped={} failed={}",
            self.downloaded,
            self.unique,
            self.added,
            self.skipped,
            self.failed.len()
        )?;
        if self.dry_run {
            f.write_str(" (dry run)")?;
        }
        Ok(())
    }
}

/// A configured sync job
///
/// ## Lifecycle
///
/// 1. Create with [`SyncJob::new()`]
/// 2. Call [`SyncJob::run_once()`] for every run; runs must not overlap
pub struct SyncJob {
    /// Source of the domain list
    source: Box<dyn DomainSource>,

    /// Applies normalized keys to the router
    synchronizer: Synchronizer,

    /// Compute the diff without writing
    dry_run: bool,
}

impl SyncJob {
    /// Create a new sync job
    ///
    /// # Parameters
    ///
    /// - `source`: Domain list source
    /// - `store`: Router DNS store
    /// - `config`: Validated before use
    pub fn new(
        source: Box<dyn DomainSource>,
        store: Box<dyn RouterDnsStore>,
        config: &SyncConfig,
    ) -> Result<Self> {
        config.validate()?;

        let synchronizer = Synchronizer::new(store, &config.entry).with_dry_run(config.job.dry_run);

        Ok(Self {
            source,
            synchronizer,
            dry_run: config.job.dry_run,
        })
    }

    /// Run the pipeline once
    ///
    /// # Returns
    ///
    /// - `Ok(RunSummary)`: The run completed, possibly with per-entry failures
    ///   or with an empty list after a failed fetch
    /// - `Err(Error)`: The store could not be used; nothing was written
    pub async fn run_once(&self) -> Result<RunSummary> {
        let mut summary = RunSummary::empty(Utc::now(), self.dry_run);

        let raw = match self.source.fetch().await {
            Ok(raw) => {
                info!(
                    "Downloaded {} domains from {} source",
                    raw.len(),
                    self.source.source_name()
                );
                raw
            }
            Err(e) => {
                warn!("Error downloading domain list: {}", e);
                summary.source_error = Some(e.to_string());
                Vec::new()
            }
        };
        summary.downloaded = raw.len();

        if raw.is_empty() {
            info!("No domains to add");
            summary.finished_at = Utc::now();
            return Ok(summary);
        }

        let candidates = normalize(&raw);
        summary.unique = candidates.len();
        info!(
            "Filtered to {} unique second-level domains",
            candidates.len()
        );

        if candidates.iter().any(CanonicalKey::is_empty) {
            warn!("Domain list contains blank entries; an empty key is kept in the candidate set");
        }

        let report = self.synchronizer.sync(&candidates).await?;
        summary.added = report.added_count();
        summary.skipped = report.skipped_count;
        summary.failed = report.failed;
        summary.finished_at = Utc::now();

        if summary.failed.is_empty() {
            info!("Sync finished: {}", summary);
        } else {
            warn!("Sync finished with failures: {}", summary);
        }

        Ok(summary)
    }
}
