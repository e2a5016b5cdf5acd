// # Domain Source Trait
//
// Defines the interface for retrieving the published domain list.
//
// ## Implementations
//
// - HTTP: `fwdsync-source-http` crate
// - Static list: `fwdsync_core::traits::StaticDomainSource`

use async_trait::async_trait;

/// Trait for domain list sources
///
/// A source returns raw hostnames in the order they were published. It does
/// not normalize, deduplicate or validate them.
///
/// A failed fetch is reported as `Error::SourceFetch`; the job decides how
/// to degrade. Sources must not retry.
#[async_trait]
pub trait DomainSource: Send + Sync {
    /// Fetch the current domain list
    ///
    /// # Returns
    ///
    /// - `Ok(Vec<String>)`: Raw hostnames, one per published line
    /// - `Err(Error::SourceFetch)`: Network error, timeout or non-2xx status
    async fn fetch(&self) -> Result<Vec<String>, crate::Error>;

    /// Get the source name (for logging/debugging)
    fn source_name(&self) -> &'static str;
}

/// A source backed by a fixed list
///
/// Useful for embedding and for one-off runs from a list already in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticDomainSource {
    domains: Vec<String>,
}

impl StaticDomainSource {
    /// Create a source that always returns `domains`
    pub fn new<I, S>(domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            domains: domains.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl DomainSource for StaticDomainSource {
    async fn fetch(&self) -> Result<Vec<String>, crate::Error> {
        Ok(self.domains.clone())
    }

    fn source_name(&self) -> &'static str {
        "static"
    }
}
