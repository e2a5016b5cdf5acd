//! Domain normalization
//!
//! Reduces raw hostnames from the domain list to the second-level keys that
//! are stored on the router. One key covers every subdomain because entries
//! are created with `match-subdomain=yes`.
//!
//! ```rust
//! use fwdsync_core::normalize::{canonicalize, normalize};
//!
//! assert_eq!(canonicalize("www.cdn.example.com").as_str(), "example.com");
//!
//! let keys = normalize(["example.com", "www.example.com", "a.b.example.com"]);
//! assert_eq!(keys.len(), 1);
//! ```

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

const WWW_PREFIX: &str = "www.";

/// Normalized domain used as the identity of a router entry
///
/// Either `label.tld` or a single label. Keys are only produced by
/// [`canonicalize`], so every key is a fixed point of it.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalKey(String);

impl CanonicalKey {
    /// The key as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the key, returning the inner string
    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether the key is the empty string (blank line in the source)
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for CanonicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Canonicalize a single raw hostname.
///
/// Never fails: malformed input still yields a (possibly degenerate) key.
pub fn canonicalize(raw: &str) -> CanonicalKey {
    let host = raw.strip_prefix(WWW_PREFIX).unwrap_or(raw);

    let mut reduced = last_two_components(host);

    if let Some(rest) = reduced.strip_prefix('.') {
        reduced = rest;
    }

    // "a.www.com" reduces to "www.com"; strip again so the result is a fixed point.
    if let Some(rest) = reduced.strip_prefix(WWW_PREFIX) {
        reduced = rest;
    }

    CanonicalKey(reduced.to_string())
}

/// Normalize a raw hostname list into a deduplicated key set.
///
/// Empty strings are kept as empty keys rather than filtered out.
pub fn normalize<I, S>(raw: I) -> BTreeSet<CanonicalKey>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|host| canonicalize(host.as_ref()))
        .collect()
}

/// Slice of `host` covering its last two dot-separated components.
fn last_two_components(host: &str) -> &str {
    match host.rmatch_indices('.').nth(1) {
        Some((idx, _)) => &host[idx + 1..],
        None => host,
    }
}
