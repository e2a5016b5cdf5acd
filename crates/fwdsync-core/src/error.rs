//! Error types for fwdsync
//!
//! The variants follow the failure classes of a sync run: fetching the
//! domain list, talking to the router, writing single entries, and
//! everything that indicates a bug or a misconfiguration.

use thiserror::Error;

/// Result type alias for fwdsync operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for fwdsync
#[derive(Error, Debug)]
pub enum Error {
    /// The domain list could not be retrieved (network, timeout, non-2xx)
    #[error("Source fetch error: {0}")]
    SourceFetch(String),

    /// The router session could not be opened, authenticated or used
    #[error("Store connection error: {0}")]
    StoreConnection(String),

    /// A single entry could not be written
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// The router sent something that does not follow the API framing
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(#[from] std::io::Error),
}

impl Error {
    /// Create a source fetch error
    pub fn source_fetch(msg: impl Into<String>) -> Self {
        Self::SourceFetch(msg.into())
    }

    /// Create a store connection error
    pub fn store_connection(msg: impl Into<String>) -> Self {
        Self::StoreConnection(msg.into())
    }

    /// Create a store write error
    pub fn store_write(msg: impl Into<String>) -> Self {
        Self::StoreWrite(msg.into())
    }

    /// Create a protocol error
    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Whether the error means the store session can no longer be used.
    ///
    /// A `StoreWrite` error leaves the session intact; a broken socket,
    /// a `!fatal` reply or garbage on the wire do not.
    pub fn is_session_lost(&self) -> bool {
        matches!(
            self,
            Self::StoreConnection(_) | Self::Protocol(_) | Self::Network(_)
        )
    }

    /// Reclassify as a connection error, keeping the message.
    ///
    /// Used where any failure must abort the run before writes start
    /// (opening the session, listing existing entries).
    pub fn into_connection(self, context: &str) -> Self {
        match self {
            Self::StoreConnection(msg) => Self::StoreConnection(format!("{context}: {msg}")),
            other => Self::StoreConnection(format!("{context}: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_errors_keep_the_session() {
        assert!(!Error::store_write("failure: entry already exists").is_session_lost());
        assert!(Error::store_connection("reset").is_session_lost());
        assert!(Error::protocol("bad length").is_session_lost());
    }

    #[test]
    fn io_errors_convert_to_network() {
        fn read() -> Result<()> {
            Err(std::io::Error::from(std::io::ErrorKind::UnexpectedEof))?
        }

        let err = read().unwrap_err();
        assert!(matches!(err, Error::Network(_)), "got {err:?}");
        assert!(err.is_session_lost());
    }

    #[test]
    fn into_connection_prefixes_context() {
        let err = Error::protocol("unexpected reply").into_connection("listing entries");
        match err {
            Error::StoreConnection(msg) => {
                assert_eq!(msg, "listing entries: Protocol error: unexpected reply")
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
