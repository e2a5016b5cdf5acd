//! Configuration types for fwdsync
//!
//! Built once at process start and passed by reference into the job, the
//! synchronizer and the store adapters. Nothing in the library reads the
//! process environment.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Main fwdsync configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Router connection settings
    pub router: RouterConfig,

    /// Domain list source settings
    pub source: SourceConfig,

    /// Settings applied to every entry created
    pub entry: EntryConfig,

    /// Optional job settings
    #[serde(default)]
    pub job: JobConfig,
}

impl SyncConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        self.router.validate()?;
        self.source.validate()?;
        self.entry.validate()?;
        self.job.validate()?;
        Ok(())
    }
}

/// Transport security policy for the router connection
///
/// `WeakCompat` exists only for firmware that refuses anything but
/// anonymous Diffie-Hellman on its API-SSL service. It disables
/// certificate and hostname verification and is never selected implicitly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TransportSecurity {
    /// Plain TCP (API service, port 8728)
    #[default]
    Plain,
    /// TLS with certificate and hostname verification (API-SSL, port 8729)
    Tls,
    /// TLS with anonymous DH ciphers and no verification (API-SSL, port 8729)
    WeakCompat,
}

impl TransportSecurity {
    /// Well-known API port for this mode
    pub fn default_port(self) -> u16 {
        match self {
            TransportSecurity::Plain => 8728,
            TransportSecurity::Tls | TransportSecurity::WeakCompat => 8729,
        }
    }
}

impl fmt::Display for TransportSecurity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            TransportSecurity::Plain => "plain",
            TransportSecurity::Tls => "tls",
            TransportSecurity::WeakCompat => "weak-compat",
        })
    }
}

impl std::str::FromStr for TransportSecurity {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "plain" | "none" | "off" => Ok(TransportSecurity::Plain),
            "tls" => Ok(TransportSecurity::Tls),
            "weak-compat" | "weak_compat" => Ok(TransportSecurity::WeakCompat),
            other => Err(crate::Error::config(format!(
                "unknown transport security mode '{other}' (expected plain, tls or weak-compat)"
            ))),
        }
    }
}

/// Router connection configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Router host name or address
    pub host: String,

    /// API port (defaults to the well-known port of the security mode)
    #[serde(default)]
    pub port: Option<u16>,

    /// API user name
    pub username: String,

    /// API password
    /// ⚠️ NEVER log this value
    pub password: String,

    /// Transport security policy
    #[serde(default)]
    pub security: TransportSecurity,

    /// Timeout for establishing the connection (in seconds)
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

// Custom Debug implementation that hides the password
impl fmt::Debug for RouterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouterConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"<REDACTED>")
            .field("security", &self.security)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

impl RouterConfig {
    /// Create a router configuration with the default security mode
    pub fn new(
        host: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port: None,
            username: username.into(),
            password: password.into(),
            security: TransportSecurity::default(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }

    /// Set the transport security policy
    pub fn with_security(mut self, security: TransportSecurity) -> Self {
        self.security = security;
        self
    }

    /// Override the API port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Port actually used for the connection
    pub fn effective_port(&self) -> u16 {
        self.port.unwrap_or_else(|| self.security.default_port())
    }

    /// Validate the router configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.host.trim().is_empty() {
            return Err(crate::Error::config("Router host cannot be empty"));
        }
        if self.username.is_empty() {
            return Err(crate::Error::config("Router user name cannot be empty"));
        }
        if self.port == Some(0) {
            return Err(crate::Error::config("Router port must be > 0"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(crate::Error::config("Router connect timeout must be > 0"));
        }
        Ok(())
    }
}

/// Domain list source configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    /// URL of the newline-separated domain list
    pub url: String,

    /// Request timeout (in seconds)
    #[serde(default = "default_source_timeout_secs")]
    pub timeout_secs: u64,
}

impl SourceConfig {
    /// Create a source configuration with the default timeout
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout_secs: default_source_timeout_secs(),
        }
    }

    /// Validate the source configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.url.is_empty() {
            return Err(crate::Error::config("Source URL cannot be empty"));
        }
        if !self.url.starts_with("https://") && !self.url.starts_with("http://") {
            return Err(crate::Error::config(format!(
                "Source URL must use HTTP or HTTPS scheme. Got: {}",
                self.url
            )));
        }
        if self.timeout_secs == 0 {
            return Err(crate::Error::config("Source timeout must be > 0"));
        }
        Ok(())
    }
}

/// Settings applied to every created entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConfig {
    /// Resolver that matched queries are forwarded to
    pub resolver: IpAddr,

    /// Address list that resolved addresses are tagged into
    pub address_list: String,
}

impl EntryConfig {
    /// Create an entry configuration
    pub fn new(resolver: IpAddr, address_list: impl Into<String>) -> Self {
        Self {
            resolver,
            address_list: address_list.into(),
        }
    }

    /// Validate the entry configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.address_list.trim().is_empty() {
            return Err(crate::Error::config("Address list name cannot be empty"));
        }
        Ok(())
    }
}

/// Job configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobConfig {
    /// Compute and report the diff without writing entries
    #[serde(default)]
    pub dry_run: bool,

    /// Run periodically with this interval (in seconds); `None` runs once
    #[serde(default)]
    pub interval_secs: Option<u64>,
}

impl JobConfig {
    /// Validate the job configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.interval_secs == Some(0) {
            return Err(crate::Error::config("Job interval must be > 0"));
        }
        Ok(())
    }
}

fn default_connect_timeout_secs() -> u64 {
    10
}

fn default_source_timeout_secs() -> u64 {
    10
}
