//! Environment settings for fwdsyncd
//!
//! Every variable is read through a lookup function so the parser can be
//! tested without touching the process environment.

use anyhow::{Context, Result};
use fwdsync_core::config::{
    EntryConfig, JobConfig, RouterConfig, SourceConfig, SyncConfig, TransportSecurity,
};
use std::net::IpAddr;
use std::str::FromStr;
use tracing::Level;

const DEFAULT_ROUTER_HOST: &str = "192.168.88.1";
const DEFAULT_ADDRESS_LIST: &str = "to_vpn";
const DEFAULT_RESOLVER: &str = "1.1.1.1";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Daemon settings
#[derive(Debug, Clone)]
pub struct Settings {
    /// Library configuration handed to the job
    pub sync: SyncConfig,
    /// Print the run summary as JSON on stdout
    pub summary_json: bool,
    /// Maximum log level
    pub log_level: Level,
}

impl Settings {
    /// Load settings from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through `lookup`
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = get("FWDSYNC_ROUTER_USER").with_context(|| {
            "FWDSYNC_ROUTER_USER is required. Set it via: export FWDSYNC_ROUTER_USER=api"
        })?;
        let password = get("FWDSYNC_ROUTER_PASSWORD").with_context(|| {
            "FWDSYNC_ROUTER_PASSWORD is required. Set it via: export FWDSYNC_ROUTER_PASSWORD=..."
        })?;
        let url = get("FWDSYNC_SOURCE_URL").with_context(|| {
            "FWDSYNC_SOURCE_URL is required. \
            Set it via: export FWDSYNC_SOURCE_URL=https://example.net/domains.txt"
        })?;

        let host = get("FWDSYNC_ROUTER_HOST").unwrap_or_else(|| DEFAULT_ROUTER_HOST.to_string());
        let security = match get("FWDSYNC_ROUTER_SECURITY") {
            Some(value) => TransportSecurity::from_str(&value)
                .map_err(|e| anyhow::anyhow!("FWDSYNC_ROUTER_SECURITY: {}", e))?,
            None => TransportSecurity::default(),
        };

        let mut router = RouterConfig::new(host, username, password).with_security(security);
        router.port = parse_opt(&get, "FWDSYNC_ROUTER_PORT")?;
        router.connect_timeout_secs =
            parse_opt(&get, "FWDSYNC_CONNECT_TIMEOUT_SECS")?.unwrap_or(DEFAULT_TIMEOUT_SECS);

        let source = SourceConfig {
            url,
            timeout_secs: parse_opt(&get, "FWDSYNC_SOURCE_TIMEOUT_SECS")?
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        };

        let resolver: IpAddr = match get("FWDSYNC_RESOLVER_IP") {
            Some(value) => value.trim().parse().with_context(|| {
                format!("FWDSYNC_RESOLVER_IP must be an IP address. Got: {value}")
            })?,
            None => DEFAULT_RESOLVER.parse()?,
        };
        let address_list =
            get("FWDSYNC_ADDRESS_LIST").unwrap_or_else(|| DEFAULT_ADDRESS_LIST.to_string());

        let job = JobConfig {
            dry_run: parse_flag(&get, "FWDSYNC_DRY_RUN")?,
            interval_secs: parse_opt(&get, "FWDSYNC_INTERVAL_SECS")?,
        };

        let log_level = match get("FWDSYNC_LOG_LEVEL") {
            Some(value) => parse_level(&value)?,
            None => Level::INFO,
        };

        let settings = Self {
            sync: SyncConfig {
                router,
                source,
                entry: EntryConfig::new(resolver, address_list),
                job,
            },
            summary_json: parse_flag(&get, "FWDSYNC_SUMMARY_JSON")?,
            log_level,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Validate the settings
    pub fn validate(&self) -> Result<()> {
        self.sync.validate()?;

        if self.sync.source.url.starts_with("http://") {
            eprintln!(
                "WARNING: FWDSYNC_SOURCE_URL uses HTTP (not HTTPS). \
                The domain list can be altered in transit."
            );
        }

        Ok(())
    }
}

fn parse_opt<F, T>(get: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, value, e)),
        None => Ok(None),
    }
}

fn parse_flag<F>(get: &F, key: &str) -> Result<bool>
where
    F: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.trim().to_lowercase()) {
        None => Ok(false),
        Some(v) => match v.as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => anyhow::bail!(
                "{} '{}' is not a boolean. Valid: true, false, 1, 0, yes, no",
                key,
                v
            ),
        },
    }
}

fn parse_level(value: &str) -> Result<Level> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "FWDSYNC_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            value
        ),
    }
}
