//! `RouterDnsStore` over the RouterOS API
//!
//! - List: `/ip/dns/static/print =.proplist=name ?type=FWD`
//! - Add:  `/ip/dns/static/add =name= =type=FWD =forward-to= =match-subdomain= =address-list=`
//! - Close: `/quit`

use crate::connection::ApiConnection;
use crate::transport::{self, BoxedTransport};
use async_trait::async_trait;
use fwdsync_core::config::{RouterConfig, TransportSecurity};
use fwdsync_core::traits::{DnsSession, ForwardEntry, RouterDnsStore};
use fwdsync_core::{Error, Result};
use std::collections::HashSet;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

const STATIC_DNS_PATH: &str = "/ip/dns/static";

/// RouterOS static DNS store
///
/// Every [`open`](RouterDnsStore::open) makes a fresh connection and logs
/// in; nothing is kept between sessions.
#[derive(Debug, Clone)]
pub struct RouterOsStore {
    config: RouterConfig,
}

impl RouterOsStore {
    /// Create a store for the router described by `config`
    pub fn new(config: RouterConfig) -> Result<Self> {
        config.validate()?;
        if config.security == TransportSecurity::WeakCompat {
            warn!(
                "Router {} is configured for weak-compat TLS; the API session is not authenticated against a certificate",
                config.host
            );
        }
        Ok(Self { config })
    }
}

#[async_trait]
impl RouterDnsStore for RouterOsStore {
    async fn open(&self) -> Result<Box<dyn DnsSession>> {
        let stream = transport::connect(&self.config).await?;

        let mut conn = ApiConnection::new(stream);
        conn.login(&self.config.username, &self.config.password)
            .await?;

        info!(
            "Connected to RouterOS API at {}:{} ({})",
            self.config.host,
            self.config.effective_port(),
            self.config.security
        );

        Ok(Box::new(RouterOsSession::<BoxedTransport>::new(conn)))
    }

    fn store_name(&self) -> &'static str {
        "routeros"
    }
}

/// An authenticated API session
///
/// Once the connection is lost or closed, every call fails with a
/// connection error.
pub struct RouterOsSession<S> {
    conn: Option<ApiConnection<S>>,
}

impl<S> RouterOsSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    /// Wrap a logged-in connection
    pub fn new(conn: ApiConnection<S>) -> Self {
        Self { conn: Some(conn) }
    }

    /// Whether the session can still issue commands
    pub fn is_open(&self) -> bool {
        self.conn.is_some()
    }

    async fn command(&mut self, words: &[String]) -> Result<crate::connection::CommandOutput> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| Error::store_connection("API session is closed"))?;

        let result = conn.command(words).await;
        if let Err(e) = &result
            && e.is_session_lost()
        {
            self.conn = None;
        }
        result
    }
}

#[async_trait]
impl<S> DnsSession for RouterOsSession<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn list_names(&mut self) -> Result<HashSet<String>> {
        let words = [
            format!("{STATIC_DNS_PATH}/print"),
            "=.proplist=name".to_string(),
            "?type=FWD".to_string(),
        ];
        let output = self.command(&words).await?;

        let names: HashSet<String> = output
            .rows
            .iter()
            .filter_map(|row| row.get("name"))
            .map(str::to_string)
            .collect();

        debug!(
            "Listed {} rows, {} distinct names",
            output.rows.len(),
            names.len()
        );
        Ok(names)
    }

    async fn add_forward_entry(&mut self, entry: &ForwardEntry) -> Result<()> {
        let words = [
            format!("{STATIC_DNS_PATH}/add"),
            format!("=name={}", entry.name),
            "=type=FWD".to_string(),
            format!("=forward-to={}", entry.forward_to),
            format!(
                "=match-subdomain={}",
                if entry.match_subdomain { "yes" } else { "no" }
            ),
            format!("=address-list={}", entry.address_list),
        ];

        let output = self.command(&words).await?;
        debug!(
            "Created {} as {}",
            entry.name,
            output.done.get("ret").unwrap_or("?")
        );
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        match self.conn.take() {
            Some(mut conn) => {
                conn.quit().await?;
                info!("API connection closed");
                Ok(())
            }
            None => Ok(()),
        }
    }
}
