//! Connection establishment
//!
//! Opens TCP to the router and, depending on [`TransportSecurity`], wraps it
//! in TLS. The whole sequence (TCP connect and TLS handshake) is bounded by
//! the configured connect timeout.

use fwdsync_core::config::{RouterConfig, TransportSecurity};
use fwdsync_core::{Error, Result};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;
use tracing::debug;

/// Byte stream carrying the API session
pub trait Transport: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> Transport for T {}

/// Boxed transport as returned by [`connect`]
pub type BoxedTransport = Box<dyn Transport>;

/// Connect to the router described by `config`
pub async fn connect(config: &RouterConfig) -> Result<BoxedTransport> {
    let timeout = Duration::from_secs(config.connect_timeout_secs);

    tokio::time::timeout(timeout, establish(config))
        .await
        .map_err(|_| {
            Error::store_connection(format!(
                "connecting to {}:{} timed out after {:?}",
                config.host,
                config.effective_port(),
                timeout
            ))
        })?
}

async fn establish(config: &RouterConfig) -> Result<BoxedTransport> {
    let port = config.effective_port();

    let tcp = TcpStream::connect((config.host.as_str(), port))
        .await
        .map_err(|e| {
            Error::store_connection(format!(
                "connecting to {}:{} failed: {}",
                config.host, port, e
            ))
        })?;
    if let Err(e) = tcp.set_nodelay(true) {
        debug!("Failed to set TCP_NODELAY: {}", e);
    }

    match config.security {
        TransportSecurity::Plain => Ok(Box::new(tcp)),
        TransportSecurity::Tls | TransportSecurity::WeakCompat => {
            tls::wrap(tcp, &config.host, config.security).await
        }
    }
}

#[cfg(feature = "tls")]
mod tls {
    use super::BoxedTransport;
    use fwdsync_core::config::TransportSecurity;
    use fwdsync_core::{Error, Result};
    use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode, SslVersion};
    use std::pin::Pin;
    use tokio::net::TcpStream;
    use tokio_openssl::SslStream;
    use tracing::warn;

    /// Anonymous DH at security level 0, as required by API-SSL without a certificate
    const WEAK_COMPAT_CIPHERS: &str = "ADH:@SECLEVEL=0";

    fn setup_error(e: openssl::error::ErrorStack) -> Error {
        Error::store_connection(format!("TLS setup failed: {e}"))
    }

    pub(super) async fn wrap(
        tcp: TcpStream,
        host: &str,
        security: TransportSecurity,
    ) -> Result<BoxedTransport> {
        let weak = security == TransportSecurity::WeakCompat;

        let mut builder = SslConnector::builder(SslMethod::tls_client()).map_err(setup_error)?;
        if weak {
            warn!(
                "Using weak-compat TLS to {}: anonymous DH, no certificate or hostname verification",
                host
            );
            // ADH suites do not exist in TLS 1.3
            builder
                .set_max_proto_version(Some(SslVersion::TLS1_2))
                .map_err(setup_error)?;
            builder
                .set_cipher_list(WEAK_COMPAT_CIPHERS)
                .map_err(setup_error)?;
            builder.set_verify(SslVerifyMode::NONE);
        }
        let connector = builder.build();

        let mut ssl_config = connector.configure().map_err(setup_error)?;
        if weak {
            ssl_config.set_verify_hostname(false);
        }
        let ssl = ssl_config.into_ssl(host).map_err(setup_error)?;

        let mut stream = SslStream::new(ssl, tcp).map_err(setup_error)?;
        Pin::new(&mut stream).connect().await.map_err(|e| {
            Error::store_connection(format!("TLS handshake with {} failed: {}", host, e))
        })?;

        Ok(Box::new(stream))
    }
}

#[cfg(not(feature = "tls"))]
mod tls {
    use super::BoxedTransport;
    use fwdsync_core::config::TransportSecurity;
    use fwdsync_core::{Error, Result};
    use tokio::net::TcpStream;

    pub(super) async fn wrap(
        _tcp: TcpStream,
        _host: &str,
        security: TransportSecurity,
    ) -> Result<BoxedTransport> {
        Err(Error::config(format!(
            "transport security '{security}' requires the `tls` feature"
        )))
    }
}
