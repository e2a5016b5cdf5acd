// # fwdsyncd - Forward Entry Sync Daemon
//
// Thin integration layer: reads the environment, sets up logging and the
// runtime, wires the HTTP domain source and the RouterOS store into a
// `SyncJob`, then runs it once or on a fixed interval.
//
// No sync logic lives here; all of it is in fwdsync-core.
//
// ## Configuration
//
// All configuration is done via environment variables:
//
// ### Router
// - `FWDSYNC_ROUTER_HOST`: Router address (default 192.168.88.1)
// - `FWDSYNC_ROUTER_PORT`: API port (default 8728, or 8729 with TLS)
// - `FWDSYNC_ROUTER_USER`: API user (required)
// - `FWDSYNC_ROUTER_PASSWORD`: API password (required)
// - `FWDSYNC_ROUTER_SECURITY`: plain, tls or weak-compat (default plain)
// - `FWDSYNC_CONNECT_TIMEOUT_SECS`: Connect timeout (default 10)
//
// ### Domain list
// - `FWDSYNC_SOURCE_URL`: URL of the newline-separated list (required)
// - `FWDSYNC_SOURCE_TIMEOUT_SECS`: Download timeout (default 10)
//
// ### Entries
// - `FWDSYNC_ADDRESS_LIST`: Address list tag (default to_vpn)
// - `FWDSYNC_RESOLVER_IP`: Resolver queries are forwarded to (default 1.1.1.1)
//
// ### Job
// - `FWDSYNC_DRY_RUN`: Report the diff without writing
// - `FWDSYNC_INTERVAL_SECS`: Run periodically; unset runs once and exits
// - `FWDSYNC_SUMMARY_JSON`: Print each run summary as JSON on stdout
// - `FWDSYNC_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Example
//
// ```bash
// export FWDSYNC_ROUTER_USER=api
// export FWDSYNC_ROUTER_PASSWORD=...
// export FWDSYNC_SOURCE_URL=https://lists.example.net/domains.txt
// export FWDSYNC_INTERVAL_SECS=3600
//
// fwdsyncd
// ```

mod settings;

use anyhow::Result;
use fwdsync_core::{RunSummary, SyncJob};
use fwdsync_routeros::RouterOsStore;
use fwdsync_source_http::HttpDomainSource;
use settings::Settings;
use std::process::ExitCode;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::IntervalStream;
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown, or a completed single run
/// - 1: Configuration or startup error
/// - 2: Runtime error (the single run was aborted)
#[derive(Debug, Clone, Copy)]
enum FwdsyncExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<FwdsyncExitCode> for ExitCode {
    fn from(code: FwdsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let settings = match Settings::from_env() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return FwdsyncExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(settings.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return FwdsyncExitCode::ConfigError.into();
    }

    info!("Starting fwdsyncd");
    info!(
        "Router {}:{} ({}), source {}",
        settings.sync.router.host,
        settings.sync.router.effective_port(),
        settings.sync.router.security,
        settings.sync.source.url
    );

    let job = match build_job(&settings) {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to set up sync job: {:#}", e);
            return FwdsyncExitCode::ConfigError.into();
        }
    };

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return FwdsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let outcome = match settings.sync.job.interval_secs {
            Some(secs) => run_periodic(&job, &settings, Duration::from_secs(secs)).await,
            None => run_single(&job, &settings).await,
        };
        match outcome {
            Ok(()) => FwdsyncExitCode::CleanShutdown,
            Err(e) => {
                error!("Daemon error: {:#}", e);
                FwdsyncExitCode::RuntimeError
            }
        }
    });

    result.into()
}

fn build_job(settings: &Settings) -> Result<SyncJob> {
    let source = HttpDomainSource::from_config(&settings.sync.source)?;
    let store = RouterOsStore::new(settings.sync.router.clone())?;
    let job = SyncJob::new(Box::new(source), Box::new(store), &settings.sync)?;
    Ok(job)
}

/// Run the job once; an aborted run is an error
async fn run_single(job: &SyncJob, settings: &Settings) -> Result<()> {
    let summary = job.run_once().await?;
    report(&summary, settings);
    Ok(())
}

/// Run the job on a fixed interval until a shutdown signal arrives
///
/// Runs never overlap: the next tick is only taken once the current run has
/// finished, and a signal received during a run is handled after it.
async fn run_periodic(job: &SyncJob, settings: &Settings, period: Duration) -> Result<()> {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut ticks = IntervalStream::new(interval);

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    info!("Running every {:?}", period);

    loop {
        tokio::select! {
            biased;

            signal = &mut shutdown => {
                let signal = signal?;
                info!("Received shutdown signal: {}", signal);
                break;
            }
            tick = ticks.next() => {
                if tick.is_none() {
                    break;
                }
                match job.run_once().await {
                    Ok(summary) => report(&summary, settings),
                    Err(e) => error!("Sync run aborted: {}", e),
                }
            }
        }
    }

    info!("Shutting down fwdsyncd");
    Ok(())
}

fn report(summary: &RunSummary, settings: &Settings) {
    if !settings.summary_json {
        return;
    }
    match serde_json::to_string(summary) {
        Ok(json) => println!("{}", json),
        Err(e) => warn!("Failed to serialize run summary: {}", e),
    }
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received.
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    let name = tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    };
    Ok(name)
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
