// # autoduc - Dynamic DNS Update Client
//
// One-shot client: observe the public IP, point every managed A/AAAA record
// at it, report, exit. Scheduling is left to cron or a systemd timer.
//
// This binary is a THIN integration layer. All decision logic lives in
// duc-core; this file only:
// 1. Reads logging settings and configuration
// 2. Initializes tracing and the runtime
// 3. Wires the HTTP executor, IP source and Cloudflare client together
// 4. Runs one reconciliation (or a zone listing) and maps it to an exit code
//
// ## Configuration
//
// ### Config file
// - `AUTODUC_CONFIG`: Path to a JSON config (native or classic conf.json)
//
// ### Environment (used when AUTODUC_CONFIG is unset)
// - `AUTODUC_ZONE_ID`: Zone holding the records
// - `AUTODUC_API_TOKEN`: API token, or
// - `AUTODUC_API_EMAIL` + `AUTODUC_API_KEY`: legacy global key
// - `AUTODUC_PUBLIC_IP_URL`: IP echo service (default https://api.ipify.org)
// - `AUTODUC_RECORDS`: Comma-separated record ids, `name:<fqdn>` for names
// - `AUTODUC_UPDATE_METHOD`: patch (default) or put
// - `AUTODUC_PROXIED`, `AUTODUC_TTL`: Field overrides for updates
// - `AUTODUC_TIMEOUT_SECS`: Per-request timeout (default 15)
// - `AUTODUC_FAILURE_POLICY`: continue (default) or abort
//
// ### Always honored
// - `AUTODUC_MODE`: live (default) or dry-run
// - `AUTODUC_LIST_ONLY`: Print the zone's records as JSON and exit
// - `AUTODUC_LOG_LEVEL`: trace, debug, info (default), warn, error
// - `AUTODUC_LOG_FILE`: Append logs to this file instead of stderr
//
// ## Example
//
// ```bash
// export AUTODUC_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
// export AUTODUC_API_TOKEN=your_token
// export AUTODUC_RECORDS=name:home.example.com
//
// autoduc
// ```

mod settings;

use anyhow::{Context, Result};
use duc_core::traits::HttpExecutor;
use duc_core::{DucConfig, Error, Reconciler, RunStatus, RunSummary};
use duc_http::ReqwestExecutor;
use duc_ip_http::HttpIpSource;
use duc_provider_cloudflare::CloudflareClient;
use settings::{LogSettings, load_config};
use std::fs::OpenOptions;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use tracing::{error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for the possible outcomes of a run
///
/// - 0: Every record updated or already current
/// - 1: Configuration or startup error
/// - 2: Fatal runtime error (IP or provider unreachable, listing failed)
/// - 3: Run completed, but some records failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DucExitCode {
    Success = 0,
    ConfigError = 1,
    RuntimeError = 2,
    PartialFailure = 3,
}

impl From<DucExitCode> for ExitCode {
    fn from(code: DucExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

impl DucExitCode {
    fn for_summary(summary: &RunSummary) -> Self {
        match summary.status() {
            RunStatus::Clean => Self::Success,
            RunStatus::CompletedWithFailures => Self::PartialFailure,
        }
    }

    fn for_error(error: &Error) -> Self {
        match error {
            Error::Config(_) => Self::ConfigError,
            _ => Self::RuntimeError,
        }
    }
}

fn main() -> ExitCode {
    let log_settings = match LogSettings::from_lookup(|key| std::env::var(key).ok()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DucExitCode::ConfigError.into();
        }
    };

    if let Err(e) = init_tracing(&log_settings) {
        eprintln!("Failed to initialize logging: {:#}", e);
        return DucExitCode::ConfigError.into();
    }

    let config = match load_config(|key| std::env::var(key).ok()) {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {:#}", e);
            return DucExitCode::ConfigError.into();
        }
    };

    info!(
        zone_id = %config.zone_id,
        dry_run = config.dry_run,
        list_only = config.list_only,
        "Starting autoduc"
    );

    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DucExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run(config)).into()
}

/// Install the global subscriber, writing to stderr or appending to a file
fn init_tracing(settings: &LogSettings) -> Result<()> {
    let builder = FmtSubscriber::builder().with_max_level(settings.level);

    match &settings.file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path))?;
            let subscriber = builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => {
            let subscriber = builder.with_writer(std::io::stderr).finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }

    Ok(())
}

/// Run one reconciliation, or list the zone
async fn run(config: DucConfig) -> DucExitCode {
    let list_only = config.list_only;

    let reconciler = match build_reconciler(config) {
        Ok(reconciler) => reconciler,
        Err(e) => {
            error!("Startup error: {}", e);
            return DucExitCode::for_error(&e);
        }
    };

    if list_only {
        return list_zone(&reconciler).await;
    }

    match reconciler.reconcile().await {
        Ok(summary) => {
            for report in summary.failures() {
                warn!(
                    record_id = %report.record_id,
                    record_name = %report.record_name,
                    "Record not reconciled"
                );
            }
            info!("Run finished: {}", summary);
            DucExitCode::for_summary(&summary)
        }
        Err(e) => {
            error!(error = %e, kind = e.kind(), "Run aborted");
            DucExitCode::for_error(&e)
        }
    }
}

fn build_reconciler(config: DucConfig) -> duc_core::Result<Reconciler> {
    let executor: Arc<dyn HttpExecutor> = Arc::new(ReqwestExecutor::new(config.http.timeout())?);
    let ip_source = HttpIpSource::from_config(&config.public_ip, executor.clone());
    let accessor = CloudflareClient::from_config(&config, executor);

    Reconciler::new(Box::new(ip_source), Box::new(accessor), config)
}

/// Print every record in the zone as JSON on stdout
async fn list_zone(reconciler: &Reconciler) -> DucExitCode {
    let records = match reconciler.list_zone().await {
        Ok(records) => records,
        Err(e) => {
            error!(error = %e, "Failed to list zone");
            return DucExitCode::for_error(&e);
        }
    };

    match serde_json::to_string_pretty(&records) {
        Ok(json) => {
            println!("{}", json);
            info!("Listed {} record(s)", records.len());
            DucExitCode::Success
        }
        Err(e) => {
            error!("Failed to render records: {}", e);
            DucExitCode::RuntimeError
        }
    }
}
