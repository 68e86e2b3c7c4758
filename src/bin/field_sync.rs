use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use field_sync::application::ports::MutationQueue;
use field_sync::domain::value_objects::RecordType;
use field_sync::infrastructure::http::HealthCheck;
use field_sync::{AppConfig, AppState, FieldRecord, ReconcileOutcome, SyncTrigger};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "field-sync")]
#[command(about = "Offline queue and sync engine for field maintenance records", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Records API base URL
    #[arg(long, env = "FIELD_SYNC_API_BASE_URL")]
    api_base_url: Option<String>,

    /// SQLite database URL for the offline queue
    #[arg(long, env = "FIELD_SYNC_DATABASE_URL")]
    database_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print queue and sync status as JSON
    Status,
    /// Run one reconciliation pass now
    Sync,
    /// Validate a record JSON file and save it, queueing it when offline
    Submit {
        /// Path to a JSON record with a `type` field
        file: PathBuf,
    },
    /// Fetch records, falling back to the local cache when offline
    Fetch {
        /// Record type filter, e.g. punch_in
        #[arg(long = "type")]
        record_type: Option<RecordType>,
    },
    /// Delete every queued mutation, synced or not
    Clear {
        /// Required so pending work is not dropped by accident
        #[arg(long)]
        yes: bool,
    },
    /// Precache, check connectivity and sync in the background until Ctrl+C
    Daemon,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    field_sync::init_logging();

    let cli = Cli::parse();
    let mut config = AppConfig::from_env();
    if let Some(url) = cli.api_base_url {
        config.api.base_url = url;
    }
    if let Some(url) = cli.database_url {
        config.storage.database_url = url;
    }

    let state = AppState::new(config)
        .await
        .context("failed to initialise sync engine")?;
    if !state.store.is_durable() {
        warn!("offline storage unavailable, writes will not be queued");
    }

    let result = match cli.command {
        Commands::Status => status(&state).await,
        Commands::Sync => sync(&state).await,
        Commands::Submit { file } => submit(&state, file).await,
        Commands::Fetch { record_type } => fetch(&state, record_type).await,
        Commands::Clear { yes } => clear(&state, yes).await,
        Commands::Daemon => daemon(&state).await,
    };

    state.store.close().await;
    result
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

async fn api_reachable(state: &AppState) -> bool {
    HealthCheck::new(
        state.transport.clone(),
        state.monitor.clone(),
        state.config.api.health_url(),
        Duration::from_secs(state.config.connectivity.check_interval_secs.max(1)),
    )
    .check_once()
    .await
}

async fn status(state: &AppState) -> Result<()> {
    let status = state.reconciler.status().await;
    print_json(&status)
}

async fn sync(state: &AppState) -> Result<()> {
    if !api_reachable(state).await {
        warn!("records API unreachable, nothing synced");
    }
    match state.reconciler.reconcile(SyncTrigger::Manual).await? {
        ReconcileOutcome::Completed(report) => print_json(&report),
        ReconcileOutcome::SkippedOffline => {
            let pending = state.records.pending_count().await?;
            println!("offline: {pending} mutation(s) still pending");
            Ok(())
        }
        ReconcileOutcome::Coalesced => {
            println!("a sync is already running");
            Ok(())
        }
    }
}

async fn submit(state: &AppState, file: PathBuf) -> Result<()> {
    let raw = tokio::fs::read_to_string(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let value: serde_json::Value =
        serde_json::from_str(&raw).with_context(|| format!("{} is not JSON", file.display()))?;
    let record = FieldRecord::from_value(value).map_err(anyhow::Error::msg)?;

    let outcome = state.records.save(&record).await?;
    print_json(&outcome)
}

async fn fetch(state: &AppState, record_type: Option<RecordType>) -> Result<()> {
    let outcome = state.records.fetch_all(record_type).await?;
    print_json(&outcome)
}

async fn clear(state: &AppState, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!("refusing to clear the queue without --yes");
    }
    let removed = state.store.queue.clear().await?;
    println!("removed {removed} queued mutation(s)");
    Ok(())
}

async fn daemon(state: &AppState) -> Result<()> {
    let report = state.interceptor.install().await;
    for (url, reason) in &report.failed {
        warn!(%url, %reason, "precache failed");
    }
    let purged = state.interceptor.activate().await?;
    info!(purged = purged.len(), "cache activated");

    let shutdown = CancellationToken::new();
    let tasks = state.start_background(shutdown.clone());

    if api_reachable(state).await {
        tasks.background_sync.request();
    }

    info!("field-sync daemon running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;
    info!("shutting down");

    shutdown.cancel();
    for handle in tasks.handles {
        if let Err(err) = handle.await {
            warn!(error = %err, "background task ended abnormally");
        }
    }
    Ok(())
}
