use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use evidence_connector::config::load_config;
use evidence_connector::connector::{
    run_pass, Connector, GitHubConnector, MemoryLastSeenStore, PathFilter, RiskMapper,
};
use evidence_connector::{ArtifactMetadata, BundleEmitter, ChangeEvent, DiffResult, RiskTier};

#[derive(Parser)]
#[command(name = "evidence-connector", version, about = "Emit tamper-evident evidence bundles for source-system changes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the configured GitHub repositories and emit bundles for changes
    Run {
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
        /// Run a single polling pass and exit
        #[arg(long)]
        once: bool,
    },
    /// Build and emit one bundle from event, diff and metadata documents
    Emit {
        #[arg(short, long, value_name = "FILE")]
        config: PathBuf,
        #[arg(long, value_name = "FILE")]
        event: PathBuf,
        #[arg(long, value_name = "FILE")]
        diff: Option<PathBuf>,
        #[arg(long, value_name = "FILE")]
        metadata: Option<PathBuf>,
        /// Overrides the configured risk mapping
        #[arg(long, value_name = "TIER")]
        risk_tier: Option<RiskTier>,
        #[arg(long, value_name = "ID")]
        bead_id: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "evidence_connector=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Run { config, once } => run(&config, once).await,
        Commands::Emit {
            config,
            event,
            diff,
            metadata,
            risk_tier,
            bead_id,
        } => {
            emit(
                &config,
                &event,
                diff.as_deref(),
                metadata.as_deref(),
                risk_tier,
                bead_id.as_deref(),
            )
            .await
        }
    }
}

async fn run(config_path: &Path, once: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let emitter = BundleEmitter::from_config(&config)?;
    let filter = PathFilter::new(&config.filters)?;
    let risk = RiskMapper::new(&config.risk_mapping)?;

    let last_seen = Arc::new(MemoryLastSeenStore::new());
    let connector = GitHubConnector::from_config(&config, last_seen)?;

    info!("Starting {}...", connector.name());
    connector.start().await?;

    let mut interval = tokio::time::interval(Duration::from_secs(config.source.poll_interval_secs.max(1)));
    loop {
        tokio::select! {
            _ = interval.tick() => {
                if let Err(e) = run_pass(&connector, &emitter, &filter, &risk).await {
                    error!("Polling pass failed: {}", e);
                }
                if once {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown requested");
                break;
            }
        }
    }

    connector.stop().await?;
    Ok(())
}

async fn emit(
    config_path: &Path,
    event_path: &Path,
    diff_path: Option<&Path>,
    metadata_path: Option<&Path>,
    risk_tier: Option<RiskTier>,
    bead_id: Option<&str>,
) -> Result<()> {
    let config = load_config(config_path)?;
    let emitter = BundleEmitter::from_config(&config)?;

    let event: ChangeEvent = read_document(event_path)?;
    let diff: Option<DiffResult> = diff_path.map(read_document::<DiffResult>).transpose()?;
    let metadata: ArtifactMetadata = match metadata_path {
        Some(path) => read_document(path)?,
        None => ArtifactMetadata::new(),
    };

    let risk_tier = match risk_tier {
        Some(tier) => tier,
        None => RiskMapper::new(&config.risk_mapping)?.map_risk_tier(&event.artifact_id),
    };

    let emission = emitter
        .emit(&event, diff.as_ref(), &metadata, risk_tier, bead_id)
        .await?;

    println!("bundle_id: {}", emission.bundle.bundle_id);
    println!("root_hash: {}", emission.bundle.root_hash());
    println!("destination: {}", emission.receipt.destination);
    Ok(())
}

/// Read a JSON or YAML document
fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_yaml::from_str(&contents).with_context(|| format!("Failed to parse {}", path.display()))
}
