mod config;
mod http;
mod report;

use anyhow::Context;
use batch_transform_engine::{Engine, PassthroughAdapter, TransformAdapter};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{AdapterKind, AppConfig};
use crate::http::HttpTransformAdapter;
use crate::report::OutputFormat;

#[derive(Parser)]
#[command(name = "bt")]
#[command(about = "Batch media transformer with retry and quarantine", long_about = None)]
struct Cli {
    /// Configuration file (YAML or TOML)
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Maximum concurrent workers
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    /// Retries after the first attempt
    #[arg(long, global = true)]
    retries: Option<u32>,

    /// Per-attempt timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Transform service endpoint
    #[arg(long, global = true)]
    endpoint: Option<String>,

    /// Transform backend
    #[arg(long, global = true, value_enum)]
    adapter: Option<AdapterKind>,

    /// Write every output directly under the output root
    #[arg(long, global = true)]
    flatten: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Summary format
    #[arg(short, long, global = true, value_enum, default_value = "table")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transform every supported file under SOURCE
    Run {
        source: PathBuf,

        /// Output root (defaults to SOURCE/optimized)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Re-run items held in OUTPUT's holding area
    Recover { output: PathBuf },
}

impl Cli {
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(concurrency) = self.concurrency {
            config.engine.max_concurrent = concurrency;
        }
        if let Some(retries) = self.retries {
            config.engine.max_retries = retries;
        }
        if let Some(timeout) = self.timeout {
            config.engine.timeout_secs = timeout;
        }
        if let Some(endpoint) = &self.endpoint {
            config.adapter.endpoint = endpoint.clone();
        }
        if let Some(kind) = self.adapter {
            config.adapter.kind = kind;
        }
        if self.flatten {
            config.engine.preserve_structure = false;
        }
        if self.log_json {
            config.logging.json = true;
        }
    }
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| config.logging.level.clone().into());

    if config.logging.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

fn build_adapter(config: &AppConfig) -> anyhow::Result<Arc<dyn TransformAdapter>> {
    let adapter: Arc<dyn TransformAdapter> = match config.adapter.kind {
        AdapterKind::Http => {
            let adapter = HttpTransformAdapter::new(&config.adapter.endpoint)
                .with_context(|| format!("invalid endpoint {}", config.adapter.endpoint))?;
            info!("Using transform service at {}", adapter.endpoint());
            Arc::new(adapter)
        }
        AdapterKind::Passthrough => {
            info!("Using passthrough adapter");
            Arc::new(PassthroughAdapter)
        }
    };
    Ok(adapter)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    init_tracing(&config);

    let adapter = build_adapter(&config)?;
    let engine = Engine::new(config.engine.clone(), adapter)?;

    let cancel = engine.cancellation_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, finishing in-flight items");
            cancel.cancel();
        }
    });

    let report = match &cli.command {
        Commands::Run { source, output } => {
            let output = output.clone().unwrap_or_else(|| source.join("optimized"));
            engine.run_full_pass(source, &output).await?
        }
        Commands::Recover { output } => engine.run_recovery_pass(output).await?,
    };

    println!("{}", report::render(&report, cli.format)?);
    Ok(())
}
