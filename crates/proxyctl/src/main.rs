//! CLI host for the local selective-routing proxy supervisor

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use http::Uri;
use proxy_supervisor::{
    EngineSettings, JsonPreferenceStore, PreferenceStore, StaticConfigWriter, Supervisor,
};
use selective_routing::{RouteDecision, RoutingContext, RoutingPolicy, SelectiveRouter};
use serde::Deserialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "proxyctl")]
#[command(about = "Local selective-routing proxy supervisor")]
#[command(version)]
struct Cli {
    /// Supervisor configuration file path
    #[arg(short, long, global = true, default_value = "supervisor.yaml")]
    config: PathBuf,

    /// State directory (preferences, engine working directory)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the engine and run until interrupted
    Run,

    /// Print the persisted last-known status
    Status,

    /// Print the routing decision for a URL
    Decide {
        /// URL to classify
        url: String,
    },
}

/// On-disk supervisor configuration
#[derive(Debug, Deserialize)]
struct CliConfig {
    #[serde(flatten)]
    engine: EngineSettings,

    /// Pre-rendered engine configuration to materialize before starting
    engine_config: PathBuf,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let state_dir = cli
        .state_dir
        .clone()
        .or_else(|| dirs::data_local_dir().map(|dir| dir.join("proxyctl")))
        .context("no state directory available; pass --state-dir")?;

    smol::block_on(async {
        match cli.command {
            Commands::Run => run(&cli.config, &state_dir).await,
            Commands::Status => status(&state_dir),
            Commands::Decide { url } => decide(&cli.config, &url),
        }
    })
}

fn load_config(path: &Path) -> Result<CliConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_yaml::from_str(&text).context("failed to parse supervisor config")
}

async fn run(config_path: &Path, state_dir: &Path) -> Result<()> {
    let config = load_config(config_path)?;
    let engine_config = std::fs::read_to_string(&config.engine_config)
        .with_context(|| format!("failed to read {}", config.engine_config.display()))?;

    let routing = Arc::new(RoutingContext::direct());
    let prefs = Arc::new(JsonPreferenceStore::open(state_dir.join("prefs.json")));
    let writer = Box::new(StaticConfigWriter::new(
        state_dir.join("engine"),
        engine_config,
    ));
    let supervisor = Supervisor::new(config.engine, routing, writer, prefs);

    let statuses = supervisor.subscribe();
    let interrupted = interrupt_channel()?;

    supervisor.request_start().await;

    let watch = async {
        while let Ok(status) = statuses.recv().await {
            println!("status: {status}");
        }
    };
    smol::future::or(watch, async {
        let _ = interrupted.recv().await;
    })
    .await;

    supervisor.request_stop().await;
    println!("status: {}", supervisor.status());
    Ok(())
}

fn status(state_dir: &Path) -> Result<()> {
    let prefs = JsonPreferenceStore::open(state_dir.join("prefs.json"));
    println!("{}", prefs.last_status());
    Ok(())
}

fn decide(config_path: &Path, url: &str) -> Result<()> {
    let config = load_config(config_path)?;
    let router = SelectiveRouter::new(config.engine.upstream, None);

    let uri: Uri = url.parse().context("invalid url")?;
    match router.select(&uri) {
        RouteDecision::Direct => println!("direct"),
        RouteDecision::ViaUpstream(addr) => println!("via upstream {addr}"),
    }
    Ok(())
}

/// Channel that yields once on SIGINT/SIGTERM
fn interrupt_channel() -> Result<async_channel::Receiver<()>> {
    use signal_hook::consts::{SIGINT, SIGTERM};
    use signal_hook::iterator::Signals;

    let (tx, rx) = async_channel::bounded(1);
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    std::thread::spawn(move || {
        if signals.forever().next().is_some() {
            let _ = tx.send_blocking(());
        }
    });
    Ok(rx)
}
