use chrono::Duration;
use clap::Parser;
use leaseq_server::{server, Registry, ServerConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lq-server")]
#[command(about = "Single-node leased task queue server", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(long, default_value = "config.yaml")]
    config: String,

    /// Bind address
    #[arg(short = 'i', long)]
    host: Option<String>,

    /// Bind port
    #[arg(short = 'p', long)]
    port: Option<u16>,

    /// Checkpoint directory for snapshots
    #[arg(short = 'c', long)]
    checkpoint_dir: Option<PathBuf>,

    /// Visibility timeout in seconds
    #[arg(short = 't', long)]
    timeout: Option<u64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config = if std::path::Path::new(&args.config).exists() {
        ServerConfig::from_file(&args.config)?
    } else {
        tracing::debug!("config file not found, using defaults");
        ServerConfig::default()
    };

    // CLI flags win over the file
    if let Some(host) = args.host {
        config.network.host = host;
    }
    if let Some(port) = args.port {
        config.network.port = port;
    }
    if let Some(dir) = args.checkpoint_dir {
        config.persistence.checkpoint_dir = dir;
    }
    if let Some(timeout) = args.timeout {
        config.queue.visibility_timeout_secs = timeout;
    }

    tracing::info!(
        addr = %config.bind_addr(),
        timeout_secs = config.queue.visibility_timeout_secs,
        checkpoint_dir = %config.persistence.checkpoint_dir.display(),
        "starting server"
    );

    let registry = Arc::new(Registry::new(
        Duration::seconds(config.queue.visibility_timeout_secs as i64),
        &config.persistence.checkpoint_dir,
    ));

    if let Err(e) = registry.load() {
        tracing::warn!(error = %e, "snapshot load failed, starting empty");
    }

    server::run(&config.bind_addr(), registry).await
}
