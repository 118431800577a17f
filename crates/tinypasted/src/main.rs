//! tinypasted — the tinypaste daemon.
//!
//! Loads configuration, opens the paste store and serves the HTTP API.
//!
//! # Usage
//!
//! ```text
//! tinypasted serve --config /etc/tinypaste.toml
//! tinypasted dump-config --format json > tinypaste.json
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use tinypaste_api::{ApiState, build_router};
use tinypaste_core::PasteConfig;
use tinypaste_store::PasteStore;
use tracing::info;

#[derive(Parser)]
#[command(name = "tinypasted", about = "tinypaste daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve pastes over HTTP.
    Serve {
        /// Configuration file (TOML, or JSON when it ends in `.json`).
        #[arg(long)]
        config: Option<PathBuf>,

        /// Address to listen on, overriding the config file.
        #[arg(long)]
        listen: Option<SocketAddr>,

        /// Data directory, overriding the config file.
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },

    /// Print the default configuration and exit.
    DumpConfig {
        #[arg(long, value_enum, default_value = "toml")]
        format: DumpFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum DumpFormat {
    Toml,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tinypasted=debug,tinypaste=debug".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config,
            listen,
            data_dir,
        } => {
            let mut config = match config {
                Some(path) => PasteConfig::from_file(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => PasteConfig::default(),
            };
            if let Some(listen) = listen {
                config.listen = listen;
            }
            if let Some(data_dir) = data_dir {
                config.data_dir = data_dir;
            }
            run_serve(config).await
        }
        Command::DumpConfig { format } => {
            let config = PasteConfig::default();
            let rendered = match format {
                DumpFormat::Toml => config.to_toml_string()?,
                DumpFormat::Json => config.to_json_string()?,
            };
            println!("{}", rendered.trim_end());
            Ok(())
        }
    }
}

async fn run_serve(config: PasteConfig) -> anyhow::Result<()> {
    config.validate()?;
    info!(
        data_dir = ?config.data_dir,
        id_length = config.id_length,
        id_space = %config.id_space(),
        "tinypaste starting"
    );

    let store = PasteStore::open(&config)?;
    for name in &config.static_files {
        if !store.root().join(name).is_file() {
            tracing::warn!(%name, "reserved static asset is missing from the data directory");
        }
    }

    let addr = config.listen;
    let router = build_router(ApiState::new(store, config));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "HTTP server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
        info!("shutdown signal received");
    })
    .await?;

    info!("tinypaste stopped");
    Ok(())
}
