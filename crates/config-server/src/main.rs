use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use clap::Parser;

use facestream_config::infrastructure::file_config_store::{FileConfigStore, DEFAULT_CONFIG_DIR};

mod error;
mod routes;

/// Serves per-stream configuration records over a small JSON API.
#[derive(Parser, Debug)]
#[command(name = "stream-config-server")]
struct Cli {
    /// Port to listen on.
    #[arg(long, default_value = "8080")]
    port: u16,

    /// Directory of stored configuration records.
    #[arg(long = "config_dir", default_value = DEFAULT_CONFIG_DIR)]
    config_dir: PathBuf,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()).await {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(FileConfigStore::new(&cli.config_dir));
    let app = routes::create_router(store);

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cli.port)).await?;
    log::info!("Configuration API server listening on port {}", cli.port);
    log::info!("Storing configs in: {}", cli.config_dir.display());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Configuration API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
}
