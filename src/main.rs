use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pai_berbagi_api::config::{AppConfig, Environment};
use pai_berbagi_api::database::DatabaseManager;
use pai_berbagi_api::server;
use pai_berbagi_api::state::AppState;
use pai_berbagi_api::storage::CloudinaryUploader;

#[derive(Debug, Parser)]
#[command(name = "pai-berbagi-api", version, about = "Jenjang/modul/kategori REST backend")]
struct Args {
    /// Interface to bind (overrides HOST)
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on (overrides PORT, default 3211)
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL and CLOUD_* credentials
    let _ = dotenvy::dotenv();
    let args = Args::parse();

    let mut config = AppConfig::from_env().context("invalid configuration")?;
    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    init_tracing(config.environment);
    tracing::info!("Starting pai-berbagi-api in {:?} mode", config.environment);

    let addr = config.bind_address()?;
    let db = DatabaseManager::connect(&config.database)
        .await
        .context("failed to connect to database")?;
    let uploader = Arc::new(CloudinaryUploader::new(config.storage.clone()));
    let state = AppState::new(db, uploader, config);

    server::serve(addr, state, server::shutdown_signal()).await?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,tower_http=info"));
    let registry = tracing_subscriber::registry().with(filter);

    match environment {
        Environment::Production => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        Environment::Development => registry.with(tracing_subscriber::fmt::layer()).init(),
    }
}
