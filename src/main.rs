//! diaats - Main entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use diaats::{
    api::{self, ApiState, AuthState},
    config::Config,
    db,
    instance::InstanceManager,
    runtime::DockerConnector,
};

#[derive(Parser, Debug)]
#[command(name = "diaats")]
#[command(about = "Service broker that provisions backing services as Docker containers")]
#[command(version)]
struct Cli {
    /// Address to bind
    #[arg(short = 'l', long, env = "DIAATS_LISTEN", default_value = "0.0.0.0:8080")]
    listen: SocketAddr,

    /// Emit logs as JSON
    #[arg(long)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("diaats=info,tower_http=info"));
    if cli.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_target(false))
            .init();
    }

    let config = Config::from_env()?;
    tracing::info!(
        "Loaded {} plan(s), runtime at {}",
        config.plans.plans().len(),
        config.runtime.endpoint
    );

    let registry = db::connect_from_config(&config.database).await?;
    tracing::info!(
        "Instance registry ready at {}",
        config.database.path.display()
    );

    let connector = Arc::new(DockerConnector::new(config.runtime.auto_pull));
    let manager = InstanceManager::new(&config.runtime, connector, registry);

    let auth = AuthState::from_config(&config.api);
    if config.api.credentials().is_none() {
        tracing::warn!("API_USERNAME/API_PASSWORD not set, API is unauthenticated");
    }

    let state = Arc::new(ApiState {
        manager,
        plans: config.plans,
    });
    let app = api::router(state, auth);

    tracing::info!("Binding on {}", cli.listen);
    let listener = tokio::net::TcpListener::bind(cli.listen).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
