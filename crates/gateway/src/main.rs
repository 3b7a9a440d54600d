use std::net::SocketAddr;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gateway::{create_router, AppState, GatewayConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gateway=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = GatewayConfig::parse();

    tracing::info!(
        environment = ?config.environment,
        frontend = %config.frontend_base(),
        relay = config.backend_url.is_some(),
        "Starting auth gateway"
    );
    if config.backend_url.is_none() {
        tracing::info!("BACKEND_URL not set, sessions are issued locally without relay");
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_router(AppState::from_config(config));

    tracing::info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
