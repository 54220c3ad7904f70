//! Quarry API Server
//!
//! Main entry point for the Quarry payment ledger service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quarry_api::{AppState, create_router};
use quarry_core::payment::CustodyPolicy;
use quarry_db::connect;
use quarry_shared::{AppConfig, JwtConfig, JwtService, TracingAuditSink};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "quarry=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Connect to database
    let db = connect(&config.database)
        .await
        .context("Failed to connect to database")?;
    info!("Connected to database");

    let custody = CustodyPolicy::new(&config.ledger.custodians);
    if custody.is_unrestricted() {
        info!("No custodians configured, custodian field is unrestricted");
    } else {
        info!(
            custodians = config.ledger.custodians.len(),
            "Cash custody restricted"
        );
    }

    // Create application state
    let state = AppState {
        db: Arc::new(db),
        jwt_service: Arc::new(JwtService::new(JwtConfig::from(&config.jwt))),
        audit: Arc::new(TracingAuditSink),
        custody: Arc::new(custody),
        vat_rate: config.ledger.vat_rate,
    };

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
