//! Complaint tracker HTTP server.

use complaint_web::auth::TokenKeys;
use complaint_web::config::Config;
use complaint_web::state::AppState;
use complaint_web::uploads::UploadStore;
use database::Database;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        addr = %config.addr,
        policy = ?config.transition_policy,
        "Starting complaint server"
    );

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    if let Some(admin) = &config.bootstrap_admin {
        complaint_web::ensure_bootstrap_admin(&db, admin).await?;
    }

    // Build application state
    let state = AppState::new(
        db,
        UploadStore::new(&config.upload_dir),
        TokenKeys::from_secret(config.jwt_secret.as_bytes(), config.token_ttl_hours),
        config.transition_policy,
        config.max_upload_bytes,
    );

    let app = complaint_web::app(state);

    // Start server
    info!(addr = %config.addr, "Complaint server listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
