use anyhow::Result;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

mod error;
mod rate_limiter;
mod routes;
mod state;

use booking_common::{
    config::Settings,
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    repositories::{SessionRepository, UserRepository},
};

use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting authentication service");

    let settings = Settings::load("0.0.0.0:3000")?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let app_state = AppState::new(
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(SessionRepository::new(pool)),
        settings.clone(),
    );

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&settings.bind_address).await?;
    info!("Authentication service listening on {}", settings.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
