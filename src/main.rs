//! Attendance server binary.
//!
//! Usage: `attendance-server [CONFIG_DIR]`. The directory defaults to
//! `$ATTENDANCE_CONFIG_DIR`, then `./config/default`.

use std::str::FromStr;

use attendance_engine::api::{AppState, create_router};
use attendance_engine::config::ConfigLoader;
use tracing::{Level, info};

const DEFAULT_CONFIG_DIR: &str = "./config/default";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config_dir = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("ATTENDANCE_CONFIG_DIR").ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_DIR.to_string());

    let config = ConfigLoader::load(&config_dir)?;

    let level = Level::from_str(&config.settings().server.log_level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_level(true)
        .init();

    let bind_addr = config.settings().server.bind_addr.clone();
    info!(
        config_dir = %config_dir,
        employees = config.employees().len(),
        "Configuration loaded"
    );

    let state = AppState::in_memory(config)?;
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!(bind_addr = %bind_addr, "Attendance server listening");
    axum::serve(listener, router).await?;

    Ok(())
}
