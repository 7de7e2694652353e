//! `profile-svc`: profile service binary entry point.
//!
//! Startup sequence:
//! 1. Load and validate [`Config`] from environment variables.
//! 2. Initialise structured JSON logging.
//! 3. Decode the field key and load the path-group policy.
//! 4. Build the Axum router and start the HTTP server.

mod config;
mod model;
mod policy;
mod server;
mod store;
mod telemetry;

use std::sync::Arc;

use anyhow::Result;
use fieldcrypt::FieldCipher;
use tracing::info;

use config::Config;
use server::state::AppState;
use store::MemoryProfileStore;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen_port = cfg.listen_port,
        "profile-svc starting"
    );

    // -----------------------------------------------------------------------
    // 3. Key and policy
    // -----------------------------------------------------------------------
    let cipher = FieldCipher::new(cfg.field_key()?);
    let groups = match &cfg.path_groups_file {
        Some(path) => policy::load(path)?,
        None => policy::default_groups()?,
    };
    for group in &groups {
        info!(
            group = group.name(),
            mode = ?group.mode(),
            presence = ?group.presence(),
            paths = group.paths().len(),
            "path group loaded"
        );
    }

    // -----------------------------------------------------------------------
    // 4. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(cipher, groups, Arc::new(MemoryProfileStore::new()));
    let router = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.listen_port).into();
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await?;

    Ok(())
}
