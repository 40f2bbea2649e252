//! # MaaS Provisioner
//!
//! REST service that provisions Models-as-a-Service credentials for AI workspaces.
//!
//! On every workbench start the console asks this service to find or create, for the
//! workspace owner:
//!
//! 1. **A gateway account** - looked up by username, signed up on a miss
//! 2. **An application** - one per workbench and backend service, carrying the API key
//! 3. **The service endpoint** - resolved through the application plan exposing the service
//! 4. **The model name** - first model advertised by the endpoint
//!
//! Every step is idempotent, so re-running for the same workbench reuses existing keys.
//!
//! ## Configuration
//!
//! Environment variables (optionally from a `.env` file): `MAAS_API_URL` and `MAAS_API_KEY`
//! are required; see `config` for the full list.

use anyhow::{Context, Result};
use maas_provisioner::config::AppConfig;
use maas_provisioner::observability::{self, metrics};
use maas_provisioner::server::{start_server, AppState};
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Must run before any TLS client is built; an already installed provider is fine
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed");
    }

    let dotenv_path = dotenvy::dotenv().ok();

    let config = AppConfig::from_env().context("Failed to load configuration")?;
    observability::init_tracing(&config.server);

    if let Some(path) = dotenv_path {
        debug!("Loaded environment from {}", path.display());
    }

    info!("Starting MaaS provisioner");
    info!(
        "Build: {} ({}, {})",
        env!("CARGO_PKG_VERSION"),
        env!("BUILD_GIT_HASH"),
        env!("BUILD_DATETIME")
    );
    info!(
        api_url = %config.gateway.api_url,
        port = config.server.port,
        vector_db = %config.vector_db.backend,
        guard_enabled = config.toggles.guard_enabled,
        safety_enabled = config.toggles.safety_enabled,
        "Configuration loaded"
    );

    metrics::register_metrics().context("Failed to register metrics")?;

    let state = AppState::from_config(&config)?;
    start_server(config.server.port, state).await
}
