//! # HTTP Server
//!
//! REST API consumed by the workspace console, plus operational endpoints.
//!
//! MaaS routes are nested under `/api/maas`:
//! - `GET /` - greeting
//! - `GET /check-create-user/{username}` - account id or `-1`
//! - `POST /check-create-application` - application key or `-1`
//! - `DELETE /delete-application` - deletion status text
//! - `GET /get-application-plan-endpoint/{service_name}` - endpoint URL or status text
//! - `GET /get-vectordb-configuration` - JSON-encoded vector DB settings
//! - `GET /is-guard-enabled`, `GET /is-safety-enabled` - `"true"` / `"false"`
//! - `POST /workspace-environment` - environment variables for a workbench
//!
//! Operational routes at the root:
//! - `/metrics` - Prometheus metrics in text format
//! - `/healthz` - Liveness probe (always returns 200)
//! - `/readyz` - Readiness probe (returns 200 once the server is accepting requests)

mod error;
mod handlers;

pub use error::ApiError;
pub use handlers::{Message, WorkspaceEnvironment};

use crate::config::{AppConfig, FeatureToggles, VectorDbConfig};
use crate::constants::API_BASE_PATH;
use crate::gateway::{AdminApi, GatewayClient};
use crate::models::ModelCatalog;
use crate::observability::metrics;
use crate::provisioning::Provisioner;
use crate::workspace::WorkspaceCredentials;
use anyhow::Context;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    pub provisioner: Provisioner,
    pub workspace: WorkspaceCredentials,
    pub vector_db: VectorDbConfig,
    pub toggles: FeatureToggles,
    pub is_ready: Arc<AtomicBool>,
}

impl AppState {
    /// Build state around any admin API implementation
    ///
    /// # Errors
    /// Returns an error if the model catalog HTTP client cannot be built
    pub fn new(api: Arc<dyn AdminApi>, config: &AppConfig) -> anyhow::Result<Self> {
        let provisioner = Provisioner::new(api, &config.gateway);
        let catalog = ModelCatalog::new(config.gateway.request_timeout())
            .context("Failed to create model catalog client")?;
        let workspace = WorkspaceCredentials::new(
            provisioner.clone(),
            catalog,
            config.model_auth.clone(),
            config.toggles,
            config.vector_db.clone(),
        );

        Ok(Self {
            provisioner,
            workspace,
            vector_db: config.vector_db.clone(),
            toggles: config.toggles,
            is_ready: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Build state talking to the configured gateway
    ///
    /// # Errors
    /// Returns an error if an HTTP client cannot be built
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        let client = GatewayClient::new(&config.gateway).context("Failed to create gateway client")?;
        Self::new(Arc::new(client), config)
    }
}

/// Full application router
pub fn router(state: AppState) -> Router {
    let maas = Router::new()
        .route("/", get(handlers::hello))
        .route("/check-create-user/{username}", get(handlers::check_create_user))
        .route("/check-create-application", post(handlers::check_create_application))
        .route("/delete-application", delete(handlers::delete_application))
        .route(
            "/get-application-plan-endpoint/{service_name}",
            get(handlers::get_application_plan_endpoint),
        )
        .route("/get-vectordb-configuration", get(handlers::get_vectordb_configuration))
        .route("/is-guard-enabled", get(handlers::is_guard_enabled))
        .route("/is-safety-enabled", get(handlers::is_safety_enabled))
        .route("/workspace-environment", post(handlers::workspace_environment));

    Router::new()
        .nest(API_BASE_PATH, maas)
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn(count_requests)),
        )
        .with_state(state)
}

/// Serve the router until Ctrl-C / SIGTERM
///
/// # Errors
/// Returns an error if the port cannot be bound or the server fails
pub async fn start_server(port: u16, state: AppState) -> anyhow::Result<()> {
    let is_ready = Arc::clone(&state.is_ready);
    let app = router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("HTTP server listening on {}", addr);
    is_ready.store(true, Ordering::Relaxed);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server failed")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
    info!("Shutdown signal received");
}

async fn count_requests(request: Request, next: Next) -> Response {
    metrics::increment_http_requests();
    next.run(request).await
}

async fn metrics_handler() -> impl IntoResponse {
    match metrics::render() {
        Ok(buffer) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                [("content-type", "text/plain")],
                format!("Failed to encode metrics: {e}").into_bytes(),
            )
        }
    }
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readyz_handler(State(state): State<AppState>) -> impl IntoResponse {
    if state.is_ready.load(Ordering::Relaxed) {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}
