//! # Workspace Commands
//!
//! Model probing and workbench environment preview.

use anyhow::{Context, Result};
use maas_provisioner::config::AppConfig;
use maas_provisioner::models::{ModelAuth, ModelCatalog};
use maas_provisioner::server::AppState;
use maas_provisioner::workspace::WorkspaceRequest;
use std::time::Duration;

const PROBE_TIMEOUT: Duration = Duration::from_secs(30);

pub async fn models_command(endpoint: &str, key: &str, auth: ModelAuth) -> Result<()> {
    let catalog = ModelCatalog::new(PROBE_TIMEOUT).context("Failed to create model catalog client")?;
    let model = catalog
        .first_model_id(endpoint, key, auth)
        .await
        .with_context(|| format!("Failed to list models at {endpoint}"))?;
    println!("{model}");
    Ok(())
}

/// Print `KEY=value` lines for a workbench
pub async fn workspace_env_command(
    config: &AppConfig,
    user_name: String,
    project_name: String,
    notebook_name: String,
    image_name: String,
) -> Result<()> {
    let state = AppState::from_config(config)?;
    let request = WorkspaceRequest {
        user_name,
        project_name,
        notebook_name,
        image_name,
    };

    let variables = state
        .workspace
        .environment_for(&request)
        .await
        .with_context(|| format!("Failed to build environment for image '{}'", request.image_name))?;

    for variable in variables {
        println!("{}={}", variable.key, variable.value);
    }
    Ok(())
}
