//! # Provisioning Commands
//!
//! Account, application, plan and endpoint commands.

use anyhow::{Context, Result};
use maas_provisioner::config::AppConfig;
use maas_provisioner::gateway::GatewayClient;
use maas_provisioner::provisioning::{EndpointOutcome, Provisioner};
use std::sync::Arc;

fn provisioner(config: &AppConfig) -> Result<Provisioner> {
    let client = GatewayClient::new(&config.gateway).context("Failed to create gateway client")?;
    Ok(Provisioner::new(Arc::new(client), &config.gateway))
}

/// Find or create the account of `username`
pub async fn check_user_command(config: &AppConfig, username: &str) -> Result<()> {
    let account_id = provisioner(config)?
        .resolve_or_create_account(username)
        .await
        .with_context(|| format!("Failed to look up account '{username}'"))?;

    match account_id {
        Some(id) => println!("✅ Account for '{username}': {id}"),
        None => println!("❌ Account for '{username}' could not be resolved or created"),
    }
    Ok(())
}

/// Find or create an application and print its key
pub async fn check_app_command(
    config: &AppConfig,
    username: &str,
    app_name: &str,
    service: &str,
) -> Result<()> {
    let key = provisioner(config)?
        .resolve_or_create_application(username, app_name, service)
        .await
        .with_context(|| format!("Failed to provision application '{app_name}'"))?;

    match key {
        Some(key) => println!("{key}"),
        None => println!("❌ No key available for application '{app_name}' of '{username}'"),
    }
    Ok(())
}

pub async fn delete_app_command(config: &AppConfig, username: &str, app_name: &str) -> Result<()> {
    let outcome = provisioner(config)?
        .delete_application(username, app_name)
        .await
        .with_context(|| format!("Failed to delete application '{app_name}'"))?;
    println!("{outcome}");
    Ok(())
}

pub async fn plan_command(config: &AppConfig, service: &str) -> Result<()> {
    let plan_id = provisioner(config)?
        .resolve_plan_id_for_service(service)
        .await
        .with_context(|| format!("Failed to resolve plan for '{service}'"))?;
    println!("{plan_id}");
    Ok(())
}

pub async fn endpoint_command(config: &AppConfig, service: &str) -> Result<()> {
    let outcome = provisioner(config)?
        .resolve_endpoint_for_service(service)
        .await
        .with_context(|| format!("Failed to resolve endpoint for '{service}'"))?;

    match outcome {
        EndpointOutcome::Endpoint(url) => println!("{url}"),
        EndpointOutcome::PlanNotFound => println!("❌ {}", EndpointOutcome::PLAN_NOT_FOUND_MESSAGE),
    }
    Ok(())
}
