//! MaaS route handlers.
//!
//! Soft "not found" results are answered with 200 and a sentinel or status text in
//! `message`; only hard failures go through [`ApiError`].

use super::error::ApiError;
use super::AppState;
use crate::constants::NOT_FOUND_SENTINEL;
use crate::workspace::{EnvVar, WorkspaceRequest};
use axum::extract::{Path, State};
use axum::response::Json;
use serde::{Deserialize, Serialize};

/// `{"message": ...}` body shared by every MaaS route
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }

    fn or_sentinel(value: Option<String>) -> Json<Self> {
        Self::new(value.unwrap_or_else(|| NOT_FOUND_SENTINEL.to_string()))
    }
}

#[derive(Debug, Deserialize)]
pub struct CheckCreateApplication {
    pub user_name: String,
    pub app_name: String,
    pub service_name: String,
}

#[derive(Debug, Deserialize)]
pub struct DeleteApplication {
    pub user_name: String,
    pub app_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WorkspaceEnvironment {
    pub variables: Vec<EnvVar>,
}

pub async fn hello() -> Json<Message> {
    Message::new("Hello from maas")
}

pub async fn check_create_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let account_id = state
        .provisioner
        .resolve_or_create_account(&username)
        .await?;
    Ok(Message::or_sentinel(account_id))
}

pub async fn check_create_application(
    State(state): State<AppState>,
    Json(body): Json<CheckCreateApplication>,
) -> Result<Json<Message>, ApiError> {
    let key = state
        .provisioner
        .resolve_or_create_application(&body.user_name, &body.app_name, &body.service_name)
        .await?;
    Ok(Message::or_sentinel(key))
}

pub async fn delete_application(
    State(state): State<AppState>,
    Json(body): Json<DeleteApplication>,
) -> Result<Json<Message>, ApiError> {
    let outcome = state
        .provisioner
        .delete_application(&body.user_name, &body.app_name)
        .await?;
    Ok(Message::new(outcome.message()))
}

pub async fn get_application_plan_endpoint(
    State(state): State<AppState>,
    Path(service_name): Path<String>,
) -> Result<Json<Message>, ApiError> {
    let outcome = state
        .provisioner
        .resolve_endpoint_for_service(&service_name)
        .await?;
    Ok(Message::new(outcome.into_message()))
}

pub async fn get_vectordb_configuration(
    State(state): State<AppState>,
) -> Result<Json<Message>, ApiError> {
    let message = state
        .vector_db
        .to_message()
        .map_err(|e| ApiError::Internal(format!("failed to encode vector DB configuration: {e}")))?;
    Ok(Message::new(message))
}

pub async fn is_guard_enabled(State(state): State<AppState>) -> Json<Message> {
    Message::new(state.toggles.guard_enabled.to_string())
}

pub async fn is_safety_enabled(State(state): State<AppState>) -> Json<Message> {
    Message::new(state.toggles.safety_enabled.to_string())
}

pub async fn workspace_environment(
    State(state): State<AppState>,
    Json(request): Json<WorkspaceRequest>,
) -> Result<Json<WorkspaceEnvironment>, ApiError> {
    let variables = state.workspace.environment_for(&request).await?;
    Ok(Json(WorkspaceEnvironment { variables }))
}
