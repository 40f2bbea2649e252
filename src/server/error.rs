//! Error envelope for the REST API.

use crate::gateway::GatewayError;
use crate::provisioning::ProvisionError;
use crate::workspace::WorkspaceError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde::Serialize;
use tracing::{error, warn};

/// Hard failure surfaced to API callers
///
/// Rendered as `{"error": {"code": ..., "message": ...}}` with a status derived from the
/// failure; soft "not found" results never take this path.
#[derive(Debug)]
pub enum ApiError {
    Provision(ProvisionError),
    Workspace(WorkspaceError),
    Internal(String),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: &'static str,
    message: String,
}

impl From<ProvisionError> for ApiError {
    fn from(e: ProvisionError) -> Self {
        Self::Provision(e)
    }
}

impl From<WorkspaceError> for ApiError {
    fn from(e: WorkspaceError) -> Self {
        Self::Workspace(e)
    }
}

fn provision_status(e: &ProvisionError) -> StatusCode {
    match e {
        ProvisionError::Gateway(GatewayError::ClientBuild(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        ProvisionError::Gateway(_) => StatusCode::BAD_GATEWAY,
        ProvisionError::ServiceNotConfigured { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Provision(e) | Self::Workspace(WorkspaceError::Provision(e)) => provision_status(e),
            Self::Workspace(WorkspaceError::UnsupportedImage(_)) => StatusCode::BAD_REQUEST,
            Self::Workspace(
                WorkspaceError::KeyUnavailable { .. }
                | WorkspaceError::EndpointUnavailable { .. }
                | WorkspaceError::ModelCatalog(_),
            ) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::Provision(e) | Self::Workspace(WorkspaceError::Provision(e)) => e.kind(),
            Self::Workspace(WorkspaceError::UnsupportedImage(_)) => "unsupported_image",
            Self::Workspace(WorkspaceError::KeyUnavailable { .. }) => "key_unavailable",
            Self::Workspace(WorkspaceError::EndpointUnavailable { .. }) => "endpoint_unavailable",
            Self::Workspace(WorkspaceError::ModelCatalog(_)) => "model_catalog",
            Self::Internal(_) => "internal",
        }
    }

    fn message(&self) -> String {
        match self {
            Self::Provision(e) => e.to_string(),
            Self::Workspace(e) => e.to_string(),
            Self::Internal(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = self.message();
        if status.is_server_error() {
            error!(code = self.code(), status = status.as_u16(), "{}", message);
        } else {
            warn!(code = self.code(), status = status.as_u16(), "{}", message);
        }

        let body = ErrorBody {
            error: ErrorDetail {
                code: self.code(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
