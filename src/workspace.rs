//! # Workspace credentials
//!
//! Builds the environment variables injected into a workbench at start.
//!
//! Each supported workbench image needs one or more backend services. For every service
//! the full chain runs: application key (find-or-create), proxy endpoint, and, where the
//! image expects it, the served model name. Application names are derived from project
//! and notebook, so re-running for the same workbench reuses the same keys.

use crate::config::{FeatureToggles, ModelAuthTable, VectorDbConfig};
use crate::constants::WORKBENCH_APP_PREFIX;
use crate::models::{ModelCatalog, ModelCatalogError};
use crate::provisioning::{EndpointOutcome, ProvisionError, Provisioner};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::{info, info_span, Instrument};

const GUARD_TEMPERATURE: &str = "0.7";
const GUARD_PROMPT_PREFIX: &str = "Draw a picture of";
const OPENAI_MAX_TOKENS: &str = "2048";
const OPENAI_MODEL_TOKEN_LIMIT: &str = "4096";

#[derive(Debug, Error)]
pub enum WorkspaceError {
    #[error("no application key could be provisioned for service '{service}'")]
    KeyUnavailable { service: String },

    #[error("no endpoint is available for service '{service}': ApplicationPlan not found")]
    EndpointUnavailable { service: String },

    #[error("unsupported workbench image '{0}'")]
    UnsupportedImage(String),

    #[error(transparent)]
    Provision(#[from] ProvisionError),

    #[error("model name lookup failed: {0}")]
    ModelCatalog(#[from] ModelCatalogError),
}

/// Workbench being started
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkspaceRequest {
    pub user_name: String,
    pub project_name: String,
    pub notebook_name: String,
    pub image_name: String,
}

impl WorkspaceRequest {
    /// `parasol-<project>-<notebook>[-<suffix>]`
    pub fn app_name(&self, suffix: Option<&str>) -> String {
        let base = format!(
            "{WORKBENCH_APP_PREFIX}-{}-{}",
            self.project_name, self.notebook_name
        );
        match suffix {
            Some(suffix) => format!("{base}-{suffix}"),
            None => base,
        }
    }
}

/// One environment variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvVar {
    pub key: String,
    pub value: String,
}

impl EnvVar {
    fn new(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: value.into(),
        }
    }
}

/// Supported workbench images
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkbenchImage {
    Anything,
    Code,
    Sdxl,
    Docling,
}

impl WorkbenchImage {
    /// Backend service behind the image's primary key
    pub fn primary_service(self) -> &'static str {
        match self {
            Self::Anything | Self::Code => "granite",
            Self::Sdxl => "sdxl",
            Self::Docling => "docling",
        }
    }
}

impl FromStr for WorkbenchImage {
    type Err = WorkspaceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "custom-custom-cai-anything" => Ok(Self::Anything),
            "custom-custom-cai-code" => Ok(Self::Code),
            "custom-custom-cai-sdxl" => Ok(Self::Sdxl),
            "custom-custom-cai-docling" => Ok(Self::Docling),
            other => Err(WorkspaceError::UnsupportedImage(other.to_string())),
        }
    }
}

/// Key and endpoint provisioned for one service
#[derive(Debug, Clone)]
struct ServiceAccess {
    service: &'static str,
    key: String,
    endpoint: String,
}

/// Assembles workbench environments on top of the provisioning chain
#[derive(Debug, Clone)]
pub struct WorkspaceCredentials {
    provisioner: Provisioner,
    catalog: ModelCatalog,
    model_auth: ModelAuthTable,
    toggles: FeatureToggles,
    vector_db: VectorDbConfig,
}

impl WorkspaceCredentials {
    pub fn new(
        provisioner: Provisioner,
        catalog: ModelCatalog,
        model_auth: ModelAuthTable,
        toggles: FeatureToggles,
        vector_db: VectorDbConfig,
    ) -> Self {
        Self {
            provisioner,
            catalog,
            model_auth,
            toggles,
            vector_db,
        }
    }

    /// Environment variables for the workbench described by `request`
    ///
    /// # Errors
    /// Returns an error for unsupported images, when a key or endpoint cannot be
    /// resolved, or when a model name lookup fails
    pub async fn environment_for(
        &self,
        request: &WorkspaceRequest,
    ) -> Result<Vec<EnvVar>, WorkspaceError> {
        let image: WorkbenchImage = request.image_name.parse()?;
        let span = info_span!(
            "maas.workspace.environment",
            username = %request.user_name,
            image = %request.image_name,
        );

        let variables = match image {
            WorkbenchImage::Anything => self.anything_env(request).instrument(span).await?,
            WorkbenchImage::Code => self.code_env(request).instrument(span).await?,
            WorkbenchImage::Sdxl => self.sdxl_env(request).instrument(span).await?,
            WorkbenchImage::Docling => self.docling_env(request).instrument(span).await?,
        };
        info!(
            image = %request.image_name,
            count = variables.len(),
            "Assembled workspace environment"
        );
        Ok(variables)
    }

    async fn anything_env(&self, request: &WorkspaceRequest) -> Result<Vec<EnvVar>, WorkspaceError> {
        let access = self
            .access(request, WorkbenchImage::Anything.primary_service(), None)
            .await?;
        let model = self.model_for(&access).await?;
        Ok(vec![
            EnvVar::new("DISABLE_TELEMETRY", "true"),
            EnvVar::new("EMBEDDING_ENGINE", "native"),
            EnvVar::new("GENERIC_OPEN_AI_API_KEY", access.key.as_str()),
            EnvVar::new("GENERIC_OPEN_AI_BASE_PATH", openai_base_path(&access.endpoint)),
            EnvVar::new("GENERIC_OPEN_AI_MAX_TOKENS", OPENAI_MAX_TOKENS),
            EnvVar::new("GENERIC_OPEN_AI_MODEL_PREF", model),
            EnvVar::new("LLM_PROVIDER", "generic-openai"),
            EnvVar::new("GENERIC_OPEN_AI_MODEL_TOKEN_LIMIT", OPENAI_MODEL_TOKEN_LIMIT),
            EnvVar::new("VECTOR_DB", self.vector_db.backend.as_str()),
        ])
    }

    async fn code_env(&self, request: &WorkspaceRequest) -> Result<Vec<EnvVar>, WorkspaceError> {
        let access = self
            .access(request, WorkbenchImage::Code.primary_service(), None)
            .await?;
        let model = self.model_for(&access).await?;
        Ok(vec![
            EnvVar::new("MODEL_ENDPOINT_URL", openai_base_path(&access.endpoint)),
            EnvVar::new("API_KEY", access.key),
            EnvVar::new("MODEL_NAME", model),
        ])
    }

    async fn sdxl_env(&self, request: &WorkspaceRequest) -> Result<Vec<EnvVar>, WorkspaceError> {
        let sdxl = self
            .access(request, WorkbenchImage::Sdxl.primary_service(), None)
            .await?;
        let mut variables = vec![
            EnvVar::new("PARASOL_MODE", "true"),
            EnvVar::new("SDXL_ENDPOINT_URL", sdxl.endpoint),
            EnvVar::new("SDXL_ENDPOINT_TOKEN", sdxl.key),
        ];

        if self.toggles.guard_enabled {
            let guard = self.access(request, "guard", Some("guard")).await?;
            let model = self.model_for(&guard).await?;
            variables.extend([
                EnvVar::new("GUARD_ENDPOINT_URL", openai_base_path(&guard.endpoint)),
                EnvVar::new("GUARD_ENDPOINT_TOKEN", guard.key),
                EnvVar::new("GUARD_ENABLED", "true"),
                EnvVar::new("GUARD_MODEL", model),
                EnvVar::new("GUARD_TEMP", GUARD_TEMPERATURE),
                EnvVar::new("GUARD_PROMPT_PREFIX", GUARD_PROMPT_PREFIX),
            ]);
        } else {
            variables.push(EnvVar::new("GUARD_ENABLED", "false"));
        }

        if self.toggles.safety_enabled {
            let safety = self.access(request, "safety", Some("safety")).await?;
            let model = self.model_for(&safety).await?;
            variables.extend([
                EnvVar::new("SAFETY_CHECK_ENABLED", "true"),
                EnvVar::new("SAFETY_CHECK_ENDPOINT_URL", safety.endpoint.as_str()),
                EnvVar::new("SAFETY_CHECK_ENDPOINT_TOKEN", safety.key.as_str()),
                EnvVar::new("SAFETY_CHECK_MODEL", model),
            ]);
        } else {
            variables.push(EnvVar::new("SAFETY_CHECK_ENABLED", "false"));
        }

        Ok(variables)
    }

    async fn docling_env(&self, request: &WorkspaceRequest) -> Result<Vec<EnvVar>, WorkspaceError> {
        let access = self
            .access(request, WorkbenchImage::Docling.primary_service(), None)
            .await?;
        Ok(vec![
            EnvVar::new("HOST", access.endpoint),
            EnvVar::new("AUTH_TOKEN", access.key),
        ])
    }

    /// Provision the key and resolve the endpoint of one service concurrently
    async fn access(
        &self,
        request: &WorkspaceRequest,
        service: &'static str,
        suffix: Option<&str>,
    ) -> Result<ServiceAccess, WorkspaceError> {
        let app_name = request.app_name(suffix);
        let (key, endpoint) = futures::try_join!(
            self.provisioner
                .resolve_or_create_application(&request.user_name, &app_name, service),
            self.provisioner.resolve_endpoint_for_service(service),
        )?;

        let key = key.ok_or_else(|| WorkspaceError::KeyUnavailable {
            service: service.to_string(),
        })?;
        let endpoint = match endpoint {
            EndpointOutcome::Endpoint(url) => url,
            EndpointOutcome::PlanNotFound => {
                return Err(WorkspaceError::EndpointUnavailable {
                    service: service.to_string(),
                })
            }
        };

        Ok(ServiceAccess {
            service,
            key,
            endpoint,
        })
    }

    async fn model_for(&self, access: &ServiceAccess) -> Result<String, WorkspaceError> {
        let auth = self.model_auth.for_service(access.service);
        Ok(self
            .catalog
            .first_model_id(&access.endpoint, &access.key, auth)
            .await?)
    }
}

/// OpenAI-style clients expect the base path to end in `/v1`
fn openai_base_path(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/v1") {
        base.to_string()
    } else {
        format!("{base}/v1")
    }
}
