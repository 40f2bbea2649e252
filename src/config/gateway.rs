//! Gateway admin API settings and per-service conventions.

use super::{parse_or_default, required, ConfigError};
use crate::constants::{DEFAULT_REQUEST_TIMEOUT_SECS, KNOWN_SERVICES};
use crate::models::ModelAuth;
use std::collections::HashMap;
use std::time::Duration;

/// Admin API location and credentials
///
/// The access token is deliberately kept out of `Debug` output.
#[derive(Clone)]
pub struct GatewayConfig {
    /// Base URL of the admin API, without trailing slash
    pub api_url: String,
    access_token: String,
    pub request_timeout_secs: u64,
    /// Service name -> plan id, from `MAAS_<SERVICE>_PLAN_ID`
    ///
    /// A pinned plan short-circuits feature-based plan discovery.
    pub pinned_plans: HashMap<String, String>,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_url", &self.api_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("pinned_plans", &self.pinned_plans)
            .finish_non_exhaustive()
    }
}

impl GatewayConfig {
    pub fn new(api_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into().trim_end_matches('/').to_string(),
            access_token: access_token.into(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            pinned_plans: HashMap::new(),
        }
    }

    pub(crate) fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::new(
            required(lookup, "MAAS_API_URL")?,
            required(lookup, "MAAS_API_KEY")?,
        );
        config.request_timeout_secs = parse_or_default(
            lookup,
            "MAAS_REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;

        for service in KNOWN_SERVICES {
            let key = format!("MAAS_{}_PLAN_ID", service.to_ascii_uppercase());
            if let Some(plan_id) = lookup(&key).map(|v| v.trim().to_string()) {
                if !plan_id.is_empty() {
                    config.pinned_plans.insert((*service).to_string(), plan_id);
                }
            }
        }

        Ok(config)
    }

    /// Shared credential appended to every admin API call
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// How each backend service expects its application key on model listing calls
///
/// The convention is fixed per service, never probed.
#[derive(Debug, Clone)]
pub struct ModelAuthTable {
    by_service: HashMap<String, ModelAuth>,
}

impl Default for ModelAuthTable {
    fn default() -> Self {
        let by_service = [
            ("anyllm", ModelAuth::Bearer),
            ("granite", ModelAuth::Bearer),
            ("code", ModelAuth::Bearer),
            ("guard", ModelAuth::Bearer),
            ("safety", ModelAuth::QueryKey),
        ]
        .into_iter()
        .map(|(service, auth)| (service.to_string(), auth))
        .collect();
        Self { by_service }
    }
}

impl ModelAuthTable {
    pub(crate) fn from_lookup<F>(lookup: &F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut table = Self::default();
        for service in KNOWN_SERVICES {
            let key = format!("MAAS_MODEL_AUTH_{}", service.to_ascii_uppercase());
            if let Some(raw) = lookup(&key) {
                let auth = raw
                    .trim()
                    .parse::<ModelAuth>()
                    .map_err(|reason| ConfigError::Invalid { var: key, reason })?;
                table.by_service.insert((*service).to_string(), auth);
            }
        }
        Ok(table)
    }

    /// Convention for a service; OpenAI-compatible bearer auth when unlisted
    pub fn for_service(&self, service_name: &str) -> ModelAuth {
        self.by_service
            .get(service_name)
            .copied()
            .unwrap_or(ModelAuth::Bearer)
    }
}
