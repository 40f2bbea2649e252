//! Settings surfaced to workspaces: vector database and guard/safety toggles.

use super::bool_or_default;
use crate::constants::DEFAULT_VECTOR_DB;
use serde::ser::{Serialize, SerializeMap, Serializer};

/// Vector database selection handed to workspaces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorDbConfig {
    /// Backend name as configured, e.g. `weaviate`
    pub backend: String,
    /// Endpoint read from `<BACKEND>_ENDPOINT`
    pub endpoint: Option<String>,
}

impl Default for VectorDbConfig {
    fn default() -> Self {
        Self {
            backend: DEFAULT_VECTOR_DB.to_string(),
            endpoint: None,
        }
    }
}

impl VectorDbConfig {
    pub fn new(backend: impl Into<String>, endpoint: Option<String>) -> Self {
        Self {
            backend: backend.into(),
            endpoint,
        }
    }

    pub(crate) fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let backend = lookup("VECTOR_DB")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_VECTOR_DB.to_string());
        let endpoint = lookup(&endpoint_key(&backend))
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        Self { backend, endpoint }
    }

    /// Environment key the endpoint is published under, e.g. `WEAVIATE_ENDPOINT`
    pub fn endpoint_key(&self) -> String {
        endpoint_key(&self.backend)
    }

    /// JSON-encoded configuration returned by `/get-vectordb-configuration`
    ///
    /// # Errors
    /// Returns an error if serialization fails
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

fn endpoint_key(backend: &str) -> String {
    let normalized: String = backend
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    format!("{normalized}_ENDPOINT")
}

// `VECTOR_DB` always comes first, so a map type that sorts keys cannot be used.
impl Serialize for VectorDbConfig {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.endpoint.is_some() { 2 } else { 1 };
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("VECTOR_DB", &self.backend)?;
        if let Some(endpoint) = &self.endpoint {
            map.serialize_entry(&self.endpoint_key(), endpoint)?;
        }
        map.end()
    }
}

/// Optional image-generation companions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FeatureToggles {
    pub guard_enabled: bool,
    pub safety_enabled: bool,
}

impl FeatureToggles {
    pub(crate) fn from_lookup<F>(lookup: &F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            guard_enabled: bool_or_default(lookup, "GUARD_ENABLED", false),
            safety_enabled: bool_or_default(lookup, "SAFETY_ENABLED", false),
        }
    }
}
