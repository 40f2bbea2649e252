//! # Model catalog
//!
//! Resolves the model name served behind an endpoint by asking its OpenAI-compatible
//! `/v1/models` listing for the first advertised id.
//!
//! Backends disagree on how the application key is passed. The convention is chosen per
//! service through [`crate::config::ModelAuthTable`] and never probed at runtime.

use crate::constants::USER_KEY_PARAM;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info_span, Instrument};

/// How the application key is presented to a model endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelAuth {
    /// `Authorization: Bearer <key>`
    Bearer,
    /// `?user_key=<key>`
    QueryKey,
}

impl FromStr for ModelAuth {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "query" | "query-key" | "user_key" => Ok(Self::QueryKey),
            other => Err(format!(
                "unknown model auth convention '{other}' (expected bearer or query)"
            )),
        }
    }
}

impl fmt::Display for ModelAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer => f.write_str("bearer"),
            Self::QueryKey => f.write_str("query"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ModelCatalogError {
    #[error("failed to build model catalog HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),

    /// The URL is stripped so a query-string key never leaks
    #[error("model listing request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("model listing returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model listing body is not a valid model list: {0}")]
    Decode(#[source] serde_json::Error),

    #[error("endpoint {endpoint} advertises no models")]
    EmptyModelList { endpoint: String },
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    data: Vec<ModelEntry>,
}

#[derive(Debug, Deserialize)]
struct ModelEntry {
    id: String,
}

/// Client for model listing calls
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    http_client: Client,
}

impl ModelCatalog {
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(timeout: Duration) -> Result<Self, ModelCatalogError> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(ModelCatalogError::ClientBuild)?;
        Ok(Self { http_client })
    }

    /// First model id advertised by `endpoint`
    ///
    /// Single attempt, no retry.
    ///
    /// # Errors
    /// Returns an error on transport failure, non-2xx status, an undecodable body or an
    /// empty model list
    pub async fn first_model_id(
        &self,
        endpoint: &str,
        key: &str,
        auth: ModelAuth,
    ) -> Result<String, ModelCatalogError> {
        let span = info_span!("maas.models.list", endpoint = %endpoint, auth = %auth);
        self.fetch_first_model(endpoint, key, auth)
            .instrument(span)
            .await
    }

    async fn fetch_first_model(
        &self,
        endpoint: &str,
        key: &str,
        auth: ModelAuth,
    ) -> Result<String, ModelCatalogError> {
        let url = models_url(endpoint);
        let request = match auth {
            ModelAuth::Bearer => self.http_client.get(&url).bearer_auth(key),
            ModelAuth::QueryKey => self.http_client.get(&url).query(&[(USER_KEY_PARAM, key)]),
        };

        let response = request
            .send()
            .await
            .map_err(|e| ModelCatalogError::Transport(e.without_url()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ModelCatalogError::Transport(e.without_url()))?;

        if !status.is_success() {
            return Err(ModelCatalogError::Status {
                status: status.as_u16(),
                body: body.trim().chars().take(512).collect(),
            });
        }

        let list: ModelList = serde_json::from_str(&body).map_err(ModelCatalogError::Decode)?;
        let model = list
            .data
            .into_iter()
            .next()
            .map(|entry| entry.id)
            .ok_or_else(|| ModelCatalogError::EmptyModelList {
                endpoint: endpoint.to_string(),
            })?;
        debug!(model = %model, "Resolved model name");
        Ok(model)
    }
}

/// `<endpoint>/v1/models`, or `<endpoint>/models` when the endpoint already ends in `/v1`
pub fn models_url(endpoint: &str) -> String {
    let base = endpoint.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{base}/models")
    } else {
        format!("{base}/v1/models")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn catalog() -> ModelCatalog {
        ModelCatalog::new(Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_models_url() {
        assert_eq!(models_url("https://granite.example"), "https://granite.example/v1/models");
        assert_eq!(models_url("https://granite.example/"), "https://granite.example/v1/models");
        assert_eq!(models_url("https://granite.example/v1"), "https://granite.example/v1/models");
    }

    #[test]
    fn test_model_auth_parsing() {
        assert_eq!("Bearer".parse::<ModelAuth>().unwrap(), ModelAuth::Bearer);
        assert_eq!("query".parse::<ModelAuth>().unwrap(), ModelAuth::QueryKey);
        assert!("basic".parse::<ModelAuth>().is_err());
        assert_eq!(ModelAuth::QueryKey.to_string(), "query");
    }

    #[tokio::test]
    async fn bearer_auth_returns_first_model() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(header("authorization", "Bearer app-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "object": "list",
                "data": [{"id": "granite-3-8b-instruct"}, {"id": "other"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let model = catalog()
            .first_model_id(&server.uri(), "app-key", ModelAuth::Bearer)
            .await
            .unwrap();
        assert_eq!(model, "granite-3-8b-instruct");
    }

    #[tokio::test]
    async fn query_key_auth_sends_user_key_parameter() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .and(query_param("user_key", "app-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": [{"id": "granite-guardian"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let endpoint = format!("{}/v1", server.uri());
        let model = catalog()
            .first_model_id(&endpoint, "app-key", ModelAuth::QueryKey)
            .await
            .unwrap();
        assert_eq!(model, "granite-guardian");
    }

    #[tokio::test]
    async fn empty_model_list_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
            .mount(&server)
            .await;

        let err = catalog()
            .first_model_id(&server.uri(), "k", ModelAuth::Bearer)
            .await
            .unwrap_err();
        assert!(matches!(err, ModelCatalogError::EmptyModelList { .. }));
    }

    #[tokio::test]
    async fn unauthorized_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/models"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .expect(1)
            .mount(&server)
            .await;

        let err = catalog()
            .first_model_id(&server.uri(), "k", ModelAuth::QueryKey)
            .await
            .unwrap_err();
        match err {
            ModelCatalogError::Status { status, body } => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
