//! Gateway admin API client
//!
//! Plain reqwest over rustls. Every call appends the shared access token, as a query
//! parameter on GET and as a form field on POST/DELETE, and returns an XML document.
//!
//! Status handling is uniform: 404 becomes [`GatewayError::NotFound`], any other non-2xx
//! becomes [`GatewayError::Status`] with a truncated body, and 2xx bodies go through the
//! XML tree before being narrowed by `responses`.

use super::requests::Signup;
use super::responses::{self, Account, Application, Feature, Plan, ServiceProxy};
use super::tracker::OperationTracker;
use super::xml::XmlNode;
use super::{AdminApi, GatewayError};
use crate::config::GatewayConfig;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use tracing::{debug, field, info_span, Instrument};

const ADMIN_API_PREFIX: &str = "admin/api";
const MAX_ERROR_BODY_CHARS: usize = 512;

/// Gateway admin API client
#[derive(Clone)]
pub struct GatewayClient {
    http_client: Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for GatewayClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GatewayClient {
    /// Create a client for the configured admin API
    ///
    /// # Errors
    /// Returns an error if the HTTP client cannot be built
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(GatewayError::ClientBuild)?;

        Ok(Self {
            http_client,
            base_url: config.api_url.clone(),
            access_token: config.access_token().to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{ADMIN_API_PREFIX}/{path}", self.base_url)
    }

    fn get(&self, path: &str) -> RequestBuilder {
        self.http_client
            .get(self.url(path))
            .query(&[("access_token", self.access_token.as_str())])
    }

    /// Send a request inside an operation span and return the 2xx body
    async fn execute(
        &self,
        operation: &'static str,
        request: RequestBuilder,
    ) -> Result<String, GatewayError> {
        let span = info_span!(
            "maas.gateway",
            operation = operation,
            operation.success = field::Empty,
            operation.duration_ms = field::Empty,
            error.message = field::Empty,
        );
        let tracker = OperationTracker::new(operation, span.clone());

        async move {
            let result = send(operation, request).await;
            match &result {
                Ok(_) => tracker.record_success(),
                Err(e) if e.is_not_found() => tracker.record_not_found(),
                Err(e) => tracker.record_error(e.kind(), &e.to_string()),
            }
            result
        }
        .instrument(span)
        .await
    }
}

async fn send(operation: &'static str, request: RequestBuilder) -> Result<String, GatewayError> {
    let response = request
        .send()
        .await
        .map_err(|e| GatewayError::transport(operation, e))?;
    let status = response.status();

    if status == StatusCode::NOT_FOUND {
        debug!("Gateway {} returned 404", operation);
        return Err(GatewayError::NotFound { operation });
    }

    let body = response
        .text()
        .await
        .map_err(|e| GatewayError::transport(operation, e))?;

    if !status.is_success() {
        return Err(GatewayError::Status {
            operation,
            status: status.as_u16(),
            body: truncate(&body),
        });
    }

    Ok(body)
}

fn truncate(body: &str) -> String {
    let trimmed = body.trim();
    match trimmed.char_indices().nth(MAX_ERROR_BODY_CHARS) {
        Some((cut, _)) => format!("{}...", &trimmed[..cut]),
        None => trimmed.to_string(),
    }
}

fn document(operation: &'static str, body: &str) -> Result<XmlNode, GatewayError> {
    XmlNode::parse(body).map_err(|source| GatewayError::Xml { operation, source })
}

fn optional_document(operation: &'static str, body: &str) -> Result<Option<XmlNode>, GatewayError> {
    XmlNode::parse_optional(body).map_err(|source| GatewayError::Xml { operation, source })
}

#[async_trait]
impl AdminApi for GatewayClient {
    async fn find_account_by_username(&self, username: &str) -> Result<Account, GatewayError> {
        const OP: &str = "find_account";
        let request = self
            .get("accounts/find.xml")
            .query(&[("username", username)]);
        let body = self.execute(OP, request).await?;
        responses::decode_found_account(OP, &document(OP, &body)?)
    }

    async fn create_account(&self, signup: &Signup) -> Result<Account, GatewayError> {
        const OP: &str = "create_account";
        let mut form = vec![("access_token", self.access_token.as_str())];
        form.extend(signup.form_fields());
        let request = self.http_client.post(self.url("signup.xml")).form(&form);
        let body = self.execute(OP, request).await?;
        responses::decode_signup_account(OP, &document(OP, &body)?)
    }

    async fn list_applications(&self, account_id: &str) -> Result<Vec<Application>, GatewayError> {
        const OP: &str = "list_applications";
        let request = self.get(&format!("accounts/{account_id}/applications.xml"));
        let body = self.execute(OP, request).await?;
        responses::decode_applications(OP, optional_document(OP, &body)?.as_ref())
    }

    async fn create_application(
        &self,
        account_id: &str,
        name: &str,
        plan_id: &str,
    ) -> Result<Application, GatewayError> {
        const OP: &str = "create_application";
        let form = [
            ("access_token", self.access_token.as_str()),
            ("name", name),
            ("plan_id", plan_id),
        ];
        let request = self
            .http_client
            .post(self.url(&format!("accounts/{account_id}/applications.xml")))
            .form(&form);
        let body = self.execute(OP, request).await?;
        responses::decode_application(OP, &document(OP, &body)?)
    }

    async fn delete_application(
        &self,
        account_id: &str,
        application_id: &str,
    ) -> Result<(), GatewayError> {
        const OP: &str = "delete_application";
        let request = self
            .http_client
            .delete(self.url(&format!(
                "accounts/{account_id}/applications/{application_id}.xml"
            )))
            .form(&[("access_token", self.access_token.as_str())]);
        self.execute(OP, request).await?;
        Ok(())
    }

    async fn list_plans(&self) -> Result<Vec<Plan>, GatewayError> {
        const OP: &str = "list_plans";
        let body = self.execute(OP, self.get("application_plans.xml")).await?;
        responses::decode_plans(OP, optional_document(OP, &body)?.as_ref())
    }

    async fn list_plan_features(&self, plan_id: &str) -> Result<Vec<Feature>, GatewayError> {
        const OP: &str = "list_plan_features";
        let request = self.get(&format!("application_plans/{plan_id}/features.xml"));
        let body = self.execute(OP, request).await?;
        responses::decode_features(OP, optional_document(OP, &body)?.as_ref())
    }

    async fn get_service_proxy(&self, service_id: &str) -> Result<ServiceProxy, GatewayError> {
        const OP: &str = "get_service_proxy";
        let request = self.get(&format!("services/{service_id}/proxy.xml"));
        let body = self.execute(OP, request).await?;
        responses::decode_service_proxy(OP, &document(OP, &body)?)
    }
}
