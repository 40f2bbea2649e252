//! # Gateway
//!
//! Adapter for the API-management gateway's XML admin API.
//!
//! - `client`: reqwest implementation of [`AdminApi`]
//! - `xml`: generic element tree and collection normalization
//! - `responses`: typed records narrowed from the tree
//! - `requests`: outbound payloads (account signup)
//! - `error`: [`GatewayError`], with 404 kept apart from hard failures

mod client;
mod error;
mod requests;
pub mod responses;
mod tracker;
pub mod xml;

pub use client::GatewayClient;
pub use error::GatewayError;
pub use requests::Signup;
pub use responses::{Account, Application, Feature, Plan, ServiceProxy};

use async_trait::async_trait;

/// Admin API operations used by the provisioning workflow
///
/// Implemented by [`GatewayClient`] against a real gateway and by in-memory fakes in tests.
/// A missing resource is reported as [`GatewayError::NotFound`].
#[async_trait]
pub trait AdminApi: Send + Sync {
    async fn find_account_by_username(&self, username: &str) -> Result<Account, GatewayError>;

    async fn create_account(&self, signup: &Signup) -> Result<Account, GatewayError>;

    async fn list_applications(&self, account_id: &str) -> Result<Vec<Application>, GatewayError>;

    async fn create_application(
        &self,
        account_id: &str,
        name: &str,
        plan_id: &str,
    ) -> Result<Application, GatewayError>;

    async fn delete_application(
        &self,
        account_id: &str,
        application_id: &str,
    ) -> Result<(), GatewayError>;

    async fn list_plans(&self) -> Result<Vec<Plan>, GatewayError>;

    async fn list_plan_features(&self, plan_id: &str) -> Result<Vec<Feature>, GatewayError>;

    async fn get_service_proxy(&self, service_id: &str) -> Result<ServiceProxy, GatewayError>;
}
