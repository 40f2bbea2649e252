//! # Provisioning
//!
//! Idempotent find-or-create workflows over the gateway admin API.
//!
//! Every step distinguishes "not resolvable" from a real identifier: resolvers return
//! `Option` or a dedicated outcome enum, and only hard failures surface as
//! [`ProvisionError`]. The chain is safe to re-run on every workbench start; nothing is
//! cached between calls.
//!
//! - `account`: find-or-create account by username
//! - `plan`: service name to plan id through visible plan features
//! - `application`: find-or-create and find-and-delete applications
//! - `endpoint`: plan to proxy endpoint URL

mod account;
mod application;
mod endpoint;
mod plan;

use crate::config::GatewayConfig;
use crate::gateway::{AdminApi, GatewayError};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Hard provisioning failures
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// No plan carries a visible feature named after the service
    #[error("service '{service}' is not configured: no application plan exposes a visible '{service}' feature")]
    ServiceNotConfigured { service: String },
}

impl ProvisionError {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Gateway(e) => e.kind(),
            Self::ServiceNotConfigured { .. } => "service_not_configured",
        }
    }
}

/// Result of deleting an application by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletionOutcome {
    UserNotFound,
    ApplicationNotFound,
    Deleted,
}

impl DeletionOutcome {
    /// Status text returned to the console
    pub fn message(self) -> &'static str {
        match self {
            Self::UserNotFound => "user not found",
            Self::ApplicationNotFound => "Application not found",
            Self::Deleted => "Application deleted",
        }
    }
}

impl fmt::Display for DeletionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Result of resolving a service's public endpoint
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EndpointOutcome {
    Endpoint(String),
    /// The resolved plan id vanished from the plan list between the two lookups
    PlanNotFound,
}

impl EndpointOutcome {
    pub const PLAN_NOT_FOUND_MESSAGE: &'static str = "ApplicationPlan not found";

    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::Endpoint(url) => Some(url),
            Self::PlanNotFound => None,
        }
    }

    pub fn into_message(self) -> String {
        match self {
            Self::Endpoint(url) => url,
            Self::PlanNotFound => Self::PLAN_NOT_FOUND_MESSAGE.to_string(),
        }
    }
}

/// Runs the provisioning chain against an admin API
///
/// Stateless apart from the pinned plan table; cheap to clone and share across requests.
#[derive(Clone)]
pub struct Provisioner {
    api: Arc<dyn AdminApi>,
    pinned_plans: HashMap<String, String>,
}

impl fmt::Debug for Provisioner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provisioner")
            .field("pinned_plans", &self.pinned_plans)
            .finish_non_exhaustive()
    }
}

impl Provisioner {
    pub fn new(api: Arc<dyn AdminApi>, config: &GatewayConfig) -> Self {
        Self {
            api,
            pinned_plans: config.pinned_plans.clone(),
        }
    }
}
