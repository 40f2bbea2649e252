//! MaaS Provisioner Library
//!
//! Provisions gateway accounts, applications and keys for AI workspaces, and exposes
//! the workflow over a REST API (`server`) and an operator CLI (`maasctl`).
//! Tests are included in the module files and under `tests/`.

pub mod config;
pub mod constants;
pub mod gateway;
pub mod models;
pub mod observability;
pub mod provisioning;
pub mod server;
pub mod workspace;

pub use config::AppConfig;
pub use gateway::{AdminApi, GatewayClient, GatewayError};
pub use provisioning::{DeletionOutcome, EndpointOutcome, ProvisionError, Provisioner};
