//! Gateway client errors.

use super::xml::XmlError;
use thiserror::Error;

/// Failure talking to the gateway admin API
///
/// `NotFound` is the only recoverable variant: lookups treat it as "resource absent".
/// Everything else is a hard failure for the caller to propagate.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway {operation}: resource not found (HTTP 404)")]
    NotFound { operation: &'static str },

    #[error("gateway {operation} failed with HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    /// Connection, timeout or body read failure; the URL is stripped so the access token never leaks
    #[error("gateway {operation} transport error: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("gateway {operation} returned an unreadable document: {source}")]
    Xml {
        operation: &'static str,
        #[source]
        source: XmlError,
    },

    #[error("gateway {operation} returned an unexpected response: {reason}")]
    Malformed {
        operation: &'static str,
        reason: String,
    },

    #[error("failed to build gateway HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl GatewayError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub(crate) fn transport(operation: &'static str, source: reqwest::Error) -> Self {
        Self::Transport {
            operation,
            source: source.without_url(),
        }
    }

    pub(crate) fn malformed(operation: &'static str, reason: impl Into<String>) -> Self {
        Self::Malformed {
            operation,
            reason: reason.into(),
        }
    }

    /// Short label for metrics and structured error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::Status { .. } => "gateway_status",
            Self::Transport { .. } => "gateway_transport",
            Self::Xml { .. } | Self::Malformed { .. } => "gateway_malformed",
            Self::ClientBuild(_) => "gateway_client",
        }
    }
}
