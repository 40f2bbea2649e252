//! # Constants
//!
//! Shared constants used throughout the service.
//!
//! These values represent reasonable defaults and can be overridden via
//! environment variables where applicable.

/// Default HTTP port for the MaaS API, metrics and health probes
pub const DEFAULT_SERVER_PORT: u16 = 8080;

/// Default timeout applied to every outbound gateway and model catalog request (seconds)
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Prefix under which the MaaS routes are mounted
pub const API_BASE_PATH: &str = "/api/maas";

/// Wire value meaning "not found / not resolvable"
pub const NOT_FOUND_SENTINEL: &str = "-1";

/// Length of the throwaway numeric password sent on account signup
pub const SIGNUP_PASSWORD_LENGTH: usize = 16;

/// Vector database used when `VECTOR_DB` is not set
pub const DEFAULT_VECTOR_DB: &str = "lancedb";

/// Prefix for application names created for workbenches
pub const WORKBENCH_APP_PREFIX: &str = "parasol";

/// Query parameter carrying the application key for query-key authenticated services
pub const USER_KEY_PARAM: &str = "user_key";

/// Services the console knows how to provision
pub const KNOWN_SERVICES: &[&str] = &[
    "anyllm", "granite", "code", "sdxl", "docling", "guard", "safety",
];

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "maas_provisioner=info,tower_http=info";
