//! # Observability
//!
//! - `logging`: tracing subscriber setup (text or JSON)
//! - `metrics`: Prometheus metrics collection

pub mod logging;
pub mod metrics;

pub use logging::init_tracing;
