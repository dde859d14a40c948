//! API layer
//!
//! HTTP handlers for:
//! - Profile pages
//! - Metrics (Prometheus)

pub mod metrics;
pub mod pages;
mod profile;

pub use metrics::metrics_router;
pub use profile::profile_router;
