//! Metrics, health, and tracing setup for the ingestion engine.

pub mod health;
pub mod metrics;
pub mod tracing_setup;

pub use health::{health, ComponentHealth, HealthReport, HealthRegistry, HealthStatus};
pub use metrics::{metrics, Counter, Ewma, Gauge, Histogram, Metrics, MetricsSnapshot};
pub use tracing_setup::{init_tracing, init_tracing_from_env, TracingConfig};
