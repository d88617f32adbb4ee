//! Service facade: one owner for the registry, cache, pipeline, and
//! scheduler, with an explicit start/stop lifecycle.

pub mod config;
pub mod service;

pub use config::ServiceConfig;
pub use service::IngestionService;
