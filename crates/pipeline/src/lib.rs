//! Ingestion pipeline: cache lookup → adapter fetch → two-stage
//! validation → cache write, per (source, operation, params) request.

pub mod adapter;
pub mod ingest;
pub mod key;
pub mod registry;

pub use adapter::SourceAdapter;
pub use ingest::{IngestRequest, IngestionPipeline, Params};
pub use key::cache_key;
pub use registry::SourceRegistry;
