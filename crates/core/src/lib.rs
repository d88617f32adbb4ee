//! Core types, records, and error taxonomy for the AgroData ingestion engine.

pub mod category;
pub mod error;
pub mod issue;
pub mod limits;
pub mod records;
pub mod result;
pub mod source;

pub use category::DataCategory;
pub use error::{Error, ErrorClass, Result};
pub use issue::*;
pub use records::*;
pub use result::*;
pub use source::SourceConfig;
