//! Models module
//!
//! Defines the value objects that flow through the ingestion pipeline:
//! data type mappings, canonical records, ingestion requests and results.

pub mod mapping;
pub mod record;
pub mod request;
pub mod result;

pub use mapping::DataTypeMapping;
pub use record::CanonicalRecord;
pub use request::{FileFormat, IngestionMode, IngestionRequest};
pub use result::{IngestionResult, IngestionStatus, RowCountSource};
