//! CLI command implementations

pub mod ingest;

pub use ingest::{IngestArgs, handle_ingest, handle_list_types};
