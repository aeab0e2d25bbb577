//! County-level vehicle sales: ingest raw CSV rows, clean and deduplicate
//! them, and produce summary, trend and ranking reports.
pub mod clean;
pub mod config;
pub mod error;
pub mod history;
pub mod ingest;
pub mod pipeline;
pub mod report;
pub mod store;

pub use error::PipelineError;
