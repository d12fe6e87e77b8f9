//! `ledgerx-recon`: internal ledger vs payment gateway reconciliation engine.
//!
//! Pure engine crate: receives pre-loaded records, returns a classified report.
//! The loaders in [`source`] and writers in [`export`] work on strings and
//! `io::Write`; opening files is left to the caller.

pub mod analysis;
pub mod classify;
pub mod config;
pub mod engine;
pub mod error;
pub mod export;
pub mod mapper;
pub mod matcher;
pub mod model;
pub mod normalize;
pub mod report;
pub mod schema;
pub mod source;
pub mod summary;

pub use config::ReconConfig;
pub use engine::run;
pub use error::{ReconError, RecordError};
pub use model::{Disposition, RawRecord, RawValue, ReconInput, Report, SourceBatch};
pub use schema::{Schema, SchemaRegistry};
