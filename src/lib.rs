//! Export completed Nessus scans to `.nessus` files.
//!
//! The run is a straight pipeline: list scans, keep the completed ones whose
//! name starts with an identifier, then for each one pick a historical run,
//! export it and write it to disk. Any failure ends the run.
//!
//! - `client` - the [`client::ScannerApi`] seam and the Nessus REST client
//! - `engine` - scan selection, history lookup, file naming and the export loop
//! - `config` - `.nessus-export.toml` and setting resolution
//! - `report` - run summary for the terminal or JSON
//! - `error` - error types

pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod report;

pub use error::{ExportError, RemoteError, Result};
