pub mod json;
pub mod summary;
pub mod terminal;

pub use summary::{ExportReport, ExportedScan};
