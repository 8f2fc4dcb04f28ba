use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// One report written to disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportedScan {
    pub scan_id: u64,

    pub scan_name: String,

    /// Historical run that was exported
    pub history_id: u64,

    /// Last modification of that run (RFC 3339, local time)
    pub modified: String,

    /// File the report was written to
    pub path: PathBuf,

    /// Size of the exported report
    pub bytes: u64,
}

/// Summary of a finished export run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportReport {
    /// Tool version
    pub version: String,

    /// When the run finished
    pub timestamp: String,

    pub host: String,

    /// Scan name prefix used for selection
    pub identifier: String,

    /// History index used for every scan
    pub history: u64,

    pub output_dir: PathBuf,

    /// Scans visible on the server
    pub scans_listed: usize,

    /// Scans that matched the prefix and were completed
    pub scans_selected: usize,

    /// Duration in milliseconds
    pub duration_ms: u64,

    /// Exported reports, in the order they were written
    pub exported: Vec<ExportedScan>,
}

impl ExportReport {
    pub fn total_bytes(&self) -> u64 {
        self.exported.iter().map(|e| e.bytes).sum()
    }
}
