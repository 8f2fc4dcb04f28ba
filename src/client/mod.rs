pub mod nessus;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::RemoteError;

pub use nessus::NessusClient;

/// A scan as returned by the scan list. Remote fields not named here are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub id: u64,
    pub name: String,
    pub status: String,
}

impl ScanSummary {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}

/// One historical run of a scan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub history_id: u64,

    /// Epoch seconds
    pub last_modification_date: i64,

    #[serde(default)]
    pub status: Option<String>,

    #[serde(default)]
    pub uuid: Option<String>,
}

/// Report formats the scanner can export
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Nessus,
}

impl ExportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Nessus => "nessus",
        }
    }

    /// File extension for exported reports, without the dot
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The operations an export run needs from the scanner service.
///
/// Calls are blocking and made strictly one after another.
pub trait ScannerApi {
    /// Every scan visible to the API keys
    fn list_scans(&self) -> Result<Vec<ScanSummary>, RemoteError>;

    /// History of a scan, oldest first
    fn scan_history(&self, scan_id: u64) -> Result<Vec<HistoryEntry>, RemoteError>;

    /// Export one historical run and return the finished file's bytes.
    /// Blocks until the service has prepared the export.
    fn export_scan(
        &self,
        scan_id: u64,
        history_id: u64,
        format: ExportFormat,
    ) -> Result<Vec<u8>, RemoteError>;
}

/// Nessus sends `null` instead of `[]` for empty collections
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}
