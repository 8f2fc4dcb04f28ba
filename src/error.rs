use std::path::PathBuf;

use thiserror::Error;

/// Failure talking to the Nessus service
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("could not build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("{method} {url} failed: {source}")]
    Transport {
        method: &'static str,
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} was rejected ({status}); check the access and secret keys")]
    Unauthorized {
        method: &'static str,
        url: String,
        status: u16,
    },

    #[error("{method} {url} returned HTTP {status}: {body}")]
    Status {
        method: &'static str,
        url: String,
        status: u16,
        body: String,
    },

    #[error("unexpected response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("the scanner reported export {file} of scan {scan_id} as failed")]
    ExportFailed { scan_id: u64, file: u64 },

    #[error("export {file} of scan {scan_id} was not ready after {waited_secs}s")]
    ExportTimeout {
        scan_id: u64,
        file: u64,
        waited_secs: u64,
    },
}

/// Top-level error for an export run
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("listing scans failed: {0}")]
    Remote(#[from] RemoteError),

    #[error("{operation} failed for scan '{scan}': {source}")]
    RemoteFor {
        operation: &'static str,
        scan: String,
        #[source]
        source: RemoteError,
    },

    #[error(
        "history index {requested} is out of range for scan '{scan}' ({available} history entries)"
    )]
    InvalidHistorySelector {
        scan: String,
        requested: u64,
        available: usize,
    },

    #[error("scan '{scan}' has an unrepresentable modification time {timestamp}")]
    InvalidTimestamp { scan: String, timestamp: i64 },

    #[error("failed to write {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ExportError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_error_names_scan_and_index() {
        let error = ExportError::InvalidHistorySelector {
            scan: "SAS_KSB_Alpha".to_string(),
            requested: 4,
            available: 3,
        };
        let message = error.to_string();
        assert!(message.contains("SAS_KSB_Alpha"));
        assert!(message.contains("history index 4"));
        assert!(message.contains("3 history entries"));
    }

    #[test]
    fn filesystem_error_includes_path() {
        let error = ExportError::Filesystem {
            path: PathBuf::from("/reports/SAS_KSB_Alpha-202311.nessus"),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(error
            .to_string()
            .contains("/reports/SAS_KSB_Alpha-202311.nessus"));
    }

    #[test]
    fn remote_error_for_scan_names_operation() {
        let error = ExportError::RemoteFor {
            operation: "export",
            scan: "SAS_KSB_Beta".to_string(),
            source: RemoteError::ExportTimeout {
                scan_id: 7,
                file: 42,
                waited_secs: 600,
            },
        };
        let message = error.to_string();
        assert!(message.starts_with("export failed for scan 'SAS_KSB_Beta'"));
        assert!(message.contains("not ready after 600s"));
    }
}
