use std::str::FromStr;

use serde::Serialize;

use crate::client::HistoryEntry;
use crate::error::{ExportError, Result};

/// Which historical run to export, counted back from the newest.
///
/// `1` is the newest run, `2` the one before it. The sign of the configured
/// value is dropped, so `-2` and `2` select the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HistorySelector(u64);

impl HistorySelector {
    pub fn new(index: i64) -> Self {
        HistorySelector(index.unsigned_abs())
    }

    pub fn index(&self) -> u64 {
        self.0
    }

    /// Pick the entry from a history ordered oldest to newest.
    pub fn resolve<'a>(&self, scan: &str, history: &'a [HistoryEntry]) -> Result<&'a HistoryEntry> {
        let out_of_range = || ExportError::InvalidHistorySelector {
            scan: scan.to_string(),
            requested: self.0,
            available: history.len(),
        };

        let back = usize::try_from(self.0).map_err(|_| out_of_range())?;
        if back == 0 || back > history.len() {
            return Err(out_of_range());
        }
        Ok(&history[history.len() - back])
    }
}

impl Default for HistorySelector {
    fn default() -> Self {
        HistorySelector(1)
    }
}

impl FromStr for HistorySelector {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<i64>()
            .map(HistorySelector::new)
            .map_err(|e| ExportError::Config(format!("invalid --history value '{}': {}", s, e)))
    }
}

impl std::fmt::Display for HistorySelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
