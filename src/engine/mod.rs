pub mod history;
pub mod naming;
pub mod selector;

use std::path::PathBuf;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

use crate::client::{ExportFormat, ScanSummary, ScannerApi};
use crate::config::Settings;
use crate::error::{ExportError, Result};
use crate::report::{ExportReport, ExportedScan};

use history::HistorySelector;

/// Drives one export run: list, select, then export each selected scan in turn.
///
/// The first failure ends the run. Reports already written stay on disk.
pub struct Exporter {
    host: String,
    identifier: String,
    history: HistorySelector,
    output_dir: PathBuf,
    format: ExportFormat,
    show_progress: bool,
}

impl Exporter {
    pub fn new(settings: &Settings) -> Self {
        Exporter {
            host: settings.host.clone(),
            identifier: settings.identifier.clone(),
            history: settings.history,
            output_dir: settings.output_dir.clone(),
            format: ExportFormat::Nessus,
            show_progress: false,
        }
    }

    /// Draw a progress bar on stderr while exporting
    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn run<C: ScannerApi + ?Sized>(&self, client: &C) -> Result<ExportReport> {
        let start = Instant::now();

        // Step 1: List and select
        info!("Listing scans on {}", self.host);
        let scans = client.list_scans()?;
        let scans_listed = scans.len();

        let selected = selector::select_scans(scans, &self.identifier);
        info!(
            "{} of {} scans are completed and start with '{}'",
            selected.len(),
            scans_listed,
            self.identifier
        );

        // Step 2: Export one by one
        let progress = self.progress_bar(selected.len() as u64);
        let mut exported = Vec::with_capacity(selected.len());

        for scan in &selected {
            progress.set_message(format!("Processing {}", scan.name));
            match self.export_one(client, scan) {
                Ok(done) => {
                    exported.push(done);
                    progress.inc(1);
                }
                Err(e) => {
                    progress.abandon();
                    return Err(e);
                }
            }
        }
        progress.finish_and_clear();

        let duration = start.elapsed();
        info!("Exported {} reports in {:.2}s", exported.len(), duration.as_secs_f64());

        Ok(ExportReport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Local::now().to_rfc3339(),
            host: self.host.clone(),
            identifier: self.identifier.clone(),
            history: self.history.index(),
            output_dir: self.output_dir.clone(),
            scans_listed,
            scans_selected: selected.len(),
            duration_ms: duration.as_millis() as u64,
            exported,
        })
    }

    fn export_one<C: ScannerApi + ?Sized>(&self, client: &C, scan: &ScanSummary) -> Result<ExportedScan> {
        let history = client
            .scan_history(scan.id)
            .map_err(|source| ExportError::RemoteFor {
                operation: "history lookup",
                scan: scan.name.clone(),
                source,
            })?;

        let entry = self.history.resolve(&scan.name, &history)?;
        let modified = naming::local_time(entry.last_modification_date).ok_or_else(|| {
            ExportError::InvalidTimestamp {
                scan: scan.name.clone(),
                timestamp: entry.last_modification_date,
            }
        })?;
        debug!(
            "Scan {} ('{}'): history {} of {} -> history_id {} (status {}, uuid {})",
            scan.id,
            scan.name,
            self.history,
            history.len(),
            entry.history_id,
            entry.status.as_deref().unwrap_or("unknown"),
            entry.uuid.as_deref().unwrap_or("-")
        );

        let path = naming::output_path(
            &self.output_dir,
            &scan.name,
            &naming::month_stamp(&modified),
            self.format,
        );

        let data = client
            .export_scan(scan.id, entry.history_id, self.format)
            .map_err(|source| ExportError::RemoteFor {
                operation: "export",
                scan: scan.name.clone(),
                source,
            })?;

        std::fs::write(&path, &data).map_err(|source| ExportError::Filesystem {
            path: path.clone(),
            source,
        })?;
        info!("Wrote {} ({} bytes)", path.display(), data.len());

        Ok(ExportedScan {
            scan_id: scan.id,
            scan_name: scan.name.clone(),
            history_id: entry.history_id,
            modified: modified.to_rfc3339(),
            path,
            bytes: data.len() as u64,
        })
    }

    fn progress_bar(&self, len: u64) -> ProgressBar {
        if !self.show_progress {
            return ProgressBar::hidden();
        }
        let pb = ProgressBar::new(len);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("█▓░"),
        );
        pb
    }
}
