//! End-to-end export runs against an in-memory scanner.
//!
//! These tests cover:
//! - Runs where nothing matches
//! - Abort on the first failed export
//! - History selection across several scans

use std::cell::RefCell;
use std::collections::HashMap;

use nessus_export::client::{ExportFormat, HistoryEntry, ScanSummary, ScannerApi};
use nessus_export::config::{Overrides, Settings};
use nessus_export::engine::Exporter;
use nessus_export::{ExportError, RemoteError};
use tempfile::TempDir;

// 2023-11-15 12:00:00 UTC and 2023-08-10 12:00:00 UTC
const NOV_2023: i64 = 1_700_049_600;
const AUG_2023: i64 = 1_691_668_800;

/// Scanner double that records every call and can fail one export.
#[derive(Default)]
struct InMemoryScanner {
    scans: Vec<ScanSummary>,
    histories: HashMap<u64, Vec<HistoryEntry>>,
    fail_export_of: Option<u64>,
    history_calls: RefCell<Vec<u64>>,
    export_calls: RefCell<Vec<(u64, u64)>>,
}

impl InMemoryScanner {
    fn with_scan(mut self, id: u64, name: &str, status: &str, history: &[(u64, i64)]) -> Self {
        self.scans.push(ScanSummary {
            id,
            name: name.to_string(),
            status: status.to_string(),
        });
        self.histories.insert(
            id,
            history
                .iter()
                .map(|&(history_id, modified)| HistoryEntry {
                    history_id,
                    last_modification_date: modified,
                    status: Some("completed".to_string()),
                    uuid: None,
                })
                .collect(),
        );
        self
    }
}

impl ScannerApi for InMemoryScanner {
    fn list_scans(&self) -> Result<Vec<ScanSummary>, RemoteError> {
        Ok(self.scans.clone())
    }

    fn scan_history(&self, scan_id: u64) -> Result<Vec<HistoryEntry>, RemoteError> {
        self.history_calls.borrow_mut().push(scan_id);
        Ok(self.histories.get(&scan_id).cloned().unwrap_or_default())
    }

    fn export_scan(
        &self,
        scan_id: u64,
        history_id: u64,
        format: ExportFormat,
    ) -> Result<Vec<u8>, RemoteError> {
        assert_eq!(format, ExportFormat::Nessus);
        self.export_calls.borrow_mut().push((scan_id, history_id));
        if self.fail_export_of == Some(scan_id) {
            return Err(RemoteError::Status {
                method: "POST",
                url: format!("https://localhost:8834/scans/{}/export", scan_id),
                status: 500,
                body: "internal error".to_string(),
            });
        }
        Ok(format!("report {} / {}", scan_id, history_id).into_bytes())
    }
}

fn settings(dir: &TempDir, identifier: &str, history: &str) -> Settings {
    Settings::resolve(
        Overrides {
            access_key: Some("access".to_string()),
            secret_key: Some("secret".to_string()),
            identifier: Some(identifier.to_string()),
            history: Some(history.to_string()),
            path: Some(dir.path().to_path_buf()),
            ..Overrides::default()
        },
        None,
    )
    .unwrap()
}

fn files_in(dir: &TempDir) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn no_matching_scans_exports_nothing() {
    let dir = TempDir::new().unwrap();
    let scanner = InMemoryScanner::default()
        .with_scan(1, "Other", "completed", &[(10, NOV_2023)])
        .with_scan(2, "SAS_KSB_Running", "running", &[(20, NOV_2023)]);

    let report = Exporter::new(&settings(&dir, "SAS_KSB", "1"))
        .run(&scanner)
        .unwrap();

    assert_eq!(report.scans_listed, 2);
    assert_eq!(report.scans_selected, 0);
    assert!(report.exported.is_empty());
    assert!(scanner.history_calls.borrow().is_empty());
    assert!(scanner.export_calls.borrow().is_empty());
    assert!(files_in(&dir).is_empty());
}

#[test]
fn empty_server_is_a_successful_run() {
    let dir = TempDir::new().unwrap();
    let scanner = InMemoryScanner::default();

    let report = Exporter::new(&settings(&dir, "SAS_KSB", "1"))
        .run(&scanner)
        .unwrap();

    assert_eq!(report.scans_listed, 0);
    assert!(report.exported.is_empty());
}

#[test]
fn failed_export_aborts_remaining_scans() {
    let dir = TempDir::new().unwrap();
    let mut scanner = InMemoryScanner::default()
        .with_scan(1, "SAS_KSB_A", "completed", &[(11, NOV_2023)])
        .with_scan(2, "SAS_KSB_B", "completed", &[(21, NOV_2023)])
        .with_scan(3, "SAS_KSB_C", "completed", &[(31, NOV_2023)]);
    scanner.fail_export_of = Some(2);

    let err = Exporter::new(&settings(&dir, "SAS_KSB", "1"))
        .run(&scanner)
        .unwrap_err();

    match err {
        ExportError::RemoteFor {
            operation, scan, ..
        } => {
            assert_eq!(operation, "export");
            assert_eq!(scan, "SAS_KSB_B");
        }
        other => panic!("unexpected error: {other}"),
    }

    assert_eq!(files_in(&dir), vec!["SAS_KSB_A-202311.nessus".to_string()]);
    assert_eq!(*scanner.export_calls.borrow(), vec![(1, 11), (2, 21)]);
    assert_eq!(*scanner.history_calls.borrow(), vec![1, 2]);
}

#[test]
fn history_index_picks_run_and_month_per_scan() {
    let dir = TempDir::new().unwrap();
    let scanner = InMemoryScanner::default()
        .with_scan(
            1,
            "SAS_KSB_Alpha",
            "completed",
            &[(100, AUG_2023), (101, AUG_2023), (102, NOV_2023)],
        )
        .with_scan(2, "SAS_KSB_Beta", "completed", &[(200, AUG_2023), (201, NOV_2023)]);

    let report = Exporter::new(&settings(&dir, "SAS_KSB", "-2"))
        .run(&scanner)
        .unwrap();

    assert_eq!(*scanner.export_calls.borrow(), vec![(1, 101), (2, 200)]);
    assert_eq!(
        files_in(&dir),
        vec![
            "SAS_KSB_Alpha-202308.nessus".to_string(),
            "SAS_KSB_Beta-202308.nessus".to_string(),
        ]
    );
    assert_eq!(report.history, 2);
    assert_eq!(
        std::fs::read(dir.path().join("SAS_KSB_Alpha-202308.nessus")).unwrap(),
        b"report 1 / 101".to_vec()
    );
}

#[test]
fn short_history_on_later_scan_keeps_earlier_files() {
    let dir = TempDir::new().unwrap();
    let scanner = InMemoryScanner::default()
        .with_scan(1, "SAS_KSB_Long", "completed", &[(10, AUG_2023), (11, NOV_2023)])
        .with_scan(2, "SAS_KSB_Short", "completed", &[(20, NOV_2023)]);

    let err = Exporter::new(&settings(&dir, "SAS_KSB", "2"))
        .run(&scanner)
        .unwrap_err();

    assert!(matches!(
        err,
        ExportError::InvalidHistorySelector { ref scan, requested: 2, available: 1 } if scan == "SAS_KSB_Short"
    ));
    assert_eq!(files_in(&dir), vec!["SAS_KSB_Long-202308.nessus".to_string()]);
    assert_eq!(*scanner.export_calls.borrow(), vec![(1, 10)]);
}
