use crate::client::ScanSummary;

/// Completed scans whose name starts with `prefix`, in list order.
///
/// The match is case-sensitive and anchored at the start of the name.
/// An empty prefix matches every scan.
pub fn select_scans(scans: Vec<ScanSummary>, prefix: &str) -> Vec<ScanSummary> {
    scans
        .into_iter()
        .filter(|scan| scan.name.starts_with(prefix) && scan.is_completed())
        .collect()
}
