use anyhow::Result;

use crate::report::summary::ExportReport;

/// Render an export report as pretty-printed JSON
pub fn render(report: &ExportReport) -> Result<String> {
    let json = serde_json::to_string_pretty(report)?;
    Ok(json)
}
