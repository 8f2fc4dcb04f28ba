use owo_colors::OwoColorize;

use crate::report::summary::ExportReport;

/// Render an export report to the terminal with colors
pub fn render(report: &ExportReport) {
    println!();
    println!(
        "{}  nessus-export v{} — {} of {} scans matched '{}' in {:.2}s",
        "📦".bold(),
        report.version,
        report.scans_selected,
        report.scans_listed,
        report.identifier,
        report.duration_ms as f64 / 1000.0
    );
    println!();

    if report.exported.is_empty() {
        println!(
            "  {}  No completed scans start with '{}'",
            "ℹ️".bold(),
            report.identifier
        );
        println!();
        return;
    }

    for scan in &report.exported {
        println!(
            "  {}  {}",
            "✅".bold(),
            scan.scan_name.bold()
        );
        println!(
            "           {} {}",
            "→".green(),
            scan.path.display().green()
        );
        println!(
            "           {}",
            format!(
                "scan {} · history {} · modified {} · {}",
                scan.scan_id,
                scan.history_id,
                scan.modified,
                human_bytes(scan.bytes)
            )
            .dimmed()
        );
        println!();
    }

    println!("{}", "━".repeat(60));
    println!(
        " Exported {} reports ({}) to {}",
        report.exported.len().to_string().bold(),
        human_bytes(report.total_bytes()),
        report.output_dir.display().bold()
    );
    println!("{}", "━".repeat(60));
    println!();
}

fn human_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KiB", "MiB", "GiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
