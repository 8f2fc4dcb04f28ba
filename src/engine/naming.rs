use std::path::{Path, PathBuf};

use chrono::{DateTime, Local, TimeZone};

use crate::client::ExportFormat;

/// Epoch seconds as local time. `None` when chrono cannot represent the value.
pub fn local_time(epoch_secs: i64) -> Option<DateTime<Local>> {
    DateTime::from_timestamp(epoch_secs, 0).map(|utc| utc.with_timezone(&Local))
}

/// `YYYYMM` stamp used in report file names
pub fn month_stamp<Tz: TimeZone>(time: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    time.format("%Y%m").to_string()
}

/// `<output_dir>/<scan name>-<YYYYMM>.<ext>`
pub fn output_path(output_dir: &Path, scan_name: &str, stamp: &str, format: ExportFormat) -> PathBuf {
    output_dir.join(format!("{}-{}.{}", scan_name, stamp, format.extension()))
}
