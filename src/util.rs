use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};

pub const REPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn now_utc_string() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn report_timestamp(offset: FixedOffset) -> String {
    format_report_timestamp(Utc::now(), offset)
}

pub fn format_report_timestamp(ts: DateTime<Utc>, offset: FixedOffset) -> String {
    ts.with_timezone(&offset)
        .format(REPORT_TIMESTAMP_FORMAT)
        .to_string()
}

pub fn ensure_directory(path: &Path) -> Result<()> {
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}
