//! Human-readable sizes and timestamps for file tool output.

use std::time::SystemTime;

use chrono::{DateTime, Local};

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;

/// Format a byte count as B, KB or MB.
pub fn human_size(bytes: u64) -> String {
    if bytes < KB {
        format!("{bytes} B")
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

/// Format a modification time in local time, second precision.
pub fn timestamp(time: SystemTime) -> String {
    let local: DateTime<Local> = time.into();
    local.format("%Y-%m-%d %H:%M:%S").to_string()
}
