//! Display recent log entries from the application.

use crate::logging::{get_log_dir, rotated_log_files, LOG_FILE_NAME};
use anyhow::anyhow;
use std::fs;

const DEFAULT_LINES: usize = 50;

/// Prints the last lines of the newest log file.
///
/// # Errors
/// - If the log directory cannot be determined
/// - If the log file cannot be read
pub fn handle_logs() -> anyhow::Result<()> {
    let log_dir = get_log_dir()?;

    let Some(log_file) = rotated_log_files(&log_dir)?.into_iter().next() else {
        println!("No {LOG_FILE_NAME} files found in: {}", log_dir.display());
        println!("Run 'wavescope' or 'wavescope demo' to generate logs.");
        return Ok(());
    };

    let content =
        fs::read_to_string(&log_file).map_err(|e| anyhow!("Failed to read log file: {e}"))?;

    if content.is_empty() {
        println!("Log file is empty: {}", log_file.display());
        return Ok(());
    }

    let (total, tail) = last_lines(&content, DEFAULT_LINES);
    if tail.len() < total {
        println!("Showing last {} of {} lines:", tail.len(), total);
    } else {
        println!("Showing all {total} lines:");
    }
    println!("Full log file at: {}", log_file.display());
    println!();

    for line in tail {
        println!("{line}");
    }

    Ok(())
}

/// Total line count and the last `count` lines of `content`.
fn last_lines(content: &str, count: usize) -> (usize, Vec<&str>) {
    let lines: Vec<&str> = content.lines().collect();
    let total = lines.len();
    let start = total.saturating_sub(count);
    (total, lines[start..].to_vec())
}
