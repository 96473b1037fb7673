//! Structured logging for wavescope using the tracing crate.
//!
//! Writes to a daily-rotated file under the XDG state directory. Nothing is
//! written to the terminal, which belongs to the TUI. Rotated files beyond
//! the most recent week are removed at startup.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

pub const LOG_FILE_NAME: &str = "wavescope.log";

/// Days of logs kept on startup; the appender rotates once a day.
const MAX_LOG_FILES: usize = 7;

/// Keeps the non-blocking writer alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes file logging.
///
/// Log level comes from `RUST_LOG`, defaulting to "info".
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> anyhow::Result<()> {
    let log_dir = get_log_dir()?;

    if let Err(e) = cleanup_old_logs(&log_dir, MAX_LOG_FILES) {
        eprintln!("Warning: Failed to cleanup old logs: {e}");
    }

    let file_appender = rolling::daily(&log_dir, LOG_FILE_NAME);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_thread_names(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging initialized. Log directory: {}", log_dir.display());
    Ok(())
}

/// Log directory: `$XDG_STATE_HOME/wavescope`, else `~/.local/state/wavescope`.
///
/// # Errors
/// - If home directory cannot be determined
/// - If log directory cannot be created
pub fn get_log_dir() -> anyhow::Result<PathBuf> {
    let log_dir = match std::env::var("XDG_STATE_HOME") {
        Ok(xdg_state) if !xdg_state.is_empty() => PathBuf::from(xdg_state).join("wavescope"),
        _ => {
            let home = dirs::home_dir()
                .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
            home.join(".local/state/wavescope")
        }
    };

    fs::create_dir_all(&log_dir)?;

    Ok(log_dir)
}

/// Rotated log files (`wavescope.log.YYYY-MM-DD`), newest first.
pub fn rotated_log_files(log_dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let prefix = format!("{LOG_FILE_NAME}.");

    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let file_name = path.file_name()?.to_string_lossy().into_owned();
            let date = file_name.strip_prefix(&prefix)?;
            if date.matches('-').count() != 2 {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| b.0.cmp(&a.0)));
    Ok(log_files.into_iter().map(|(path, _)| path).collect())
}

/// Removes rotated log files beyond the `keep` newest.
fn cleanup_old_logs(log_dir: &Path, keep: usize) -> anyhow::Result<()> {
    for path in rotated_log_files(log_dir)?.iter().skip(keep) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("wavescope-{name}-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_cleanup_keeps_newest_and_ignores_other_files() {
        let dir = scratch_dir("log-cleanup");
        for day in 1..=9 {
            fs::write(dir.join(format!("wavescope.log.2026-01-{day:02}")), "").unwrap();
        }
        fs::write(dir.join("notes.txt"), "").unwrap();

        cleanup_old_logs(&dir, 7).unwrap();

        assert_eq!(rotated_log_files(&dir).unwrap().len(), 7);
        assert!(dir.join("notes.txt").exists());
        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_rotated_files_need_a_date_suffix() {
        let dir = scratch_dir("log-names");
        fs::write(dir.join("wavescope.log.2026-01-01"), "").unwrap();
        fs::write(dir.join("wavescope.log.old"), "").unwrap();
        fs::write(dir.join("other.log.2026-01-01"), "").unwrap();

        let files = rotated_log_files(&dir).unwrap();
        assert_eq!(files, vec![dir.join("wavescope.log.2026-01-01")]);
        fs::remove_dir_all(&dir).ok();
    }
}
