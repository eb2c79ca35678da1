use crate::error::{BoardError, Result};
use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Environment variable that overrides the configured log filter.
pub const LOG_ENV: &str = "TASKBOARD_LOG";

pub const LOG_FILE: &str = "taskboard.log";

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(level))
}

/// Log to stderr. Used by the one-shot commands.
pub fn init_stderr(level: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .try_init();
}

/// Log to `<dir>/taskboard.log`. The terminal UI owns the screen, so it
/// cannot share stderr with the logger.
pub fn init_file(level: &str, dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|e| BoardError::io(dir, e))?;
    let path = dir.join(LOG_FILE);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| BoardError::io(&path, e))?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter(level))
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init();
    Ok(())
}
