use std::fs::{self, File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::errors::CliError;
use crate::output::OutputMode;

fn env_filter(output: &OutputMode) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(output.log_level()))
}

/// Log to stderr for one-shot commands.
pub fn init_stderr(output: &OutputMode) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(output))
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Log to a file so the alternate screen is left alone.
pub fn init_file(output: &OutputMode, path: &Path) -> Result<(), CliError> {
    let file = open_session_log(path)?;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(output))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init();
    Ok(())
}

/// Each TUI session starts a fresh log.
fn open_session_log(path: &Path) -> Result<File, CliError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(path)?;
    Ok(file)
}
