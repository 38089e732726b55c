//! Diagnostic logging setup.
//!
//! Verbosity comes from `CHATRELAY_LOG` (an `EnvFilter` directive such as
//! `debug` or `chatrelay::core=trace`) and defaults to `warn`.

use std::error::Error;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_ENV: &str = "CHATRELAY_LOG";
const DEFAULT_FILTER: &str = "warn";

/// Where diagnostics are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
    /// Nothing is written. Used when the window owns the terminal and no
    /// log file was given.
    Discard,
}

impl LogTarget {
    pub fn choose(log_file: Option<&Path>, owns_terminal: bool) -> Self {
        match log_file {
            Some(path) => LogTarget::File(path.to_path_buf()),
            None if owns_terminal => LogTarget::Discard,
            None => LogTarget::Stderr,
        }
    }
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_FILTER_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

fn open_log_file(path: &Path) -> Result<File, Box<dyn Error>> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|err| format!("Cannot open log file {}: {}", path.display(), err).into())
}

/// Install the global subscriber. Fails if one is already installed or the
/// log file cannot be opened.
pub fn init_tracing(target: &LogTarget) -> Result<(), Box<dyn Error>> {
    let builder = tracing_subscriber::fmt().with_env_filter(env_filter());

    let result = match target {
        LogTarget::Stderr => builder.with_writer(std::io::stderr).try_init(),
        LogTarget::File(path) => {
            let file = open_log_file(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
        }
        LogTarget::Discard => builder.with_writer(std::io::sink).try_init(),
    };

    result.map_err(|err| err as Box<dyn Error>)
}
