//! File-backed tracing setup.
//!
//! Stdout is the meter display, so log lines never go to the terminal.

use crate::config::LogConfig;
use std::fs::{File, OpenOptions};
use std::io;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::{fmt, EnvFilter};

/// Owner read/write only
const LOG_MODE: u32 = 0o600;

static TELEMETRY_INIT: OnceLock<()> = OnceLock::new();

pub fn init(config: &LogConfig) {
    TELEMETRY_INIT.get_or_init(|| {
        let default_directive = if config.debug {
            "peakbar=debug"
        } else {
            "peakbar=info"
        };
        let env_filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(default_directive));

        let file = match open_log_file(&config.path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("[telemetry] cannot open {}: {err}", config.path.display());
                return;
            }
        };

        if let Err(err) = fmt()
            .with_env_filter(env_filter)
            .with_writer(Mutex::new(file))
            .with_ansi(false)
            .with_target(false)
            .compact()
            .try_init()
        {
            eprintln!("[telemetry] failed to initialise tracing subscriber: {err}");
        }
    });
}

/// Create the log exclusively, or truncate it in place if it already exists.
fn open_log_file(path: &Path) -> io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .mode(LOG_MODE)
        .open(path)
        .or_else(|_| OpenOptions::new().write(true).truncate(true).open(path))
}
