#![deny(missing_docs)]
//! Log setup for dati.
//!
//! The terminal client owns stdout for its view, so log lines go to a file
//! and, when asked for, to stderr. Every crate logs through the `dati_*`
//! macros rather than calling `log` directly.

use std::fs::{File, OpenOptions};
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Log file used by [`initialize`], relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "./dati.log";

/// Trace-level log line.
#[macro_export]
macro_rules! dati_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Debug-level log line.
#[macro_export]
macro_rules! dati_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Info-level log line.
#[macro_export]
macro_rules! dati_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Warn-level log line.
#[macro_export]
macro_rules! dati_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Error-level log line.
#[macro_export]
macro_rules! dati_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDestination {
    /// Appended to the log file.
    #[default]
    File,
    /// Stderr only.
    Terminal,
    /// Log file and stderr.
    Both,
}

impl LogDestination {
    fn to_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }

    fn to_stderr(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }
}

/// Installs the global logger, appending to [`DEFAULT_LOG_FILE`] when the
/// destination includes a file.
pub fn initialize(destination: LogDestination, level: LevelFilter) {
    initialize_with_file(destination, level, Path::new(DEFAULT_LOG_FILE));
}

/// Like [`initialize`], with an explicit log file. An unwritable file is
/// reported on stderr and skipped; a second initialization is ignored.
pub fn initialize_with_file(destination: LogDestination, level: LevelFilter, log_path: &Path) {
    let config = session_config();
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if destination.to_stderr() {
        loggers.push(stderr_logger(level, config.clone()));
    }
    if destination.to_file() {
        match open_log_file(log_path) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(err) => eprintln!("warning: cannot open log file {log_path:?}: {err}"),
        }
    }
    if loggers.is_empty() {
        return;
    }

    let _ = CombinedLogger::init(loggers);
}

/// Debug-level stderr logger for test binaries. Safe to call from every
/// test; only the first call installs it.
pub fn initialize_for_tests() {
    let _ = CombinedLogger::init(vec![stderr_logger(LevelFilter::Debug, Config::default())]);
}

fn session_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build()
}

fn stderr_logger(level: LevelFilter, config: Config) -> Box<TermLogger> {
    TermLogger::new(level, config, TerminalMode::Stderr, ColorChoice::Auto)
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn destinations_select_sinks() {
        assert!(LogDestination::File.to_file());
        assert!(!LogDestination::File.to_stderr());
        assert!(LogDestination::Terminal.to_stderr());
        assert!(!LogDestination::Terminal.to_file());
        assert!(LogDestination::Both.to_file() && LogDestination::Both.to_stderr());
    }

    #[test]
    fn file_destination_appends_to_existing_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("dati.log");
        std::fs::write(&path, "previous session\n").unwrap();

        initialize_with_file(LogDestination::File, LevelFilter::Info, &path);
        dati_info!("client ready");
        log::logger().flush();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.starts_with("previous session\n"), "{content}");
        assert!(content.contains("client ready"), "{content}");
    }
}
