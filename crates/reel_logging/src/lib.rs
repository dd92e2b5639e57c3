#![deny(missing_docs)]
//! Shared logging utilities for the FetchReel workspace.
//!
//! This crate provides the `reel_*` logging macros used across the codebase,
//! the `simplelog` setup used by the application binary, and a minimal test
//! initializer for the global logger.

use std::fs::File;
use std::io;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};

/// Default file written by [`LogDestination::File`] and [`LogDestination::Both`].
pub const LOG_FILE_NAME: &str = "fetch_reel.log";

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! reel_trace {
    ($($arg:tt)*) => {{
        log::trace!($($arg)*);
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! reel_debug {
    ($($arg:tt)*) => {{
        log::debug!($($arg)*);
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! reel_info {
    ($($arg:tt)*) => {{
        log::info!($($arg)*);
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! reel_warn {
    ($($arg:tt)*) => {{
        log::warn!($($arg)*);
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! reel_error {
    ($($arg:tt)*) => {{
        log::error!($($arg)*);
    }};
}

/// Destination for log output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogDestination {
    /// Write to the configured log file.
    File,
    /// Write to the terminal.
    #[default]
    Terminal,
    /// Write to both file and terminal.
    Both,
}

impl LogDestination {
    fn includes_terminal(self) -> bool {
        matches!(self, LogDestination::Terminal | LogDestination::Both)
    }

    fn includes_file(self) -> bool {
        matches!(self, LogDestination::File | LogDestination::Both)
    }
}

/// HTTP stack targets whose debug output drowns the dispatcher summary.
const NOISY_TARGETS: [&str; 3] = ["hyper", "h2", "rustls"];

/// Initializes the global logger, writing file output to `log_file`.
///
/// When the log file cannot be created the terminal logger is installed
/// instead and the error is returned, so the caller can report it once
/// logging works. A logger that was already installed is kept.
pub fn initialize(
    destination: LogDestination,
    level: LevelFilter,
    log_file: &Path,
) -> io::Result<()> {
    let config = build_config(level);
    let terminal =
        || TermLogger::new(level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto);

    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();
    if destination.includes_terminal() {
        loggers.push(terminal());
    }
    let mut file_error = None;
    if destination.includes_file() {
        match create_file_logger(level, config.clone(), log_file) {
            Ok(file_logger) => loggers.push(file_logger),
            Err(err) => {
                if loggers.is_empty() {
                    loggers.push(terminal());
                }
                file_error = Some(err);
            }
        }
    }

    let _ = CombinedLogger::init(loggers);
    match file_error {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Initializes a simple terminal logger for use in unit tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    let level = if cfg!(debug_assertions) {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )]);
}

fn build_config(level: LevelFilter) -> Config {
    let mut builder = ConfigBuilder::new();
    builder
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error);
    if level >= LevelFilter::Debug {
        for target in NOISY_TARGETS {
            builder.add_filter_ignore_str(target);
        }
    }
    builder.build()
}

fn create_file_logger(
    level: LevelFilter,
    config: Config,
    log_file: &Path,
) -> io::Result<Box<WriteLogger<File>>> {
    let file = File::create(log_file).map_err(|err| {
        io::Error::new(
            err.kind(),
            format!("could not create log file {}: {err}", log_file.display()),
        )
    })?;
    Ok(WriteLogger::new(level, config, file))
}
