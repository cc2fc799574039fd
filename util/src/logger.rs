//! Generic logger utility functions
//!
//! Log lines are prefixed with the seconds elapsed since the session epoch and
//! a coloured level tag, and are written both to stdout (optionally) and the
//! session's log file.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External imports
use colored::{ColoredString, Colorize};
use fern;
use log::{self, info};
use serde::Deserialize;
use thiserror::Error;

// Internal imports
use crate::session;

// Re-exports
pub use log::LevelFilter;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Configuration of the logger, usually loaded as part of an executable's
/// parameter file.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggerConfig {
    /// Minimum level recorded for all targets.
    pub min_level: LevelFilter,

    /// Per-target level overrides, for example to quieten a module which logs
    /// every cycle.
    #[serde(default)]
    pub target_levels: Vec<(String, LevelFilter)>,

    /// If true log lines are also echoed to stdout.
    #[serde(default = "default_stdout")]
    pub stdout: bool,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

/// Errors associated with initialising the logger.
#[derive(Debug, Error)]
pub enum LoggerInitError {
    #[error("Expected a log level of at least `INFO`, found `{0}`")]
    InvalidMinLogLevel(log::LevelFilter),

    #[error("Error initialising the log file: {0}")]
    LogFileInitError(std::io::Error),

    #[error("An error occured while setting up the logger: {0}")]
    FernInitError(log::SetLoggerError)
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            min_level: LevelFilter::Debug,
            target_levels: Vec::new(),
            stdout: true,
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Initialise the logger for this execution.
/// 
/// # Notes
/// 
/// - `config.min_level` must be at least as verbose as `log::Level::Info`.
/// 
/// # Safety
/// 
/// - This function must only be called once, a second call will fail as the
///   global logger is already set.
pub fn logger_init(
    config: &LoggerConfig,
    session: &session::Session
) -> Result<(), LoggerInitError> {

    if config.min_level < log::Level::Info {
        return Err(LoggerInitError::InvalidMinLogLevel(config.min_level))
    }

    let log_file = fern::log_file(session.log_file_path.clone())
        .map_err(LoggerInitError::LogFileInitError)?;

    let mut dispatch = fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{:10.6} {}] {}",
                session::get_elapsed_seconds(),
                level_to_str(record.level()),
                format_body(record, message)
            ))
        })
        .level(config.min_level);

    for (target, level) in config.target_levels.iter() {
        dispatch = dispatch.level_for(target.clone(), *level);
    }

    if config.stdout {
        dispatch = dispatch.chain(std::io::stdout());
    }

    dispatch
        .chain(log_file)
        .apply()
        .map_err(LoggerInitError::FernInitError)?;
    
    info!("Logging initialised");
    info!("    Session epoch: {}", session::get_epoch());
    info!("    Log level: {:?}", config.min_level);
    for (target, level) in config.target_levels.iter() {
        info!("    Log level for {}: {:?}", target, level);
    }
    info!("    Log file path: {:?}", session.log_file_path);

    Ok(())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn default_stdout() -> bool {
    true
}

/// Format the body of a record. Debug and trace records include the target so
/// that per-cycle output can be traced back to the emitting module.
fn format_body(record: &log::Record, message: &std::fmt::Arguments) -> String {
    if record.level() > log::Level::Info {
        format!("{}: {}", record.target(), message)
    }
    else {
        format!("{}", message)
    }
}

/// Get the string representation of a log level
fn level_to_str(level: log::Level) -> ColoredString {
    match level {
        log::Level::Trace => "TRC".dimmed().italic(),
        log::Level::Debug => "DBG".dimmed(),
        log::Level::Info  => "INF".normal(),
        log::Level::Warn  => "WRN".yellow(),
        log::Level::Error => "ERR".red().bold()
    }
}
