//! Terminal + file logger.
//!
//! All messages of the crate go through the `log` macros. `init_logger` installs a
//! `simplelog::CombinedLogger` that writes every record to the terminal and, when a
//! file is configured, to that file as well. Terminal output can be switched off so
//! that only the file receives the log.
//!
//! ```rust, ignore
//! use RustedTrajectory::Utils::logger::{LoggerConfig, init_logger};
//! let config = LoggerConfig::new("info").unwrap().with_file_prefix("pendulum");
//! init_logger(config).unwrap();
//! log::info!("collocation started");
//! ```
use crate::errors::{CollocationError, Result};
use chrono::Local;
use log::info;
use simplelog::*;
use std::fs::File;
use std::path::PathBuf;

/// Logger settings. Construct with [`LoggerConfig::new`] and refine with the builder
/// methods.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub level: LevelFilter,
    pub log_to_console: bool,
    pub log_file: Option<PathBuf>,
}

/// Level filter from its name: debug, info, warn, error or off.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.trim().to_lowercase().as_str() {
        "debug" => Ok(LevelFilter::Debug),
        "info" => Ok(LevelFilter::Info),
        "warn" => Ok(LevelFilter::Warn),
        "error" => Ok(LevelFilter::Error),
        "off" | "none" => Ok(LevelFilter::Off),
        other => Err(CollocationError::Logger(format!(
            "loglevel must be debug, info, warn, error or off, got '{}'",
            other
        ))),
    }
}

/// `<prefix>_<yymmdd-HHMMSS>.log`
pub fn default_log_name(prefix: &str) -> String {
    let date_and_time = Local::now().format("%y%m%d-%H%M%S");
    format!("{}_{}.log", prefix, date_and_time)
}

impl LoggerConfig {
    /// Terminal only logger with the given level name.
    pub fn new(level: &str) -> Result<Self> {
        Ok(LoggerConfig {
            level: parse_level(level)?,
            log_to_console: true,
            log_file: None,
        })
    }

    pub fn with_log_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_file = Some(path.into());
        self
    }

    /// Log file named after `prefix` and the current date and time.
    pub fn with_file_prefix(self, prefix: &str) -> Self {
        self.with_log_file(default_log_name(prefix))
    }

    /// Keep only the file output.
    pub fn suppress_console(mut self) -> Self {
        self.log_to_console = false;
        self
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            level: LevelFilter::Info,
            log_to_console: true,
            log_file: None,
        }
    }
}

/// Installs the global logger.
///
/// Returns `Ok(true)` when the logger was installed and `Ok(false)` when a global
/// logger already exists (the previous one stays active) or when the configuration
/// has no output at all. A log file that cannot be created is an error.
pub fn init_logger(config: LoggerConfig) -> Result<bool> {
    let mut loggers: Vec<Box<dyn SharedLogger>> = Vec::new();

    if config.log_to_console {
        loggers.push(TermLogger::new(
            config.level,
            Config::default(),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        ));
    }

    if let Some(ref filename) = config.log_file {
        let file = File::create(filename).map_err(|e| {
            CollocationError::Logger(format!("cannot create {}: {}", filename.display(), e))
        })?;
        loggers.push(WriteLogger::new(config.level, Config::default(), file));
    }

    if loggers.is_empty() {
        return Ok(false);
    }
    match CombinedLogger::init(loggers) {
        Ok(()) => {
            info!("Program started with loglevel: {}", config.level);
            Ok(true)
        }
        Err(_) => Ok(false),
    }
}
