//! Logger configuration
//!
//! [`LogConfig`] is the full settings surface consumed from an external
//! configuration source. It is created once at process start, handed to
//! [`Builder`](crate::builder::Builder), and never mutated afterwards;
//! reconfiguring a running logger is not a supported operation.

use crate::caller::DEFAULT_CALLER_SKIP;
use crate::error::{Result, XlogError};
use crate::timestamp::TimestampSource;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

/// Settings for the console and rotating-file sinks.
///
/// Every field has a default, and deserialization fills missing fields from
/// those defaults, so partial settings files work:
///
/// ```
/// use xlog::LogConfig;
///
/// let config: LogConfig = serde_json::from_str(r#"{"level": "info", "file": false}"#).unwrap();
/// assert_eq!(config.level, "info");
/// assert!(!config.file);
/// assert!(config.console);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Minimum verbosity: `trace`, `debug`, `info`, `warn`, `error`, or `off`.
    pub level: String,

    /// Annotate events with their source location.
    pub caller: bool,
    /// Render the full source path instead of the trimmed one.
    pub full_caller: bool,
    /// Attach the resolved caller function name as a `caller_fn` field.
    ///
    /// Off by default: function-name resolution walks the stack on every
    /// event and its skip offset depends on the facade's call depth.
    pub caller_function: bool,
    /// Stack frames to skip when resolving `caller_fn`.
    pub caller_skip: usize,
    /// Trailing path segments kept when trimming source locations.
    pub path_segments: usize,

    /// Write to standard output.
    pub console: bool,
    /// Write to the rotating log file.
    pub file: bool,
    /// Encode file output as JSON rather than text.
    pub json: bool,

    /// Size in MB at which the log file is rolled. 0 disables size rollover.
    pub max_size_mb: u64,
    /// Rolled files to keep. 0 keeps all of them.
    pub max_backups: usize,
    /// Days to keep rolled files. 0 keeps them forever.
    pub max_age_days: u64,

    /// Directory for the log file. A leading `~` expands to the home directory.
    pub directory: String,
    /// Log file name inside `directory`.
    pub file_name: String,

    /// Disable ANSI colors on the console.
    pub no_color: bool,
    /// Clock used for timestamps.
    pub timestamp: TimestampSource,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            caller: true,
            full_caller: false,
            caller_function: false,
            caller_skip: DEFAULT_CALLER_SKIP,
            path_segments: 1,
            console: true,
            file: true,
            json: true,
            max_size_mb: 10,
            max_backups: 0,
            max_age_days: 0,
            directory: "~/tmp/xlog".to_string(),
            file_name: "xlog.log".to_string(),
            no_color: false,
            timestamp: TimestampSource::Utc,
        }
    }
}

impl LogConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the configured verbosity into a level filter.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` when the level string is not one of the
    /// recognized names.
    pub fn level_filter(&self) -> Result<LevelFilter> {
        self.level
            .parse::<LevelFilter>()
            .map_err(|_| XlogError::config("level", format!("unknown level '{}'", self.level)))
    }

    /// Full path of the log file, with `~` expanded.
    #[must_use]
    pub fn log_file_path(&self) -> PathBuf {
        expand_tilde(&self.directory).join(&self.file_name)
    }

    /// Check the configuration for inconsistencies.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfiguration` for an unparsable level, or for an
    /// enabled file sink with an empty directory or file name.
    pub fn validate(&self) -> Result<()> {
        self.level_filter()?;
        if self.file {
            if self.directory.is_empty() {
                return Err(XlogError::config("directory", "must not be empty"));
            }
            if self.file_name.is_empty() {
                return Err(XlogError::config("file_name", "must not be empty"));
            }
        }
        Ok(())
    }
}

/// Expand a leading `~` to the current user's home directory.
///
/// Paths without a tilde, and tildes that cannot be resolved, pass through
/// unchanged.
pub(crate) fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
