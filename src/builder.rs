//! Logger construction and global installation
//!
//! [`Builder`] binds a [`LogConfig`] and a few call-site overrides, composes
//! one fmt layer per enabled sink on a `tracing_subscriber` registry, and
//! either hands the subscriber back ([`Builder::build`], useful for scoping
//! it in tests) or installs it process-wide ([`Builder::try_init`]).
//!
//! Installation happens once at startup. The configuration is immutable
//! afterwards; a second initialization attempt is an error, not a
//! reconfiguration. `try_init` also installs the [`log`] facade bridge so
//! both `tracing::` and `log::` macros reach the same sinks.

use crate::config::LogConfig;
use crate::error::{Result, XlogError};
use crate::format::EventFormatter;
use crate::timestamp::TimestampSource;
use crate::writer::{RollingFileWriter, SharedWriter};
use std::io;
use tracing::Subscriber;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{Layer, Registry};

type BoxedLayer = Box<dyn Layer<Registry> + Send + Sync>;

/// Configures and installs the console and file sinks.
///
/// # Examples
///
/// ```no_run
/// use xlog::{Builder, LogConfig};
///
/// let mut config = LogConfig::default();
/// config.directory = "/var/log/myapp".to_string();
/// config.file_name = "myapp.log".to_string();
///
/// Builder::new().with_config(config).try_init()?;
/// tracing::info!(port = 8080, "listening");
/// log::warn!("legacy facade reaches the same sinks");
/// # Ok::<(), xlog::XlogError>(())
/// ```
#[derive(Default)]
pub struct Builder {
    config: LogConfig,
    level: Option<LevelFilter>,
    timestamp: Option<TimestampSource>,
    extra_writers: Vec<SharedWriter>,
}

impl Builder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use the given configuration.
    #[must_use]
    pub fn with_config(mut self, config: LogConfig) -> Self {
        self.config = config;
        self
    }

    /// Override the configured verbosity.
    #[must_use]
    pub fn with_level(mut self, level: LevelFilter) -> Self {
        self.level = Some(level);
        self
    }

    /// Override the configured timestamp clock.
    #[must_use]
    pub fn with_timestamp_source(mut self, source: TimestampSource) -> Self {
        self.timestamp = Some(source);
        self
    }

    /// Fan events into an additional writer, alongside the console and file
    /// sinks. The writer receives the same encoding as the file sink.
    #[must_use]
    pub fn with_writer<W>(mut self, writer: W) -> Self
    where
        W: io::Write + Send + 'static,
    {
        self.extra_writers.push(SharedWriter::new(writer));
        self
    }

    /// Compose the subscriber without installing it.
    ///
    /// # Errors
    ///
    /// Returns an error for an invalid configuration or when the log file
    /// cannot be created.
    pub fn build(self) -> Result<impl Subscriber + Send + Sync> {
        let mut config = self.config;
        if let Some(source) = self.timestamp {
            config.timestamp = source;
        }
        config.validate()?;
        let level = match self.level {
            Some(level) => level,
            None => config.level_filter()?,
        };

        let mut layers: Vec<BoxedLayer> = Vec::new();
        if config.console {
            layers.push(
                fmt::layer::<Registry>()
                    .event_format(EventFormatter::console(&config))
                    .with_writer(io::stdout)
                    .boxed(),
            );
        }
        if config.file {
            let writer = RollingFileWriter::new(
                config.log_file_path(),
                config.max_size_mb,
                config.max_backups,
                config.max_age_days,
            )?;
            layers.push(
                fmt::layer::<Registry>()
                    .event_format(EventFormatter::file(&config))
                    .with_writer(move || writer.clone())
                    .boxed(),
            );
        }
        for writer in self.extra_writers {
            layers.push(
                fmt::layer::<Registry>()
                    .event_format(EventFormatter::file(&config))
                    .with_writer(move || writer.clone())
                    .boxed(),
            );
        }

        Ok(tracing_subscriber::registry().with(layers).with(level))
    }

    /// Build the subscriber and install it as the process-wide default,
    /// bridging the `log` facade into it.
    ///
    /// # Errors
    ///
    /// Returns [`XlogError::AlreadyInitialized`] when a global subscriber is
    /// already installed, and configuration or IO errors from [`Builder::build`].
    pub fn try_init(self) -> Result<()> {
        let config = self.config.clone();
        let subscriber = self.build()?;
        tracing::subscriber::set_global_default(subscriber)
            .map_err(|_| XlogError::AlreadyInitialized)?;
        tracing_log::LogTracer::init()?;

        tracing::trace!(
            console_logging = config.console,
            file_logging = config.file,
            json_output = config.json,
            log_directory = %config.directory,
            file_name = %config.file_name,
            max_size_mb = config.max_size_mb,
            max_backups = config.max_backups,
            max_age_days = config.max_age_days,
            "logging configured"
        );
        Ok(())
    }
}

/// Initialize the global logger from a configuration.
///
/// # Errors
///
/// See [`Builder::try_init`].
pub fn init(config: LogConfig) -> Result<()> {
    Builder::new().with_config(config).try_init()
}

/// Initialize the global logger with an environment preset.
///
/// The development preset logs at debug level as colored local-time text; the
/// production preset logs at info level as UTC JSON without colors. Both keep
/// a 10 MB file with 5 backups for 30 days.
///
/// # Errors
///
/// See [`Builder::try_init`].
pub fn init_simple(dev_env: bool) -> Result<()> {
    let mut config = LogConfig {
        max_backups: 5,
        max_age_days: 30,
        ..LogConfig::default()
    };
    if dev_env {
        config.level = "debug".to_string();
        config.json = false;
        config.timestamp = TimestampSource::Local;
    } else {
        config.level = "info".to_string();
        config.json = true;
        config.no_color = true;
    }
    Builder::new().with_config(config).try_init()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sinkless_config() -> LogConfig {
        LogConfig {
            console: false,
            file: false,
            ..LogConfig::default()
        }
    }

    #[test]
    fn test_build_with_no_sinks_succeeds() {
        let subscriber = Builder::new().with_config(sinkless_config()).build();
        assert!(subscriber.is_ok());
    }

    #[test]
    fn test_build_rejects_invalid_level() {
        let config = LogConfig {
            level: "loud".to_string(),
            ..sinkless_config()
        };
        assert!(Builder::new().with_config(config).build().is_err());
    }

    #[test]
    fn test_build_creates_the_log_file() {
        let dir = TempDir::new().expect("temp dir");
        let config = LogConfig {
            console: false,
            directory: dir.path().display().to_string(),
            ..LogConfig::default()
        };
        let path = config.log_file_path();
        let subscriber = Builder::new().with_config(config).build();
        assert!(subscriber.is_ok());
        assert!(path.exists());
    }

    #[test]
    fn test_level_override_beats_config() {
        // An unparsable config level is still rejected by validate, so use a
        // valid one and just check the override path compiles and builds.
        let subscriber = Builder::new()
            .with_config(sinkless_config())
            .with_level(LevelFilter::ERROR)
            .build();
        assert!(subscriber.is_ok());
    }
}
