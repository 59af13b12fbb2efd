//! # xlog
//!
//! Convenience initializers that wire the [`tracing`] backend and the
//! [`log`] facade to console and rotating-file sinks.
//!
//! ## Features
//!
//! - **Two sinks, one call**: colored human-readable console output and a
//!   size/age/count-bounded rotating log file, JSON or text encoded
//! - **Caller attribution**: events annotated with a trimmed `file:line`
//!   location and, optionally, the resolved caller function name
//! - **Both macro families**: `log::` records are bridged into the same
//!   sinks as `tracing::` events
//! - **Set once**: configuration is bound at startup and immutable for the
//!   life of the process
//!
//! ## Quick start
//!
//! ```no_run
//! use xlog::LogConfig;
//!
//! let mut config = LogConfig::default();
//! config.level = "info".to_string();
//! config.directory = "/var/log/myapp".to_string();
//! xlog::init(config)?;
//!
//! tracing::info!(user = "alice", "login accepted");
//! # Ok::<(), xlog::XlogError>(())
//! ```

pub mod builder;
pub mod caller;
pub mod config;
pub mod error;
pub mod format;
pub mod timestamp;
pub mod writer;

pub mod prelude {
    pub use crate::builder::{init, init_simple, Builder};
    pub use crate::caller::{
        resolve_caller, short_function_name, trim_location, ResolvedCaller, DEFAULT_CALLER_SKIP,
    };
    pub use crate::config::LogConfig;
    pub use crate::error::{Result, XlogError};
    pub use crate::format::{EventFormatter, OutputFormat};
    pub use crate::timestamp::{TimestampFormat, TimestampSource};
    pub use crate::writer::{BufferWriter, RollingFileWriter, SharedWriter};
}

pub use builder::{init, init_simple, Builder};
pub use caller::{
    resolve_caller, short_function_name, trim_location, ResolvedCaller, DEFAULT_CALLER_SKIP,
};
pub use config::LogConfig;
pub use error::{Result, XlogError};
pub use format::{EventFormatter, OutputFormat};
pub use timestamp::{TimestampFormat, TimestampSource};
pub use writer::{BufferWriter, RollingFileWriter, SharedWriter};
