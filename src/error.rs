//! Error types for logger initialization

pub type Result<T> = std::result::Result<T, XlogError>;

/// Errors raised while building or installing the global logger.
///
/// These only occur on the setup path. Once initialized, the logging hot path
/// never propagates errors: a failed write or an unresolvable caller frame
/// degrades to best-effort output instead.
#[derive(Debug, thiserror::Error)]
pub enum XlogError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// A global subscriber has already been installed
    #[error("Global logger already initialized")]
    AlreadyInitialized,

    /// Installing the `log` facade bridge failed
    #[error("Failed to install log bridge: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

impl XlogError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        XlogError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        XlogError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }
}
