use std::fmt;

/// Custom error type for the visit-tracking service.
#[derive(Debug)]
pub enum CounterError {
    /// Backing-file read/write errors.
    StorageError(String),
    /// Record encode/decode errors.
    SerializationError(String),
    /// Configuration loading/parsing errors.
    ConfigError(String),
    /// HTTP server startup/runtime errors.
    ServerError(String),
    /// The counter was used before `CounterLifecycle::init` was called.
    NotInitialized,
    /// A bounded wait expired before the operation completed.
    TimeoutError(String),
    /// The background writer is gone; flush requests can no longer be queued.
    ChannelClosed,
}

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterError::StorageError(msg) => write!(f, "Storage error: {}", msg),
            CounterError::SerializationError(msg) => write!(f, "Serialization error: {}", msg),
            CounterError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            CounterError::ServerError(msg) => write!(f, "Server error: {}", msg),
            CounterError::NotInitialized => write!(
                f,
                "Visit counter used before initialization: call CounterLifecycle::init first"
            ),
            CounterError::TimeoutError(msg) => write!(f, "Timeout error: {}", msg),
            CounterError::ChannelClosed => write!(f, "Counter writer channel closed"),
        }
    }
}

impl std::error::Error for CounterError {}

impl From<std::io::Error> for CounterError {
    fn from(err: std::io::Error) -> Self {
        CounterError::StorageError(err.to_string())
    }
}

impl From<serde_json::Error> for CounterError {
    fn from(err: serde_json::Error) -> Self {
        CounterError::SerializationError(err.to_string())
    }
}

impl From<toml::de::Error> for CounterError {
    fn from(err: toml::de::Error) -> Self {
        CounterError::ConfigError(err.to_string())
    }
}
