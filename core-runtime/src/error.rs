use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A configuration value is missing or out of range.
    #[error("Configuration error: {0}")]
    Config(String),

    /// No implementation was injected for a required host capability.
    #[error("Capability missing: {capability} - {message}")]
    CapabilityMissing { capability: String, message: String },

    /// The global tracing subscriber could not be installed.
    #[error("Logging error: {0}")]
    Logging(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config(message.into())
    }

    /// Whether the host can fix this by changing what it passes in.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Config(_) | Error::CapabilityMissing { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
