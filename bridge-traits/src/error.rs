use thiserror::Error;

/// Failure reported by a host capability (HTTP transport, filesystem, clock).
#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Bridge capability not available: {0}")]
    NotAvailable(String),

    #[error("Bridge operation failed: {0}")]
    OperationFailed(String),

    #[error("Bridge operation timed out: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// The target path or resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, BridgeError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
