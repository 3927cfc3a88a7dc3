//! Crate-level error types
//!
//! Errors that cross module boundaries. Per-viewer send failures have
//! their own type in [`crate::registry::RegistryError`] because they are
//! absorbed inside the broadcast loop and never reach callers.

/// Error type for bridge operations
#[derive(Debug)]
pub enum Error {
    /// I/O failure (binding or serving a listener)
    Io(std::io::Error),
    /// JSON serialization/deserialization failure
    Json(serde_json::Error),
    /// A submitted batch failed validation
    InvalidBatch(String),
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {}", e),
            Error::Json(e) => write!(f, "JSON error: {}", e),
            Error::InvalidBatch(reason) => write!(f, "Invalid batch: {}", reason),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            Error::Json(e) => Some(e),
            Error::InvalidBatch(_) => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}
