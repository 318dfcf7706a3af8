//! Custom error types for time-series extraction

use std::fmt;
use std::io;

/// Broad classification of an extraction failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Wrong or malformed input object (stack, features, aggregation)
    Type,
    /// Invalid date ordering
    Range,
    /// Unparseable date
    Format,
    /// Unreadable spatial source
    Load,
    /// Filesystem failure
    Io,
    /// Anything else
    Other,
}

/// Extraction-specific error types
#[derive(Debug)]
pub enum ExtractError {
    /// I/O error
    IoError(io::Error),
    /// Input object is not what the extractor expects
    InvalidInput(String),
    /// Start date lies after end date
    InvalidDateRange(String, String),
    /// A date string could not be coerced
    InvalidDate(String),
    /// Spatial source could not be loaded
    LoadFailed(String, String),
    /// Generic error with message
    GenericError(String),
}

impl ExtractError {
    /// Classify this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::IoError(_) => ErrorKind::Io,
            ExtractError::InvalidInput(_) => ErrorKind::Type,
            ExtractError::InvalidDateRange(..) => ErrorKind::Range,
            ExtractError::InvalidDate(_) => ErrorKind::Format,
            ExtractError::LoadFailed(..) => ErrorKind::Load,
            ExtractError::GenericError(_) => ErrorKind::Other,
        }
    }
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::IoError(e) => write!(f, "I/O error: {}", e),
            ExtractError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            ExtractError::InvalidDateRange(start, end) => {
                write!(f, "Start date {} is after end date {}", start, end)
            },
            ExtractError::InvalidDate(value) => write!(f, "Unable to interpret '{}' as a date", value),
            ExtractError::LoadFailed(path, reason) => {
                write!(f, "Failed to load spatial features from {}: {}", path, reason)
            },
            ExtractError::GenericError(msg) => write!(f, "Extraction error: {}", msg),
        }
    }
}

impl std::error::Error for ExtractError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExtractError::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for ExtractError {
    fn from(error: io::Error) -> Self {
        ExtractError::IoError(error)
    }
}

impl From<String> for ExtractError {
    fn from(msg: String) -> Self {
        ExtractError::GenericError(msg)
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(error: serde_json::Error) -> Self {
        ExtractError::GenericError(format!("JSON error: {}", error))
    }
}

impl From<toml::de::Error> for ExtractError {
    fn from(error: toml::de::Error) -> Self {
        ExtractError::InvalidInput(format!("Invalid options: {}", error))
    }
}

impl From<csv::Error> for ExtractError {
    fn from(error: csv::Error) -> Self {
        ExtractError::GenericError(format!("CSV error: {}", error))
    }
}

/// Result type for extraction operations
pub type ExtractResult<T> = Result<T, ExtractError>;
