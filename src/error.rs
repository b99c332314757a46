//! Error types for cache operations
//!
//! Most of these never reach the caller of the section manager: it converts
//! every failure into "use the defaults" at its boundary. The cache manager
//! and the storage backends return them as-is.

use thiserror::Error;

/// Main error type for cache and storage operations
#[derive(Error, Debug)]
pub enum CacheError {
    /// Key-value store failure (read, write or remove)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Filesystem failure in a file-backed store
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Query key pattern did not compile
    #[error("Invalid query pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Runtime section state broke one of its invariants
    #[error("Inconsistent section state: {0}")]
    InconsistentState(String),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for cache operations
pub type Result<T> = std::result::Result<T, CacheError>;

impl From<String> for CacheError {
    fn from(s: String) -> Self {
        CacheError::Other(s)
    }
}

impl From<&str> for CacheError {
    fn from(s: &str) -> Self {
        CacheError::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let error = CacheError::Storage("disk full".to_string());
        assert_eq!(error.to_string(), "Storage error: disk full");

        let error = CacheError::Config("BILREG_SECTION_TTL_MS is not a number".to_string());
        assert!(error.to_string().starts_with("Configuration error"));

        let error = CacheError::InconsistentState("hidden outside search".to_string());
        assert!(error.to_string().contains("hidden outside search"));
    }

    #[test]
    fn test_error_conversion() {
        let error: CacheError = "test error".into();
        assert!(matches!(error, CacheError::Other(_)));

        let error: CacheError = "test error".to_string().into();
        assert!(matches!(error, CacheError::Other(_)));

        let json_err = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let error: CacheError = json_err.into();
        assert!(matches!(error, CacheError::Serialization(_)));
    }
}
