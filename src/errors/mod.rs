//! Error handling module for the extractor.
//!
//! Every failure is fatal for the run; the message is shown to the operator verbatim.

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const INVALID_TENANT: &str = "INVALID_TENANT";
    pub const NOT_MULTI_TENANT: &str = "NOT_MULTI_TENANT";
    pub const COLLISION_UNRESOLVED: &str = "COLLISION_UNRESOLVED";
    pub const EXPORT_FAILED: &str = "EXPORT_FAILED";
    pub const ARCHIVE_FAILED: &str = "ARCHIVE_FAILED";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const DATABASE_ERROR: &str = "DATABASE_ERROR";
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const PLATFORM_ERROR: &str = "PLATFORM_ERROR";
}

/// Extractor error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// The blog id does not name a known site
    InvalidTenant(String),
    /// The install is not running in multisite mode
    NotMultiTenant(String),
    /// A staged user table would overwrite the live global one
    CollisionUnresolved(String),
    /// The database dump is missing or empty
    ExportFailed(String),
    /// The archive is missing or empty
    ArchiveFailed(String),
    /// Missing or malformed configuration
    Config(String),
    /// Database error
    Database(String),
    /// Filesystem error
    Io(String),
    /// Malformed stored settings or identifiers
    Platform(String),
}

impl ExtractError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            ExtractError::InvalidTenant(_) => codes::INVALID_TENANT,
            ExtractError::NotMultiTenant(_) => codes::NOT_MULTI_TENANT,
            ExtractError::CollisionUnresolved(_) => codes::COLLISION_UNRESOLVED,
            ExtractError::ExportFailed(_) => codes::EXPORT_FAILED,
            ExtractError::ArchiveFailed(_) => codes::ARCHIVE_FAILED,
            ExtractError::Config(_) => codes::CONFIG_ERROR,
            ExtractError::Database(_) => codes::DATABASE_ERROR,
            ExtractError::Io(_) => codes::IO_ERROR,
            ExtractError::Platform(_) => codes::PLATFORM_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            ExtractError::InvalidTenant(msg)
            | ExtractError::NotMultiTenant(msg)
            | ExtractError::CollisionUnresolved(msg)
            | ExtractError::ExportFailed(msg)
            | ExtractError::ArchiveFailed(msg)
            | ExtractError::Config(msg)
            | ExtractError::Database(msg)
            | ExtractError::Io(msg)
            | ExtractError::Platform(msg) => msg,
        }
    }
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for ExtractError {}

impl From<sqlx::Error> for ExtractError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        ExtractError::Database(format!("Database error: {}", err))
    }
}

impl From<std::io::Error> for ExtractError {
    fn from(err: std::io::Error) -> Self {
        tracing::error!("I/O error: {:?}", err);
        ExtractError::Io(format!("I/O error: {}", err))
    }
}

impl From<serde_json::Error> for ExtractError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        ExtractError::Platform(format!("JSON error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_carries_code_and_message() {
        let err = ExtractError::InvalidTenant("Given blog id is invalid.".to_string());
        assert_eq!(err.error_code(), codes::INVALID_TENANT);
        assert_eq!(err.message(), "Given blog id is invalid.");
        assert_eq!(err.to_string(), "INVALID_TENANT: Given blog id is invalid.");
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: ExtractError = io.into();
        assert_eq!(err.error_code(), codes::IO_ERROR);
        assert!(err.message().contains("gone"));
    }
}
