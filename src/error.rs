//! Unified error hierarchy for FocoTotal
//!
//! Malformed workout data never surfaces here: weights and reps that fail to
//! parse are counted as zero. Errors are reserved for broken preconditions
//! and storage failures.

use thiserror::Error;

/// Top-level error type for all FocoTotal operations
#[derive(Debug, Error)]
pub enum FocoError {
    /// Gamification engine errors
    #[error("Gamification error: {0}")]
    Gamification(#[from] GamificationError),

    /// Storage collaborator errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] crate::export::ExportError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Precondition failures inside the engine
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GamificationError {
    /// Engine invoked on inputs that cannot describe a real user
    #[error("Invalid state: {reason}")]
    InvalidState { reason: String },

    /// XP tuning that would break level progression
    #[error("Invalid gamification setting {setting}: {reason}")]
    InvalidConfig { setting: String, reason: String },
}

impl GamificationError {
    pub fn invalid_state(reason: impl Into<String>) -> Self {
        GamificationError::InvalidState {
            reason: reason.into(),
        }
    }
}

/// Storage collaborator errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// No profile stored for the user
    #[error("Profile not found for user {user_id}")]
    ProfileNotFound { user_id: String },

    /// Profile already exists
    #[error("Profile already exists for user {user_id}")]
    Duplicate { user_id: String },

    /// Caller tried to write another user's data
    #[error("Not authorized to modify data of user {user_id}")]
    Unauthorized { user_id: String },

    /// Underlying SQLite failure
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Stored payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored row violates an invariant
    #[error("Corrupted record in {table}: {reason}")]
    Corrupted { table: String, reason: String },
}

/// Result type alias for FocoTotal operations
pub type Result<T> = std::result::Result<T, FocoError>;

impl FocoError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            FocoError::Storage(StorageError::Sqlite(rusqlite::Error::SqliteFailure(err, _))) => {
                matches!(
                    err.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
            }
            FocoError::Io(_) => true,
            _ => false,
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            FocoError::Storage(StorageError::ProfileNotFound { .. }) => ErrorSeverity::Warning,
            FocoError::Validation(_) => ErrorSeverity::Warning,
            FocoError::Storage(StorageError::Corrupted { .. }) => ErrorSeverity::Critical,
            FocoError::Gamification(GamificationError::InvalidState { .. }) => {
                ErrorSeverity::Critical
            }
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            FocoError::Storage(StorageError::ProfileNotFound { .. }) => {
                "Your profile could not be loaded. Try signing out and back in.".to_string()
            }
            FocoError::Storage(StorageError::Sqlite(_)) | FocoError::Io(_) => {
                "Could not save your progress. Check your storage and try again.".to_string()
            }
            FocoError::Gamification(GamificationError::InvalidState { .. }) => {
                "Your profile data is inconsistent and progress was not recorded.".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Data inconsistency requiring attention
    Critical,
    /// Error that prevents the operation
    Error,
    /// Warning that doesn't prevent operation
    Warning,
    /// Informational message
    Info,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Info => tracing::Level::INFO,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = FocoError::Storage(StorageError::ProfileNotFound {
            user_id: "u1".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);

        let err = FocoError::Gamification(GamificationError::invalid_state("no profile"));
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
    }

    #[test]
    fn test_error_retryable() {
        let err = FocoError::Io(std::io::Error::new(std::io::ErrorKind::Other, "disk"));
        assert!(err.is_retryable());

        let err = FocoError::Validation("test".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_user_messages() {
        let err = FocoError::Storage(StorageError::ProfileNotFound {
            user_id: "u1".to_string(),
        });
        assert!(err.user_message().contains("profile could not be loaded"));

        let err: FocoError = GamificationError::invalid_state("xp_to_next_level is 0").into();
        assert!(err.to_string().contains("xp_to_next_level is 0"));
    }
}
