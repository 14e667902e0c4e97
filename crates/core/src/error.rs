use thiserror::Error;

/// Main error type for Streak Tracker operations
#[derive(Error, Debug)]
pub enum Error {
    /// A read or write against the entry or status store failed.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(#[from] rusqlite::Error),

    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Invalid goal: {0} minutes (must be greater than zero)")]
    InvalidGoal(i64),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse settings: {0}")]
    SettingsParse(#[from] toml::de::Error),

    #[error("Failed to write settings: {0}")]
    SettingsWrite(#[from] toml::ser::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Convenient Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Check if the error came from the storage layer
    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }

    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Error::InvariantViolation(_))
    }
}
