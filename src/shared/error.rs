use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(String),

    /// The local queue ran out of space; offline capacity is full.
    #[error("Storage full: {0}")]
    StorageFull(String),

    /// Durable storage could not be opened, so offline queueing is disabled.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Request aborted")]
    Aborted,

    #[error("Remote rejected request ({status}): {message}")]
    Remote { status: u16, message: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn is_storage_full(&self) -> bool {
        matches!(self, AppError::StorageFull(_))
    }

    pub fn is_storage_failure(&self) -> bool {
        matches!(
            self,
            AppError::StorageFull(_) | AppError::StorageUnavailable(_) | AppError::Database(_)
        )
    }
}

// SQLITE_FULL
const SQLITE_FULL_CODE: &str = "13";

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                let is_full = db_err
                    .code()
                    .map(|code| code == SQLITE_FULL_CODE)
                    .unwrap_or(false)
                    || message.contains("database or disk is full");
                if is_full {
                    AppError::StorageFull(message)
                } else {
                    AppError::Database(message)
                }
            }
            sqlx::Error::Io(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => AppError::StorageUnavailable(err.to_string()),
            _ => AppError::Database(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::StorageUnavailable(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Internal(err)
    }
}

impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
