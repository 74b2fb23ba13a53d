use thiserror::Error;

pub type Result<T> = std::result::Result<T, PaktError>;

/// Errors raised by the domain and storage layers.
///
/// The split that matters to callers is transient versus permanent: only
/// [`PaktError::Transient`] is worth retrying, everything else has to be
/// surfaced to the user.
#[derive(Error, Debug)]
pub enum PaktError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("conflicting write: {0}")]
    Conflict(String),

    #[error("database temporarily unavailable: {0}")]
    Transient(String),

    #[error("database operation failed: {0}")]
    Database(sqlx::Error),

    #[error("database migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl PaktError {
    pub fn validation(message: impl Into<String>) -> Self {
        PaktError::Validation(message.into())
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        PaktError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, PaktError::Transient(_))
    }
}

impl From<sqlx::Error> for PaktError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => PaktError::NotFound {
                entity: "row",
                id: "?".to_string(),
            },
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                PaktError::Transient(err.to_string())
            }
            sqlx::Error::Database(db_err)
                if db_err.is_unique_violation() || db_err.is_foreign_key_violation() =>
            {
                PaktError::Conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.is_check_violation() => {
                PaktError::Validation(db_err.message().to_string())
            }
            _ => PaktError::Database(err),
        }
    }
}
