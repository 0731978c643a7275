use thiserror::Error;

use crate::config::ConfigError;

/// Centralized error types for the application
///
/// All errors raised by the core are converted to this enum for consistent
/// error handling. Uses `thiserror` for automatic conversion and display.
///
/// # Example
///
/// ```no_run
/// use yogacore::error::AppError;
///
/// fn handle_error(err: AppError) {
///     eprintln!("Error: {}", err);
/// }
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Database connection pool errors
    #[error("Database pool error: {0}")]
    DatabasePool(#[from] r2d2::Error),

    /// Schema migration errors
    #[error("Migration error: {0}")]
    Migration(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Telegram API errors
    #[cfg(feature = "telegram")]
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// The messaging platform refused to create an invite link
    #[error("Invite link error: {0}")]
    Invite(String),

    /// A referenced row does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Returns true when the error is a SQLite UNIQUE/PRIMARY KEY violation.
///
/// Admission relies on this to turn a lost insert race into "already a member".
pub fn is_unique_violation(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, _) => {
            e.code == rusqlite::ErrorCode::ConstraintViolation
                && (e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                    || e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn detects_unique_violation() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE t (id INTEGER PRIMARY KEY, v TEXT UNIQUE NOT NULL);")
            .unwrap();
        conn.execute("INSERT INTO t (v) VALUES ('a')", []).unwrap();

        let err = conn.execute("INSERT INTO t (v) VALUES ('a')", []).unwrap_err();
        assert!(is_unique_violation(&err));

        let err = conn.execute("INSERT INTO t (v) VALUES (NULL)", []).unwrap_err();
        assert!(!is_unique_violation(&err), "NOT NULL is not a uniqueness violation");
    }

    #[test]
    fn display_includes_source() {
        let err = AppError::NotFound("order ORD1".to_string());
        assert_eq!(err.to_string(), "Not found: order ORD1");
    }
}
