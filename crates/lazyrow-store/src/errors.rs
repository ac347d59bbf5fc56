//! Error handling for lazyrow-store
//!
//! Store operations return the structured `ExError`; domain errors from the
//! core convert into it with `?`.

use lazyrow_core::errors::{ExError, ExErrorKind};
use lazyrow_core::sql::Statement;

/// Result type alias using ExError
pub type Result<T> = std::result::Result<T, ExError>;

/// Create a database error from rusqlite::Error
pub fn from_rusqlite(err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::SqlExecution)
        .with_op("sqlite")
        .with_message(err.to_string())
}

/// The engine rejected a statement
pub fn sql_error(stmt: &Statement, err: rusqlite::Error) -> ExError {
    ExError::new(ExErrorKind::SqlExecution)
        .with_op("sqlite")
        .with_message(format!("{} (statement: {})", err, stmt.sql))
}

/// Create a migration error
pub fn migration_error(migration_id: &str, reason: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration")
        .with_message(format!("Migration {} failed: {}", migration_id, reason))
}

/// Create a checksum mismatch error
pub fn checksum_mismatch(migration_id: &str, expected: &str, actual: &str) -> ExError {
    ExError::new(ExErrorKind::Persistence)
        .with_op("migration_checksum")
        .with_message(format!(
            "Checksum mismatch for migration {}: expected {}, got {}",
            migration_id, expected, actual
        ))
}

/// Create an IO error
pub fn io_error(operation: &str, err: std::io::Error) -> ExError {
    ExError::new(ExErrorKind::Io)
        .with_op(operation.to_string())
        .with_message(err.to_string())
}

pub fn config_error(reason: impl Into<String>) -> ExError {
    ExError::new(ExErrorKind::Configuration)
        .with_op("config")
        .with_message(reason)
}

/// Operation attempted on a gate whose connection is closed
pub fn connection_closed() -> ExError {
    ExError::new(ExErrorKind::IllegalState)
        .with_op("connection")
        .with_message("Connection is closed")
}
