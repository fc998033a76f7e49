//! Error taxonomy shared across the capture pipeline.
//!
//! Every fallible operation in the core returns [`Result`]. Variants carry
//! the originating message; the tag is part of the rendered output so log
//! lines identify the failing subsystem.

use thiserror::Error;

/// Errors produced by the capture pipeline.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum Error {
    /// Low-level driver failures that predate translation into the
    /// connection abstraction, such as failing to open the database file.
    #[error("SqliteError: {0}")]
    Sqlite(String),

    /// Database driver failures, missing statements, and migration
    /// version or checksum mismatches.
    #[error("DatabaseError: {0}")]
    Database(String),

    /// Storage-manager propagation, e.g. a periodic flush that failed.
    #[error("DatabaseManagerError: {0}")]
    DatabaseManager(String),

    /// Backend initialisation or event acquisition failures.
    #[error("EventHandlerError: {0}")]
    EventHandler(String),

    /// Task runtime or timer wait failures other than cooperative
    /// cancellation.
    #[error("AsyncError: {0}")]
    Async(String),
}

impl From<rusqlite::Error> for Error {
    fn from(error: rusqlite::Error) -> Self {
        Error::Database(error.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_taxonomy_tag() {
        let error = Error::Database("applied migrations do not match current migrations".into());
        assert_eq!(
            error.to_string(),
            "DatabaseError: applied migrations do not match current migrations"
        );
        assert_eq!(
            Error::Async("timer wait failed".into()).to_string(),
            "AsyncError: timer wait failed"
        );
    }
}
