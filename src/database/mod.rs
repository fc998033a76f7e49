//! Database connection and query abstraction.
//!
//! The storage and migration layers speak to these traits only; the
//! SQLite implementation lives in [`sqlite`]. A connection holds at most
//! one uncommitted transaction at a time. Queries defer compilation and
//! parameter binding until first use.

pub mod migrate;
pub mod sqlite;

use crate::error::Result;

pub use migrate::{AppliedMigration, Migrate, Migration};
pub use sqlite::SqliteConnection;

/// Options for connecting to a database.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectOptions {
    /// Read-only connection.
    ReadOnly,
    /// Write connection without creating a database.
    ReadWrite,
    /// Write connection, creating the database if it does not exist.
    ReadWriteCreate,
}

/// A database connection that can run queries and transactions.
pub trait Connection: Send {
    /// Connect to the database. Once connected, further calls are no-ops.
    fn connect(&mut self, database: &str, options: ConnectOptions) -> Result<()>;

    /// Start a transaction. Only one transaction is allowed at a time;
    /// this can be called again after the transaction resolves.
    fn transaction(&mut self) -> Result<()>;

    /// Commit the open transaction.
    fn commit(&mut self) -> Result<()>;

    /// Roll back the open transaction.
    fn rollback(&mut self) -> Result<()>;

    /// Create a query using this connection. The query is not executed
    /// until [`Query::next`] or [`Query::exec`] is called.
    fn build_query<'a>(&'a self, query: &str) -> Box<dyn Query + 'a>;
}

/// A deferred query with positional parameter binds. Bind positions are
/// 0-based and map to the driver's 1-based numbering.
pub trait Query {
    fn bind_int(&mut self, position: usize, value: i64);

    fn bind_double(&mut self, position: usize, value: f64);

    fn bind_chars(&mut self, position: usize, value: &str);

    fn bind_bool(&mut self, position: usize, value: bool);

    /// Reset this query, clearing binds and rewinding the statement. Does
    /// not affect the transaction.
    fn reset(&mut self) -> Result<()>;

    /// Advance to the next row. `Ok(true)` means a row is available;
    /// `Ok(false)` means iteration is complete.
    fn next(&mut self) -> Result<bool>;

    /// Advance the query until there are no more rows.
    fn next_while(&mut self) -> Result<()> {
        while self.next()? {}
        Ok(())
    }

    /// Execute the query directly against the connection without preparing
    /// a statement. Suitable for multi-statement DDL.
    fn exec(&mut self) -> Result<()>;

    fn as_int(&self, pos: usize) -> Result<i64>;

    fn as_double(&self, pos: usize) -> Result<f64>;

    fn as_string(&self, pos: usize) -> Result<String>;

    fn as_bool(&self, pos: usize) -> Result<bool>;
}
