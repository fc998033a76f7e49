//! SQLite implementation of the connection and query abstraction.

use std::collections::{BTreeMap, VecDeque};

use rusqlite::types::Value;
use rusqlite::OpenFlags;

use crate::database::{ConnectOptions, Connection, Query};
use crate::error::{Error, Result};

/// A connection to an SQLite database file.
#[derive(Debug, Default)]
pub struct SqliteConnection {
    database: Option<rusqlite::Connection>,
    in_transaction: bool,
}

impl SqliteConnection {
    pub fn new() -> Self {
        Self::default()
    }

    fn database(&self) -> Result<&rusqlite::Connection> {
        self.database
            .as_ref()
            .ok_or_else(|| Error::Database("no database connected".into()))
    }
}

impl Connection for SqliteConnection {
    fn connect(&mut self, database: &str, options: ConnectOptions) -> Result<()> {
        if self.database.is_some() {
            return Ok(());
        }

        let flags = match options {
            ConnectOptions::ReadOnly => OpenFlags::SQLITE_OPEN_READ_ONLY,
            ConnectOptions::ReadWrite => OpenFlags::SQLITE_OPEN_READ_WRITE,
            ConnectOptions::ReadWriteCreate => {
                OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
            }
        };

        match rusqlite::Connection::open_with_flags(database, flags) {
            Ok(connection) => {
                tracing::info!("connected to SQLite database: {database}");
                self.database = Some(connection);
                Ok(())
            }
            Err(error) => {
                tracing::error!("error connecting to SQLite database: {error}");
                Err(Error::Sqlite(error.to_string()))
            }
        }
    }

    fn transaction(&mut self) -> Result<()> {
        if self.in_transaction {
            return Err(Error::Database("transaction already started".into()));
        }

        self.database()?.execute("BEGIN TRANSACTION", [])?;
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(Error::Database("transaction not started".into()));
        }

        self.database()?.execute("COMMIT", [])?;
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<()> {
        if !self.in_transaction {
            return Err(Error::Database("transaction not started".into()));
        }

        self.database()?.execute("ROLLBACK", [])?;
        self.in_transaction = false;
        Ok(())
    }

    fn build_query<'a>(&'a self, query: &str) -> Box<dyn Query + 'a> {
        Box::new(SqliteQuery::new(self.database.as_ref(), query))
    }
}

/// A deferred SQLite query. The statement is compiled through the
/// connection's prepared-statement cache on first step; the produced rows
/// are materialised so column access never outlives a borrow of the
/// statement.
pub struct SqliteQuery<'conn> {
    connection: Option<&'conn rusqlite::Connection>,
    query: String,
    binds: BTreeMap<usize, Value>,
    rows: Option<VecDeque<Vec<Value>>>,
    current: Option<Vec<Value>>,
}

impl<'conn> SqliteQuery<'conn> {
    pub fn new(connection: Option<&'conn rusqlite::Connection>, query: &str) -> Self {
        Self {
            connection,
            query: query.to_owned(),
            binds: BTreeMap::new(),
            rows: None,
            current: None,
        }
    }

    fn connection(&self) -> Result<&'conn rusqlite::Connection> {
        self.connection
            .ok_or_else(|| Error::Database("database not set".into()))
    }

    fn run(&mut self) -> Result<VecDeque<Vec<Value>>> {
        let connection = self.connection()?;
        let mut statement = connection.prepare_cached(&self.query)?;

        for (position, value) in &self.binds {
            statement.raw_bind_parameter(position + 1, value)?;
        }
        self.binds.clear();

        let column_count = statement.column_count();
        let mut rows = statement.raw_query();
        let mut out = VecDeque::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(column_count);
            for column in 0..column_count {
                values.push(row.get_ref(column)?.into());
            }
            out.push_back(values);
        }

        Ok(out)
    }

    fn column(&self, pos: usize) -> Result<&Value> {
        if self.rows.is_none() {
            let message = "statement has not been initialised";
            tracing::error!("{message}");
            return Err(Error::Database(message.into()));
        }

        self.current
            .as_ref()
            .and_then(|row| row.get(pos))
            .ok_or_else(|| Error::Database("no row to get a column from".into()))
    }
}

impl Query for SqliteQuery<'_> {
    fn bind_int(&mut self, position: usize, value: i64) {
        self.binds.insert(position, Value::Integer(value));
    }

    fn bind_double(&mut self, position: usize, value: f64) {
        self.binds.insert(position, Value::Real(value));
    }

    fn bind_chars(&mut self, position: usize, value: &str) {
        self.binds.insert(position, Value::Text(value.to_owned()));
    }

    fn bind_bool(&mut self, position: usize, value: bool) {
        self.binds.insert(position, Value::Integer(value.into()));
    }

    fn reset(&mut self) -> Result<()> {
        self.binds.clear();
        self.rows = None;
        self.current = None;
        Ok(())
    }

    fn next(&mut self) -> Result<bool> {
        if self.rows.is_none() {
            self.rows = Some(self.run()?);
        }

        match self.rows.as_mut().and_then(VecDeque::pop_front) {
            Some(row) => {
                self.current = Some(row);
                Ok(true)
            }
            None => {
                self.current = None;
                Ok(false)
            }
        }
    }

    fn exec(&mut self) -> Result<()> {
        self.connection()?.execute_batch(&self.query)?;
        Ok(())
    }

    fn as_int(&self, pos: usize) -> Result<i64> {
        match self.column(pos)? {
            Value::Integer(value) => Ok(*value),
            Value::Real(value) => Ok(*value as i64),
            Value::Text(value) => Ok(value.parse().unwrap_or(0)),
            Value::Null => Ok(0),
            Value::Blob(_) => Err(Error::Database("cannot read blob column as integer".into())),
        }
    }

    fn as_double(&self, pos: usize) -> Result<f64> {
        match self.column(pos)? {
            Value::Integer(value) => Ok(*value as f64),
            Value::Real(value) => Ok(*value),
            Value::Text(value) => Ok(value.parse().unwrap_or(0.0)),
            Value::Null => Ok(0.0),
            Value::Blob(_) => Err(Error::Database("cannot read blob column as double".into())),
        }
    }

    fn as_string(&self, pos: usize) -> Result<String> {
        match self.column(pos)? {
            Value::Text(value) => Ok(value.clone()),
            Value::Integer(value) => Ok(value.to_string()),
            Value::Real(value) => Ok(value.to_string()),
            Value::Null => Ok(String::new()),
            Value::Blob(_) => Err(Error::Database("cannot read blob column as string".into())),
        }
    }

    fn as_bool(&self, pos: usize) -> Result<bool> {
        Ok(self.as_int(pos)? != 0)
    }
}
