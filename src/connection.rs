//! Connection façade and database lifecycle.

use std::cell::{RefCell, RefMut};
use std::path::Path;

use tracing::debug;

use crate::cursor::Cursor;
use crate::engine::connect::{ConnectParams, Zone};
use crate::engine::sqlite::SqliteEngine;
use crate::engine::types::{Column, Row, Value};
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Result of a query execution.
#[derive(Debug)]
pub struct QueryResult {
    /// Column descriptors.
    pub columns: Vec<Column>,
    /// Rows returned.
    pub rows: Vec<Row>,
    /// Rows inserted, updated or deleted by the statement.
    pub rows_affected: u64,
}

impl QueryResult {
    /// Get the number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if the result is empty.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Iterate over rows.
    pub fn iter(&self) -> impl Iterator<Item = &Row> {
        self.rows.iter()
    }
}

impl IntoIterator for QueryResult {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

/// An open session with a database engine.
///
/// Statements run synchronously. Cursors borrow the connection, so it
/// cannot be closed while any of them is alive.
pub struct Connection {
    engine: RefCell<Box<dyn Engine>>,
    params: ConnectParams,
}

impl Connection {
    /// Wrap an engine session.
    pub fn new(engine: Box<dyn Engine>, params: ConnectParams) -> Self {
        Self {
            engine: RefCell::new(engine),
            params,
        }
    }

    /// Connect to an existing database.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use dbcursor::Connection;
    ///
    /// let conn = Connection::connect("database=/var/db/test.db; timezone=-07:00")?;
    /// # Ok::<(), dbcursor::Error>(())
    /// ```
    pub fn connect(conn_str: &str) -> Result<Self> {
        Database::new(conn_str)?.connect()
    }

    /// Create a new database and connect to it.
    pub fn create(conn_str: &str) -> Result<Self> {
        Database::new(conn_str)?.create()
    }

    pub(crate) fn engine(&self) -> RefMut<'_, Box<dyn Engine>> {
        self.engine.borrow_mut()
    }

    /// Execute a statement and return a cursor over its result set.
    ///
    /// `params` bind to `?` placeholders in order. Statements without a
    /// result set return a cursor that is exhausted on the first `next()`.
    pub fn execute(&self, sql: &str, params: &[Value]) -> Result<Cursor<'_>> {
        debug!(sql, params = params.len(), "executing statement");
        let execution = self.engine().execute(sql, params)?;
        Cursor::new(self, execution)
    }

    /// Execute a script of `;`-separated statements.
    pub fn execute_script(&self, script: &str) -> Result<()> {
        debug!(len = script.len(), "executing script");
        self.engine().execute_batch(script)
    }

    /// Execute a statement and fetch every row.
    pub fn query(&self, sql: &str, params: &[Value]) -> Result<QueryResult> {
        let mut cursor = self.execute(sql, params)?;
        let rows = cursor.fetch_all()?;
        let result = QueryResult {
            columns: cursor.columns().to_vec(),
            rows,
            rows_affected: cursor.rows_affected(),
        };
        cursor.close()?;
        Ok(result)
    }

    /// Connection parameters.
    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    /// Default time zone for temporal values.
    pub fn time_zone(&self) -> Zone {
        self.params.time_zone
    }

    /// Whether column names are folded to lowercase.
    pub fn lowercase_names(&self) -> bool {
        self.params.lowercase_names
    }

    /// Close the engine session.
    pub fn close(self) -> Result<()> {
        debug!(database = %self.params.database, "closing connection");
        self.engine.into_inner().close()
    }

    /// Close the session and remove the database.
    pub fn drop_database(self) -> Result<()> {
        let database = Database::from_params(self.params.clone());
        self.close()?;
        database.drop_database()
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("database", &self.params.database)
            .field("username", &self.params.username)
            .field("time_zone", &self.params.time_zone)
            .field("lowercase_names", &self.params.lowercase_names)
            .finish()
    }
}

/// A database location with its connection parameters.
#[derive(Debug, Clone)]
pub struct Database {
    params: ConnectParams,
}

impl Database {
    /// Parse a connection string.
    pub fn new(conn_str: &str) -> Result<Self> {
        Ok(Self::from_params(ConnectParams::parse(conn_str)?))
    }

    pub fn from_params(params: ConnectParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ConnectParams {
        &self.params
    }

    fn path(&self) -> Result<&Path> {
        if let Some(host) = self.params.host() {
            debug!(host, "ignoring host for local database");
        }
        let path = self.params.path();
        if path.is_empty() {
            return Err(Error::InvalidConnectString {
                message: "Empty database path".to_string(),
            });
        }
        Ok(Path::new(path))
    }

    /// Create the database. Fails if it already exists.
    pub fn create(&self) -> Result<Connection> {
        debug!(statement = %self.params.create_statement(), "creating database");
        let engine = SqliteEngine::create(self.path()?)?;
        Ok(Connection::new(Box::new(engine), self.params.clone()))
    }

    /// Connect to the database. Fails if it does not exist.
    pub fn connect(&self) -> Result<Connection> {
        let engine = SqliteEngine::open(self.path()?)?;
        debug!(database = %self.params.database, "connected");
        Ok(Connection::new(Box::new(engine), self.params.clone()))
    }

    /// Remove the database.
    pub fn drop_database(&self) -> Result<()> {
        let path = self.path()?;
        if !path.exists() {
            return Err(Error::DatabaseNotFound {
                path: path.display().to_string(),
            });
        }
        std::fs::remove_file(path)?;
        debug!(path = %path.display(), "dropped database");
        Ok(())
    }
}

/// Create a database from a connection string and connect to it.
pub fn create(conn_str: &str) -> Result<Connection> {
    Connection::create(conn_str)
}

/// Connect to an existing database.
pub fn connect(conn_str: &str) -> Result<Connection> {
    Connection::connect(conn_str)
}

/// Remove the database named by a connection string.
pub fn drop_database(conn_str: &str) -> Result<()> {
    Database::new(conn_str)?.drop_database()
}
