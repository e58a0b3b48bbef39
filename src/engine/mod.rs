//! Engine interface consumed by the cursor.
//!
//! An engine is the opaque row-producing service behind a connection. The
//! cursor only needs four things from it: execute a statement and report
//! its column metadata, fetch the next row, dereference a BLOB handle and
//! release the statement. `SqliteEngine` is the bundled binding.

pub mod connect;
pub mod constants;
pub mod decode;
pub mod sqlite;
pub mod types;

use bytes::Bytes;

use crate::error::Result;
use types::{BlobHandle, ColumnMetadata, Value};

/// Engine-side statement / result set handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatementHandle(pub u64);

/// One column of the current row in engine-native form.
///
/// Cells are row-scoped: the bytes and BLOB handles are only meaningful
/// until the cursor advances or closes.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    /// SQL NULL.
    Null,
    /// Inline value encoded according to the column's type code.
    Data(Bytes),
    /// Large object; contents are read through `BlobReader::read_blob`.
    Blob(BlobHandle),
}

impl Cell {
    /// Check if the cell is NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }
}

/// Result of a fetch request.
#[derive(Debug, Clone, PartialEq)]
pub enum Fetch {
    /// The next row, one cell per column.
    Row(Vec<Cell>),
    /// No more rows.
    EndOfData,
}

/// Result of executing a statement.
#[derive(Debug, Clone)]
pub struct Execution {
    /// Handle for fetching rows and releasing the statement.
    pub statement: StatementHandle,
    /// Result column metadata, empty for statements without a result set.
    pub columns: Vec<ColumnMetadata>,
    /// Rows inserted, updated or deleted.
    pub rows_affected: u64,
}

/// Secondary read of BLOB contents.
pub trait BlobReader {
    /// Read the full contents of a BLOB.
    fn read_blob(&mut self, blob: BlobHandle) -> Result<Vec<u8>>;
}

/// A SQL execution engine reached through a connection.
///
/// All calls are synchronous and may block on engine I/O. Failures are
/// returned as `Error::Engine` and are never retried by the caller.
pub trait Engine: BlobReader {
    /// Prepare and execute a statement with positional parameters.
    ///
    /// Column metadata must be complete on return, before the first fetch.
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Execution>;

    /// Execute a script of `;`-separated statements, discarding results.
    fn execute_batch(&mut self, script: &str) -> Result<()>;

    /// Fetch the next row of an executed statement.
    fn fetch(&mut self, statement: StatementHandle) -> Result<Fetch>;

    /// Release a statement and everything it holds.
    fn release(&mut self, statement: StatementHandle) -> Result<()>;

    /// Close the engine session.
    fn close(&mut self) -> Result<()>;
}
