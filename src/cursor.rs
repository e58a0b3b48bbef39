//! Cursor over the rows of an executed statement.
//!
//! A `Cursor` streams rows from the engine one at a time. It owns the
//! engine statement handle, the column descriptors and the current row,
//! and tracks whether the result set is exhausted.
//!
//! # States
//!
//! - `Active`: `next()` fetches rows.
//! - `Exhausted`: the first `next()` that finds no row records
//!   `Error::EndOfData`; every later call records `Error::PastEndOfData`.
//!   An engine failure during fetch also exhausts the cursor.
//! - `Closed`: the statement handle is released. Reached from any state via
//!   `close()` or drop.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::connection::Connection;
use crate::convert::{decode_value, ScanTarget};
use crate::engine::types::{Column, ColumnInfo, Row, Value};
use crate::engine::{Cell, Execution, Fetch, StatementHandle};
use crate::error::{Error, Result};

/// Cursor state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Active,
    Exhausted,
    Closed,
}

/// Row-by-row cursor.
///
/// Borrows the connection that produced it, so the connection outlives the
/// cursor. Several cursors may be open on one connection. A cursor is not
/// `Sync`; use it from one thread at a time.
///
/// # Example
///
/// ```no_run
/// use dbcursor::{targets, NullableString, Connection};
///
/// fn main() -> dbcursor::Result<()> {
///     let conn = Connection::connect("database=/var/db/app.db")?;
///     let mut cursor = conn.execute("SELECT ID, NAME FROM USERS", &[])?;
///
///     let (mut id, mut name) = (0i64, NullableString::default());
///     while cursor.next() {
///         cursor.scan(targets![id, name])?;
///         println!("{} {:?}", id, name.get());
///     }
///     if let Some(err) = cursor.err().filter(|e| !e.is_end_of_data()) {
///         eprintln!("fetch failed: {}", err);
///     }
///     cursor.close()
/// }
/// ```
pub struct Cursor<'conn> {
    /// Connection the statement runs on.
    conn: &'conn Connection,
    /// Engine statement handle.
    statement: StatementHandle,
    /// Column descriptors, fixed at construction.
    column_info: Arc<ColumnInfo>,
    state: CursorState,
    /// Cells of the current row; valid until the next fetch.
    current: Option<Vec<Cell>>,
    /// Values already converted for the current row.
    cache: Vec<Option<Value>>,
    /// Error recorded by the last `next()`.
    last_error: Option<Error>,
    /// Rows fetched so far.
    rows_fetched: u64,
    /// Rows changed by the statement.
    rows_affected: u64,
}

impl<'conn> Cursor<'conn> {
    /// Create a cursor for an executed statement.
    ///
    /// Called by `Connection::execute()`. Releases the statement if the
    /// column metadata can't be turned into descriptors.
    pub(crate) fn new(conn: &'conn Connection, execution: Execution) -> Result<Self> {
        let column_info = match ColumnInfo::from_metadata(&execution.columns, conn.lowercase_names()) {
            Ok(info) => info,
            Err(e) => {
                if let Err(release_err) = conn.engine().release(execution.statement) {
                    warn!(error = %release_err, "failed to release statement");
                }
                return Err(e);
            }
        };
        Ok(Self {
            conn,
            statement: execution.statement,
            column_info: Arc::new(column_info),
            state: CursorState::Active,
            current: None,
            cache: Vec::new(),
            last_error: None,
            rows_fetched: 0,
            rows_affected: execution.rows_affected,
        })
    }

    /// Advance to the next row.
    ///
    /// Returns false when there is no row; `err()` then tells why:
    /// `EndOfData` the first time, `PastEndOfData` afterwards, or the
    /// engine failure.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> bool {
        match self.advance() {
            Ok(true) => true,
            Ok(false) => {
                self.last_error = Some(Error::EndOfData);
                false
            }
            Err(e) => {
                self.last_error = Some(e);
                false
            }
        }
    }

    /// Fetch the next row into the cursor. `Ok(false)` means end of data.
    fn advance(&mut self) -> Result<bool> {
        self.last_error = None;
        match self.state {
            CursorState::Closed => return Err(Error::CursorClosed),
            CursorState::Exhausted => return Err(Error::PastEndOfData),
            CursorState::Active => {}
        }

        self.current = None;
        self.cache.clear();

        let fetched = self.conn.engine().fetch(self.statement);
        match fetched {
            Ok(Fetch::Row(cells)) if cells.len() == self.column_info.len() => {
                self.cache = vec![None; cells.len()];
                self.current = Some(cells);
                self.rows_fetched += 1;
                Ok(true)
            }
            Ok(Fetch::Row(cells)) => {
                self.state = CursorState::Exhausted;
                Err(Error::decode(format!(
                    "Engine returned {} cells for {} columns",
                    cells.len(),
                    self.column_info.len()
                )))
            }
            Ok(Fetch::EndOfData) => {
                debug!(statement = self.statement.0, rows = self.rows_fetched, "cursor exhausted");
                self.state = CursorState::Exhausted;
                Ok(false)
            }
            Err(e) => {
                self.state = CursorState::Exhausted;
                Err(e)
            }
        }
    }

    /// The error recorded by the last `next()`, if any.
    pub fn err(&self) -> Option<&Error> {
        self.last_error.as_ref()
    }

    /// Advance and return the next row, or `None` at end of data.
    ///
    /// Errors are returned rather than recorded for `err()`.
    pub fn try_next(&mut self) -> Result<Option<Row>> {
        if self.advance()? {
            self.row().map(Some)
        } else {
            Ok(None)
        }
    }

    fn current_row(&self) -> Result<&[Cell]> {
        if self.state == CursorState::Closed {
            return Err(Error::CursorClosed);
        }
        self.current.as_deref().ok_or(Error::NoCurrentRow)
    }

    /// Natural value of one column of the current row.
    ///
    /// Converted values are cached for the row, so a BLOB is read from the
    /// engine at most once per row.
    fn value_at(&mut self, index: usize) -> Result<Value> {
        let cells = self.current_row()?;
        let cell = cells.get(index).ok_or(Error::ColumnIndexOutOfBounds {
            index,
            count: cells.len(),
        })?;
        if let Some(value) = &self.cache[index] {
            return Ok(value.clone());
        }

        let column = &self.column_info.columns[index];
        let value = {
            let mut engine = self.conn.engine();
            decode_value(column, cell, &self.conn.time_zone(), &mut **engine)?
        };
        self.cache[index] = Some(value.clone());
        Ok(value)
    }

    /// Get one column of the current row by index (0-based).
    pub fn get(&mut self, index: usize) -> Result<Value> {
        self.value_at(index)
    }

    /// Get one column of the current row by name.
    pub fn get_by_name(&mut self, name: &str) -> Result<Value> {
        let index = self
            .column_info
            .find_by_name(name)
            .ok_or_else(|| Error::ColumnNotFound {
                name: name.to_string(),
            })?;
        self.value_at(index)
    }

    /// The current row as natural values, in column order.
    ///
    /// # Errors
    ///
    /// `NoCurrentRow` before the first successful `next()` and once the
    /// cursor is exhausted; `CursorClosed` after `close()`.
    pub fn row(&mut self) -> Result<Row> {
        self.current_row()?;
        let values = (0..self.column_info.len())
            .map(|i| self.value_at(i))
            .collect::<Result<Vec<_>>>()?;
        Ok(Row::new(values, Arc::clone(&self.column_info)))
    }

    /// The current row keyed by column name.
    ///
    /// Keys follow the connection's name folding. When names repeat, the
    /// last column wins.
    pub fn row_map(&mut self) -> Result<HashMap<String, Value>> {
        Ok(self.row()?.to_map())
    }

    /// Scan the current row into typed destinations, one per column.
    ///
    /// Plain destinations reject NULL; `Nullable<T>`, `Option<T>` and
    /// `Value` accept it. Conversion stops at the first failing column and
    /// returns its error. Destinations before it have already been
    /// written; the call is not all-or-nothing.
    ///
    /// # Errors
    ///
    /// `Arity` if `dest.len()` differs from the column count (nothing is
    /// written), `Conversion` for an unrepresentable or NULL value,
    /// `NoCurrentRow` without a current row.
    pub fn scan(&mut self, dest: &mut [&mut dyn ScanTarget]) -> Result<()> {
        if dest.len() != self.column_info.len() {
            return Err(Error::Arity {
                expected: self.column_info.len(),
                actual: dest.len(),
            });
        }
        self.current_row()?;
        for (i, target) in dest.iter_mut().enumerate() {
            let value = self.value_at(i)?;
            target.scan_value(value, &self.column_info.columns[i])?;
        }
        Ok(())
    }

    /// Fetch all remaining rows.
    pub fn fetch_all(&mut self) -> Result<Vec<Row>> {
        let mut rows = Vec::new();
        while let Some(row) = self.try_next()? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Iterate over the remaining rows.
    pub fn rows(&mut self) -> Rows<'_, 'conn> {
        Rows {
            cursor: self,
            done: false,
        }
    }

    /// Release the statement handle.
    ///
    /// Idempotent. The cursor is closed even if the engine reports a
    /// failure while releasing; that failure is returned.
    pub fn close(&mut self) -> Result<()> {
        if self.state == CursorState::Closed {
            return Ok(());
        }
        self.state = CursorState::Closed;
        self.current = None;
        self.cache.clear();
        debug!(statement = self.statement.0, rows = self.rows_fetched, "closing cursor");
        self.conn.engine().release(self.statement)
    }

    /// Column descriptors.
    pub fn columns(&self) -> &[Column] {
        &self.column_info.columns
    }

    /// Column descriptors keyed by name (last duplicate wins).
    pub fn columns_map(&self) -> HashMap<&str, &Column> {
        self.column_info.by_name()
    }

    /// The descriptor registry.
    pub fn column_info(&self) -> &ColumnInfo {
        &self.column_info
    }

    /// Get column names.
    pub fn column_names(&self) -> Vec<&str> {
        self.column_info.column_names()
    }

    /// Get the number of columns.
    pub fn num_columns(&self) -> usize {
        self.column_info.len()
    }

    /// Number of rows fetched so far.
    pub fn rowcount(&self) -> u64 {
        self.rows_fetched
    }

    /// Rows inserted, updated or deleted by the statement.
    pub fn rows_affected(&self) -> u64 {
        self.rows_affected
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_closed(&self) -> bool {
        self.state == CursorState::Closed
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }
}

impl Drop for Cursor<'_> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!(statement = self.statement.0, error = %e, "failed to release statement");
        }
    }
}

impl std::fmt::Debug for Cursor<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("statement", &self.statement)
            .field("columns", &self.column_info.column_names())
            .field("state", &self.state)
            .field("rows_fetched", &self.rows_fetched)
            .finish()
    }
}

/// Iterator over a cursor's remaining rows.
///
/// Yields `Err` at most once, then stops.
pub struct Rows<'c, 'conn> {
    cursor: &'c mut Cursor<'conn>,
    done: bool,
}

impl Iterator for Rows<'_, '_> {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.cursor.try_next() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::connect::ConnectParams;
    use crate::engine::constants::*;
    use crate::engine::types::{BlobHandle, ColumnMetadata};
    use crate::engine::{BlobReader, Engine};
    use crate::nullable::{NullableInt32, NullableString};
    use crate::targets;
    use bytes::Bytes;
    use std::cell::RefCell;
    use std::collections::VecDeque;
    use std::rc::Rc;

    #[derive(Default)]
    struct MockState {
        columns: Vec<ColumnMetadata>,
        fetches: VecDeque<Result<Fetch>>,
        blobs: HashMap<u64, Vec<u8>>,
        blob_reads: usize,
        releases: usize,
        fail_release: bool,
    }

    struct MockEngine(Rc<RefCell<MockState>>);

    impl BlobReader for MockEngine {
        fn read_blob(&mut self, blob: BlobHandle) -> Result<Vec<u8>> {
            let mut state = self.0.borrow_mut();
            state.blob_reads += 1;
            state
                .blobs
                .get(&blob.id())
                .cloned()
                .ok_or_else(|| Error::engine(ISC_BAD_SEGSTR_ID, "invalid BLOB ID"))
        }
    }

    impl Engine for MockEngine {
        fn execute(&mut self, _sql: &str, _params: &[Value]) -> Result<Execution> {
            Ok(Execution {
                statement: StatementHandle(7),
                columns: self.0.borrow().columns.clone(),
                rows_affected: 0,
            })
        }

        fn execute_batch(&mut self, _script: &str) -> Result<()> {
            Ok(())
        }

        fn fetch(&mut self, statement: StatementHandle) -> Result<Fetch> {
            assert_eq!(statement, StatementHandle(7));
            self.0
                .borrow_mut()
                .fetches
                .pop_front()
                .unwrap_or(Ok(Fetch::EndOfData))
        }

        fn release(&mut self, _statement: StatementHandle) -> Result<()> {
            let mut state = self.0.borrow_mut();
            state.releases += 1;
            if state.fail_release {
                return Err(Error::engine(ISC_BAD_STMT_HANDLE, "release failed"));
            }
            Ok(())
        }

        fn close(&mut self) -> Result<()> {
            Ok(())
        }
    }

    fn int(v: i32) -> Cell {
        Cell::Data(Bytes::copy_from_slice(&v.to_le_bytes()))
    }

    fn text(s: &str) -> Cell {
        Cell::Data(Bytes::copy_from_slice(s.as_bytes()))
    }

    fn setup(lowercase: bool) -> (Connection, Rc<RefCell<MockState>>) {
        let state = Rc::new(RefCell::new(MockState {
            columns: vec![
                ColumnMetadata::new("ID", SQL_LONG),
                ColumnMetadata::new("NAME", SQL_VARYING),
            ],
            ..Default::default()
        }));
        let params = ConnectParams::new("mock").with_lowercase_names(lowercase);
        let conn = Connection::new(Box::new(MockEngine(Rc::clone(&state))), params);
        (conn, state)
    }

    fn push_rows(state: &Rc<RefCell<MockState>>, rows: Vec<Vec<Cell>>) {
        let mut state = state.borrow_mut();
        for row in rows {
            state.fetches.push_back(Ok(Fetch::Row(row)));
        }
    }

    #[test]
    fn test_end_of_data_then_past_end() {
        let (conn, state) = setup(false);
        push_rows(&state, vec![vec![int(1), text("one")]]);
        let mut cursor = conn.execute("SELECT", &[]).unwrap();

        assert!(cursor.err().is_none());
        assert!(cursor.next());
        assert!(cursor.err().is_none());
        assert_eq!(cursor.rowcount(), 1);

        assert!(!cursor.next());
        assert!(matches!(cursor.err(), Some(Error::EndOfData)));
        assert!(cursor.is_exhausted());

        assert!(!cursor.next());
        assert!(matches!(cursor.err(), Some(Error::PastEndOfData)));
        assert_eq!(
            cursor.err().unwrap().to_string(),
            "Cursor is past end of data."
        );
    }

    #[test]
    fn test_engine_failure_exhausts_cursor() {
        let (conn, state) = setup(false);
        state
            .borrow_mut()
            .fetches
            .push_back(Err(Error::engine(ISC_IO_ERROR, "I/O error during read")));
        let mut cursor = conn.execute("SELECT", &[]).unwrap();

        assert!(!cursor.next());
        assert_eq!(cursor.err().and_then(Error::engine_code), Some(ISC_IO_ERROR));
        assert!(!cursor.next());
        assert!(matches!(cursor.err(), Some(Error::PastEndOfData)));
    }

    #[test]
    fn test_row_without_current_row() {
        let (conn, state) = setup(false);
        push_rows(&state, vec![vec![int(1), text("one")]]);
        let mut cursor = conn.execute("SELECT", &[]).unwrap();

        assert!(matches!(cursor.row(), Err(Error::NoCurrentRow)));
        assert!(cursor.next());
        assert_eq!(
            cursor.row().unwrap().values(),
            &[Value::Int(1), Value::from("one")]
        );
        assert!(!cursor.next());
        assert!(matches!(cursor.row_map(), Err(Error::NoCurrentRow)));
    }

    #[test]
    fn test_row_map_with_lowercase_names() {
        let (conn, state) = setup(true);
        push_rows(&state, vec![vec![int(5), Cell::Null]]);
        let mut cursor = conn.execute("SELECT", &[]).unwrap();
        assert_eq!(cursor.column_names(), vec!["id", "name"]);

        assert!(cursor.next());
        let map = cursor.row_map().unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map["id"], Value::Int(5));
        assert_eq!(map["name"], Value::Null);
        assert_eq!(cursor.get_by_name("ID").unwrap(), Value::Int(5));
    }

    #[test]
    fn test_scan_arity_and_partial_write() {
        let (conn, state) = setup(false);
        push_rows(&state, vec![vec![int(9), Cell::Null]]);
        let mut cursor = conn.execute("SELECT", &[]).unwrap();
        assert!(cursor.next());

        let mut id = 0i32;
        let err = cursor.scan(targets![id]).unwrap_err();
        assert!(matches!(err, Error::Arity { expected: 2, actual: 1 }));
        assert_eq!(id, 0);

        let mut name = String::from("unchanged");
        let err = cursor.scan(targets![id, name]).unwrap_err();
        assert!(matches!(err, Error::Conversion { ref column, .. } if column == "NAME"));
        assert_eq!(id, 9);
        assert_eq!(name, "unchanged");

        let (mut id, mut name) = (NullableInt32::default(), NullableString::default());
        cursor.scan(targets![id, name]).unwrap();
        assert_eq!(id.get(), Some(&9));
        assert!(name.is_null());
    }

    #[test]
    fn test_blob_read_once_per_row() {
        let (conn, state) = setup(false);
        {
            let mut s = state.borrow_mut();
            s.columns = vec![ColumnMetadata::new("M", SQL_BLOB).with_subtype(BLOB_SUB_TYPE_TEXT)];
            s.blobs.insert(3, b"memo".to_vec());
        }
        push_rows(&state, vec![vec![Cell::Blob(BlobHandle(3))]]);
        let mut cursor = conn.execute("SELECT", &[]).unwrap();
        assert!(cursor.next());

        assert_eq!(cursor.get(0).unwrap(), Value::from("memo"));
        assert_eq!(cursor.row().unwrap()[0], Value::from("memo"));
        let mut memo = String::new();
        cursor.scan(targets![memo]).unwrap();
        assert_eq!(memo, "memo");
        assert_eq!(state.borrow().blob_reads, 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let (conn, state) = setup(false);
        push_rows(&state, vec![vec![int(1), text("one")]]);
        let mut cursor = conn.execute("SELECT", &[]).unwrap();
        assert!(cursor.next());

        cursor.close().unwrap();
        cursor.close().unwrap();
        assert!(cursor.is_closed());
        assert!(!cursor.next());
        assert!(matches!(cursor.err(), Some(Error::CursorClosed)));
        assert!(matches!(cursor.row(), Err(Error::CursorClosed)));
        drop(cursor);
        assert_eq!(state.borrow().releases, 1);
    }

    #[test]
    fn test_close_failure_still_closes() {
        let (conn, state) = setup(false);
        state.borrow_mut().fail_release = true;
        let mut cursor = conn.execute("SELECT", &[]).unwrap();

        assert!(cursor.close().is_err());
        assert!(cursor.is_closed());
        assert!(cursor.close().is_ok());
        assert_eq!(state.borrow().releases, 1);
    }

    #[test]
    fn test_drop_releases_statement() {
        let (conn, state) = setup(false);
        conn.execute("SELECT", &[]).unwrap();
        assert_eq!(state.borrow().releases, 1);
    }

    #[test]
    fn test_rows_iterator_and_fetch_all() {
        let (conn, state) = setup(false);
        push_rows(
            &state,
            vec![vec![int(1), text("one")], vec![int(2), text("two")]],
        );
        let mut cursor = conn.execute("SELECT", &[]).unwrap();
        let ids: Vec<Value> = cursor
            .rows()
            .map(|row| row.unwrap()[0].clone())
            .collect();
        assert_eq!(ids, vec![Value::Int(1), Value::Int(2)]);
        assert!(matches!(cursor.fetch_all(), Err(Error::PastEndOfData)));
    }

    #[test]
    fn test_cell_count_mismatch() {
        let (conn, state) = setup(false);
        push_rows(&state, vec![vec![int(1)]]);
        let mut cursor = conn.execute("SELECT", &[]).unwrap();
        assert!(!cursor.next());
        assert!(matches!(cursor.err(), Some(Error::Decode { .. })));
    }
}
