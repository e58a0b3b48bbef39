//! SQLite engine binding.
//!
//! Executes statements through `rusqlite` and serves their results in the
//! cell format the cursor expects. Each executed query keeps a live
//! statement in a handle registry and `fetch` steps it one row at a time,
//! so rows are never buffered beyond the current one. BLOB columns are
//! served as handles into a per-row BLOB table that is cleared on the next
//! fetch.
//!
//! Column types come from the declared type of the result column:
//!
//! | Declared type                     | Type code            |
//! |-----------------------------------|----------------------|
//! | `SMALLINT`                        | SHORT                |
//! | `INTEGER`, `INT`, `BOOLEAN`       | LONG                 |
//! | `BIGINT`                          | INT64                |
//! | `NUMERIC(p,s)`, `DECIMAL(p,s)`    | SHORT/LONG/INT64, s  |
//! | `FLOAT`, `REAL`                   | FLOAT                |
//! | `DOUBLE PRECISION`                | DOUBLE               |
//! | `CHAR(n)`                         | TEXT (space padded)  |
//! | `VARCHAR(n)`                      | VARYING              |
//! | `DATE`, `TIME`, `TIMESTAMP`       | DATE, TIME, TIMESTAMP|
//! | `BLOB SUB_TYPE TEXT`, `TEXT`      | BLOB subtype 1       |
//! | `BLOB`                            | BLOB subtype 0       |
//!
//! Expression columns without a declared type take the storage class of
//! their value in the first row, which is stepped at execute time and held
//! for the first fetch.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use bytes::Bytes;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use ouroboros::self_referencing;
use rusqlite::types::Value as SqlValue;
use rusqlite::{ffi, params_from_iter, ErrorCode, OpenFlags, Rows, Statement};
use tracing::{debug, trace};

use crate::engine::constants::*;
use crate::engine::decode::{encode_date, encode_scaled, encode_time, encode_timestamp};
use crate::engine::types::{BlobHandle, ColumnMetadata, Value};
use crate::engine::{BlobReader, Cell, Engine, Execution, Fetch, StatementHandle};
use crate::error::{Error, Result};

/// System catalogue seeded into every database created by this binding.
const SEED_CATALOGUE: &str = "
CREATE TABLE RDB$DATABASE (
    RDB$DESCRIPTION BLOB SUB_TYPE TEXT,
    RDB$RELATION_ID SMALLINT,
    RDB$SECURITY_CLASS CHAR(31),
    RDB$CHARACTER_SET_NAME CHAR(31)
);
INSERT INTO RDB$DATABASE VALUES (NULL, 128, NULL, 'NONE');
";

const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];
const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

type Step = rusqlite::Result<Option<Vec<SqlValue>>>;

/// A prepared statement with its open row stream.
///
/// Holds its own handle on the connection, so it can outlive a borrow of
/// the engine.
#[self_referencing]
struct LiveRows {
    conn: Rc<rusqlite::Connection>,
    #[borrows(conn)]
    #[not_covariant]
    stmt: Statement<'this>,
    #[borrows(mut stmt)]
    #[not_covariant]
    rows: Rows<'this>,
}

impl LiveRows {
    /// Step to the next row and copy out `width` values.
    fn step(&mut self, width: usize) -> Step {
        self.with_rows_mut(|rows| -> Step {
            match rows.next()? {
                Some(row) => (0..width)
                    .map(|i| row.get::<_, SqlValue>(i))
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map(Some),
                None => Ok(None),
            }
        })
    }
}

/// An executed statement.
struct ResultSet {
    columns: Vec<ColumnMetadata>,
    /// First row, stepped early to type untyped columns.
    peeked: Option<Step>,
    /// Open row stream; `None` once the statement is done.
    live: Option<LiveRows>,
    /// BLOBs handed out for the current row.
    row_blobs: Vec<u64>,
}

/// Engine backed by a SQLite database file.
pub struct SqliteEngine {
    conn: Option<Rc<rusqlite::Connection>>,
    results: HashMap<u64, ResultSet>,
    blobs: HashMap<u64, Vec<u8>>,
    next_statement: u64,
    next_blob: u64,
}

impl SqliteEngine {
    /// Wrap an open SQLite connection.
    pub fn from_connection(conn: rusqlite::Connection) -> Self {
        Self {
            conn: Some(Rc::new(conn)),
            results: HashMap::new(),
            blobs: HashMap::new(),
            next_statement: 1,
            next_blob: 1,
        }
    }

    /// Create a new database file and seed its system catalogue.
    ///
    /// Fails with `DatabaseExists` if the file is already there.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            return Err(Error::DatabaseExists {
                path: path.display().to_string(),
            });
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = rusqlite::Connection::open_with_flags(path, flags).map_err(map_sqlite_error)?;
        conn.execute_batch(SEED_CATALOGUE).map_err(map_sqlite_error)?;
        debug!(path = %path.display(), "created database");
        Ok(Self::from_connection(conn))
    }

    /// Open an existing database file.
    ///
    /// Fails with `DatabaseNotFound` if the file does not exist.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::DatabaseNotFound {
                path: path.display().to_string(),
            });
        }
        let conn = rusqlite::Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_WRITE)
            .map_err(map_sqlite_error)?;
        debug!(path = %path.display(), "opened database");
        Ok(Self::from_connection(conn))
    }

    /// Open a private in-memory database with a seeded catalogue.
    pub fn open_in_memory() -> Result<Self> {
        let conn = rusqlite::Connection::open_in_memory().map_err(map_sqlite_error)?;
        conn.execute_batch(SEED_CATALOGUE).map_err(map_sqlite_error)?;
        Ok(Self::from_connection(conn))
    }

    fn conn(&self) -> Result<&Rc<rusqlite::Connection>> {
        self.conn.as_ref().ok_or(Error::ConnectionClosed)
    }

    /// Number of statements not yet released.
    pub fn open_statements(&self) -> usize {
        self.results.len()
    }

    fn register(&mut self, result: ResultSet) -> StatementHandle {
        let id = self.next_statement;
        self.next_statement += 1;
        self.results.insert(id, result);
        StatementHandle(id)
    }
}

impl BlobReader for SqliteEngine {
    fn read_blob(&mut self, blob: BlobHandle) -> Result<Vec<u8>> {
        self.blobs
            .get(&blob.id())
            .cloned()
            .ok_or_else(|| Error::engine(ISC_BAD_SEGSTR_ID, format!("invalid BLOB ID {}", blob)))
    }
}

impl Engine for SqliteEngine {
    fn execute(&mut self, sql: &str, params: &[Value]) -> Result<Execution> {
        let conn = Rc::clone(self.conn()?);
        let args: Vec<SqlValue> = params.iter().map(bind_value).collect();
        let mut declared: Vec<(String, Option<String>)> = Vec::new();

        let mut live = LiveRows::try_new(
            Rc::clone(&conn),
            |conn| {
                conn.prepare(sql).map(|stmt| {
                    declared = stmt
                        .columns()
                        .iter()
                        .map(|c| (c.name().to_string(), c.decl_type().map(str::to_string)))
                        .collect();
                    stmt
                })
            },
            |stmt| stmt.query(params_from_iter(args)),
        )
        .map_err(map_sqlite_error)?;

        if declared.is_empty() {
            // No result set: run it to completion now.
            live.step(0).map_err(map_sqlite_error)?;
            drop(live);
            let rows_affected = conn.changes();
            let statement = self.register(ResultSet {
                columns: Vec::new(),
                peeked: None,
                live: None,
                row_blobs: Vec::new(),
            });
            debug!(statement = statement.0, rows_affected, "statement executed");
            return Ok(Execution {
                statement,
                columns: Vec::new(),
                rows_affected,
            });
        }

        let width = declared.len();
        let peeked = declared
            .iter()
            .any(|(_, decl)| decl.is_none())
            .then(|| live.step(width));
        let first_row = match &peeked {
            Some(Ok(Some(row))) => Some(row),
            _ => None,
        };
        let columns: Vec<ColumnMetadata> = declared
            .iter()
            .enumerate()
            .map(|(i, (name, decl))| {
                let sample = first_row.map(|row| &row[i]).filter(|v| !matches!(v, SqlValue::Null));
                column_metadata(name, decl.as_deref(), sample)
            })
            .collect();

        let statement = self.register(ResultSet {
            columns: columns.clone(),
            peeked,
            live: Some(live),
            row_blobs: Vec::new(),
        });
        debug!(statement = statement.0, columns = width, "query opened");
        Ok(Execution {
            statement,
            columns,
            rows_affected: 0,
        })
    }

    fn execute_batch(&mut self, script: &str) -> Result<()> {
        self.conn()?.execute_batch(script).map_err(map_sqlite_error)
    }

    fn fetch(&mut self, statement: StatementHandle) -> Result<Fetch> {
        let rs = self
            .results
            .get_mut(&statement.0)
            .ok_or_else(|| bad_statement(statement))?;
        for id in rs.row_blobs.drain(..) {
            self.blobs.remove(&id);
        }

        let width = rs.columns.len();
        let stepped = match rs.peeked.take() {
            Some(step) => step,
            None => match rs.live.as_mut() {
                Some(live) => live.step(width),
                None => Ok(None),
            },
        };
        let values = match stepped {
            Ok(Some(values)) => values,
            Ok(None) => {
                rs.live = None;
                return Ok(Fetch::EndOfData);
            }
            Err(e) => {
                rs.live = None;
                return Err(map_sqlite_error(e));
            }
        };

        let mut cells = Vec::with_capacity(values.len());
        for (meta, value) in rs.columns.iter().zip(values) {
            let cell = match encode_cell(meta, value)? {
                Encoded::Inline(cell) => cell,
                Encoded::Blob(bytes) => {
                    let id = self.next_blob;
                    self.next_blob += 1;
                    self.blobs.insert(id, bytes);
                    rs.row_blobs.push(id);
                    Cell::Blob(BlobHandle(id))
                }
            };
            cells.push(cell);
        }
        trace!(statement = statement.0, cells = cells.len(), "row fetched");
        Ok(Fetch::Row(cells))
    }

    fn release(&mut self, statement: StatementHandle) -> Result<()> {
        let rs = self
            .results
            .remove(&statement.0)
            .ok_or_else(|| bad_statement(statement))?;
        for id in rs.row_blobs {
            self.blobs.remove(&id);
        }
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.results.clear();
        self.blobs.clear();
        let Some(conn) = self.conn.take() else {
            return Ok(());
        };
        match Rc::try_unwrap(conn) {
            Ok(conn) => conn.close().map_err(|(_, e)| map_sqlite_error(e)),
            Err(_) => Err(Error::engine(
                ffi::SQLITE_BUSY,
                "unable to close due to unfinalized statements",
            )),
        }
    }
}

fn bad_statement(statement: StatementHandle) -> Error {
    Error::engine(
        ISC_BAD_STMT_HANDLE,
        format!("invalid statement handle {}", statement.0),
    )
}

/// Convert a parameter to a SQLite value.
fn bind_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(*b as i64),
        Value::Short(v) => SqlValue::Integer(*v as i64),
        Value::Int(v) => SqlValue::Integer(*v as i64),
        Value::BigInt(v) => SqlValue::Integer(*v),
        Value::Float(v) => SqlValue::Real(*v as f64),
        Value::Double(v) => SqlValue::Real(*v),
        Value::Text(s) => SqlValue::Text(s.clone()),
        Value::Bytes(b) => SqlValue::Blob(b.clone()),
        Value::Timestamp(ts) => {
            SqlValue::Text(ts.naive_local().format("%Y-%m-%d %H:%M:%S%.f").to_string())
        }
    }
}

/// Metadata for a result column from its declared type, or from a sample
/// value when the column has none.
fn column_metadata(name: &str, decl: Option<&str>, sample: Option<&SqlValue>) -> ColumnMetadata {
    if let Some(meta) = decl.and_then(|d| declared_metadata(name, d)) {
        return meta;
    }
    match sample {
        Some(SqlValue::Integer(_)) => ColumnMetadata::new(name, SQL_INT64).with_length(8),
        Some(SqlValue::Real(_)) => ColumnMetadata::new(name, SQL_DOUBLE).with_length(8),
        Some(SqlValue::Blob(_)) => ColumnMetadata::new(name, SQL_BLOB)
            .with_subtype(BLOB_SUB_TYPE_BINARY)
            .with_length(8),
        _ => ColumnMetadata::new(name, SQL_VARYING),
    }
}

fn declared_metadata(name: &str, decl: &str) -> Option<ColumnMetadata> {
    let decl = decl.to_ascii_uppercase();
    let (base, args) = match decl.split_once('(') {
        Some((base, rest)) => {
            let inner = rest.split(')').next().unwrap_or_default();
            let args: Vec<u32> = inner
                .split(',')
                .filter_map(|a| a.trim().parse().ok())
                .collect();
            (base.to_string(), args)
        }
        None => (decl.clone(), Vec::new()),
    };
    let base = base.split_whitespace().collect::<Vec<_>>().join(" ");
    let arg = |i: usize| args.get(i).copied();

    let meta = match base.as_str() {
        "SMALLINT" => ColumnMetadata::new(name, SQL_SHORT).with_length(2),
        "INTEGER" | "INT" | "BOOLEAN" => ColumnMetadata::new(name, SQL_LONG).with_length(4),
        "BIGINT" => ColumnMetadata::new(name, SQL_INT64).with_length(8),
        "NUMERIC" | "DECIMAL" => {
            let precision = arg(0).unwrap_or(MAX_SCALE as u32);
            let scale = arg(1).unwrap_or(0).min(MAX_SCALE as u32) as i16;
            let (type_code, length) = match precision {
                0..=4 => (SQL_SHORT, 2),
                5..=9 => (SQL_LONG, 4),
                _ => (SQL_INT64, 8),
            };
            ColumnMetadata::new(name, type_code)
                .with_scale(scale)
                .with_length(length)
        }
        "FLOAT" | "REAL" => ColumnMetadata::new(name, SQL_FLOAT).with_length(4),
        "DOUBLE" | "DOUBLE PRECISION" => ColumnMetadata::new(name, SQL_DOUBLE).with_length(8),
        "CHAR" | "CHARACTER" | "NCHAR" => ColumnMetadata::new(name, SQL_TEXT)
            .with_length(arg(0).unwrap_or(DEFAULT_TEXT_LENGTH)),
        "VARCHAR" | "CHARACTER VARYING" | "NVARCHAR" => {
            ColumnMetadata::new(name, SQL_VARYING).with_length(arg(0).unwrap_or(0))
        }
        "DATE" => ColumnMetadata::new(name, SQL_TYPE_DATE).with_length(4),
        "TIME" => ColumnMetadata::new(name, SQL_TYPE_TIME).with_length(4),
        "TIMESTAMP" | "DATETIME" => ColumnMetadata::new(name, SQL_TIMESTAMP).with_length(8),
        "TEXT" | "CLOB" | "BLOB SUB_TYPE TEXT" | "BLOB SUB_TYPE 1" => {
            ColumnMetadata::new(name, SQL_BLOB)
                .with_subtype(BLOB_SUB_TYPE_TEXT)
                .with_length(8)
        }
        "BLOB" | "BLOB SUB_TYPE BINARY" | "BLOB SUB_TYPE 0" => ColumnMetadata::new(name, SQL_BLOB)
            .with_subtype(BLOB_SUB_TYPE_BINARY)
            .with_length(8),
        _ => return None,
    };
    Some(meta)
}

enum Encoded {
    Inline(Cell),
    Blob(Vec<u8>),
}

fn inline(data: impl Into<Bytes>) -> Encoded {
    Encoded::Inline(Cell::Data(data.into()))
}

/// Encode one stored value in the wire form of its column's type.
fn encode_cell(meta: &ColumnMetadata, value: SqlValue) -> Result<Encoded> {
    if matches!(value, SqlValue::Null) {
        return Ok(Encoded::Inline(Cell::Null));
    }

    let encoded = match meta.type_code {
        SQL_SHORT => {
            let raw = integer_of(meta, &value)?;
            inline(i16::try_from(raw).map_err(|_| overflow(meta))?.to_le_bytes().to_vec())
        }
        SQL_LONG => {
            let raw = integer_of(meta, &value)?;
            inline(i32::try_from(raw).map_err(|_| overflow(meta))?.to_le_bytes().to_vec())
        }
        SQL_INT64 => inline(integer_of(meta, &value)?.to_le_bytes().to_vec()),
        SQL_FLOAT => inline((real_of(meta, &value)? as f32).to_le_bytes().to_vec()),
        SQL_DOUBLE => inline(real_of(meta, &value)?.to_le_bytes().to_vec()),
        SQL_TEXT => {
            let mut bytes = bytes_of(value);
            let length = meta.length as usize;
            if bytes.len() < length {
                bytes.resize(length, b' ');
            }
            inline(bytes)
        }
        SQL_VARYING => inline(bytes_of(value)),
        SQL_TYPE_DATE => {
            let text = text_of(meta, &value)?;
            inline(encode_date(parse_date(&text).ok_or_else(|| convert_error(&text))?).to_vec())
        }
        SQL_TYPE_TIME => {
            let text = text_of(meta, &value)?;
            inline(encode_time(parse_time(&text).ok_or_else(|| convert_error(&text))?).to_vec())
        }
        SQL_TIMESTAMP => {
            let text = text_of(meta, &value)?;
            let ts = parse_timestamp(&text)
                .or_else(|| parse_date(&text).and_then(|d| d.and_hms_opt(0, 0, 0)))
                .ok_or_else(|| convert_error(&text))?;
            inline(encode_timestamp(ts).to_vec())
        }
        SQL_BLOB => Encoded::Blob(bytes_of(value)),
        other => return Err(Error::UnsupportedType { type_code: other }),
    };
    Ok(encoded)
}

/// Unscaled integer for a (possibly fixed-point) integer column.
fn integer_of(meta: &ColumnMetadata, value: &SqlValue) -> Result<i64> {
    if meta.scale > 0 {
        let factor = 10i64.checked_pow(meta.scale as u32).ok_or_else(|| overflow(meta))?;
        return match value {
            SqlValue::Integer(i) => i.checked_mul(factor).ok_or_else(|| overflow(meta)),
            _ => encode_scaled(real_of(meta, value)?, meta.scale).ok_or_else(|| overflow(meta)),
        };
    }
    match value {
        SqlValue::Integer(i) => Ok(*i),
        SqlValue::Real(f) if f.fract() == 0.0 && f.abs() < 9.2e18 => Ok(*f as i64),
        SqlValue::Text(s) => s.trim().parse().map_err(|_| convert_error(s)),
        _ => Err(convert_error(&format!("{:?}", value))),
    }
}

fn real_of(meta: &ColumnMetadata, value: &SqlValue) -> Result<f64> {
    match value {
        SqlValue::Integer(i) => Ok(*i as f64),
        SqlValue::Real(f) => Ok(*f),
        SqlValue::Text(s) => s.trim().parse().map_err(|_| convert_error(s)),
        _ => Err(Error::engine(
            ISC_CONVERT_ERROR,
            format!("conversion error in column {}", meta.name),
        )),
    }
}

fn text_of(meta: &ColumnMetadata, value: &SqlValue) -> Result<String> {
    match value {
        SqlValue::Text(s) => Ok(s.clone()),
        _ => Err(Error::engine(
            ISC_CONVERT_ERROR,
            format!("conversion error in column {}: expected date/time text", meta.name),
        )),
    }
}

fn bytes_of(value: SqlValue) -> Vec<u8> {
    match value {
        SqlValue::Text(s) => s.into_bytes(),
        SqlValue::Blob(b) => b,
        SqlValue::Integer(i) => i.to_string().into_bytes(),
        SqlValue::Real(f) => f.to_string().into_bytes(),
        SqlValue::Null => Vec::new(),
    }
}

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%Y-%m-%d")
        .ok()
        .or_else(|| parse_timestamp(text).map(|ts| ts.date()))
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let trimmed = text.trim();
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveTime::parse_from_str(trimmed, fmt).ok())
        .or_else(|| parse_timestamp(text).map(|ts| ts.time()))
}

fn overflow(meta: &ColumnMetadata) -> Error {
    Error::engine(
        ISC_ARITH_EXCEPT,
        format!(
            "arithmetic exception, numeric overflow, or string truncation in column {}",
            meta.name
        ),
    )
}

fn convert_error(text: &str) -> Error {
    Error::engine(ISC_CONVERT_ERROR, format!("conversion error from string \"{}\"", text))
}

/// Map a SQLite failure to an engine error.
///
/// Primary and unique key violations carry the duplicate-value code so
/// callers can recognize them with `Error::is_duplicate`.
fn map_sqlite_error(e: rusqlite::Error) -> Error {
    match e {
        rusqlite::Error::SqliteFailure(err, detail) => {
            let detail = detail.unwrap_or_else(|| err.to_string());
            match err.extended_code {
                ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE => Error::engine(
                    ISC_UNIQUE_KEY_VIOLATION,
                    format!(
                        "violation of PRIMARY or UNIQUE KEY constraint: attempt to store duplicate column values ({})",
                        detail
                    ),
                ),
                _ if matches!(err.code, ErrorCode::CannotOpen | ErrorCode::SystemIoFailure) => {
                    Error::engine(ISC_IO_ERROR, detail)
                }
                code => Error::engine(code, detail),
            }
        }
        other => Error::engine(-1, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> SqliteEngine {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        engine
            .execute_batch(
                "CREATE TABLE T (
                    ID BIGINT PRIMARY KEY,
                    N NUMERIC(9,2),
                    C CHAR(4),
                    D DATE,
                    M BLOB SUB_TYPE TEXT
                );",
            )
            .unwrap();
        engine
    }

    fn data(cell: &Cell) -> &[u8] {
        match cell {
            Cell::Data(b) => b.as_ref(),
            other => panic!("expected inline data, got {:?}", other),
        }
    }

    #[test]
    fn test_declared_types() {
        let meta = declared_metadata("N", "numeric(9, 2)").unwrap();
        assert_eq!((meta.type_code, meta.scale, meta.length), (SQL_LONG, 2, 4));

        let meta = declared_metadata("N", "DECIMAL(18,4)").unwrap();
        assert_eq!((meta.type_code, meta.scale), (SQL_INT64, 4));

        let meta = declared_metadata("M", "BLOB  SUB_TYPE TEXT").unwrap();
        assert_eq!((meta.type_code, meta.subtype), (SQL_BLOB, BLOB_SUB_TYPE_TEXT));

        let meta = declared_metadata("C", "CHAR").unwrap();
        assert_eq!((meta.type_code, meta.length), (SQL_TEXT, 1));

        assert!(declared_metadata("X", "GEOMETRY").is_none());
    }

    #[test]
    fn test_untyped_column_uses_sample() {
        let meta = column_metadata("COUNT", None, Some(&SqlValue::Integer(3)));
        assert_eq!(meta.type_code, SQL_INT64);
        let meta = column_metadata("X", None, None);
        assert_eq!(meta.type_code, SQL_VARYING);
    }

    #[test]
    fn test_catalogue_is_seeded() {
        let mut engine = SqliteEngine::open_in_memory().unwrap();
        let exec = engine.execute("SELECT * FROM RDB$DATABASE", &[]).unwrap();
        let codes: Vec<u16> = exec.columns.iter().map(|c| c.type_code).collect();
        assert_eq!(codes, vec![SQL_BLOB, SQL_SHORT, SQL_TEXT, SQL_TEXT]);

        let Fetch::Row(cells) = engine.fetch(exec.statement).unwrap() else {
            panic!("expected a row");
        };
        assert!(cells[0].is_null());
        assert_eq!(data(&cells[1]), &128i16.to_le_bytes());
        assert!(cells[2].is_null());
        assert_eq!(data(&cells[3]).len(), 31);
        assert!(data(&cells[3]).starts_with(b"NONE "));

        assert_eq!(engine.fetch(exec.statement).unwrap(), Fetch::EndOfData);
        engine.release(exec.statement).unwrap();
        assert_eq!(engine.open_statements(), 0);
    }

    #[test]
    fn test_scaled_and_temporal_cells() {
        let mut engine = engine();
        engine
            .execute(
                "INSERT INTO T VALUES (?, ?, ?, ?, ?)",
                &[
                    Value::BigInt(1),
                    Value::Double(2.01),
                    Value::from("ab"),
                    Value::from("2013-10-10"),
                    Value::from("memo"),
                ],
            )
            .unwrap();

        let exec = engine.execute("SELECT N, C, D FROM T", &[]).unwrap();
        let Fetch::Row(cells) = engine.fetch(exec.statement).unwrap() else {
            panic!("expected a row");
        };
        assert_eq!(data(&cells[0]), &201i32.to_le_bytes());
        assert_eq!(data(&cells[1]), b"ab  ");
        assert_eq!(data(&cells[2]), &56_575i32.to_le_bytes());
    }

    #[test]
    fn test_blob_handles_are_row_scoped() {
        let mut engine = engine();
        engine
            .execute_batch("INSERT INTO T (ID, M) VALUES (1, 'first'), (2, 'second');")
            .unwrap();

        let exec = engine.execute("SELECT M FROM T ORDER BY ID", &[]).unwrap();
        let Fetch::Row(cells) = engine.fetch(exec.statement).unwrap() else {
            panic!("expected a row");
        };
        let Cell::Blob(first) = cells[0] else {
            panic!("expected a BLOB handle");
        };
        assert_eq!(engine.read_blob(first).unwrap(), b"first");

        engine.fetch(exec.statement).unwrap();
        let err = engine.read_blob(first).unwrap_err();
        assert_eq!(err.engine_code(), Some(ISC_BAD_SEGSTR_ID));
    }

    #[test]
    fn test_duplicate_key_maps_to_duplicate_error() {
        let mut engine = engine();
        engine.execute("INSERT INTO T (ID) VALUES (1)", &[]).unwrap();
        let err = engine
            .execute("INSERT INTO T (ID) VALUES (1)", &[])
            .unwrap_err();
        assert!(err.is_duplicate());
        assert!(err.to_string().contains("duplicate column values"));
    }

    #[test]
    fn test_rows_affected() {
        let mut engine = engine();
        engine
            .execute_batch("INSERT INTO T (ID) VALUES (1), (2), (3);")
            .unwrap();
        let exec = engine.execute("DELETE FROM T WHERE ID > 1", &[]).unwrap();
        assert_eq!(exec.rows_affected, 2);
        assert!(exec.columns.is_empty());
        assert_eq!(engine.fetch(exec.statement).unwrap(), Fetch::EndOfData);
    }

    #[test]
    fn test_row_error_surfaces_at_fetch() {
        let mut engine = engine();
        let exec = engine
            .execute(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c WHERE x < 3)
                 SELECT CASE WHEN x < 3 THEN x ELSE abs(x - 9223372036854775807 - 4) END AS V
                 FROM c",
                &[],
            )
            .unwrap();
        assert!(matches!(engine.fetch(exec.statement).unwrap(), Fetch::Row(_)));
        assert!(matches!(engine.fetch(exec.statement).unwrap(), Fetch::Row(_)));

        let err = engine.fetch(exec.statement).unwrap_err();
        assert!(err.to_string().contains("integer overflow"), "{}", err);
        assert_eq!(engine.fetch(exec.statement).unwrap(), Fetch::EndOfData);
        engine.release(exec.statement).unwrap();
    }

    #[test]
    fn test_unbounded_query_steps_lazily() {
        let mut engine = engine();
        let exec = engine
            .execute(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) SELECT x FROM c",
                &[],
            )
            .unwrap();
        for expected in 1i64..=3 {
            let Fetch::Row(cells) = engine.fetch(exec.statement).unwrap() else {
                panic!("expected a row");
            };
            assert_eq!(data(&cells[0]), &expected.to_le_bytes());
        }
        engine.release(exec.statement).unwrap();
        engine.close().unwrap();
    }

    #[test]
    fn test_close_with_open_statement() {
        let mut engine = engine();
        engine.execute("SELECT * FROM RDB$DATABASE", &[]).unwrap();
        assert_eq!(engine.open_statements(), 1);
        engine.close().unwrap();
        assert_eq!(engine.open_statements(), 0);
        assert!(matches!(
            engine.execute("SELECT 1", &[]),
            Err(Error::ConnectionClosed)
        ));
    }

    #[test]
    fn test_unknown_statement_handle() {
        let mut engine = engine();
        let err = engine.fetch(StatementHandle(99)).unwrap_err();
        assert_eq!(err.engine_code(), Some(ISC_BAD_STMT_HANDLE));
        assert!(engine.release(StatementHandle(99)).is_err());
    }

    #[test]
    fn test_create_and_open_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.db");

        assert!(matches!(
            SqliteEngine::open(&path),
            Err(Error::DatabaseNotFound { .. })
        ));
        let mut engine = SqliteEngine::create(&path).unwrap();
        engine.close().unwrap();
        engine.close().unwrap();
        assert!(matches!(
            SqliteEngine::create(&path),
            Err(Error::DatabaseExists { .. })
        ));
        assert!(SqliteEngine::open(&path).is_ok());
    }
}
