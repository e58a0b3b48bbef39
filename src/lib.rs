//! Client-side database cursor layer.
//!
//! Executes SQL through an engine and walks the results row by row. Each
//! row can be read as natural values (`Cursor::row`, `Cursor::row_map`) or
//! scanned into typed destinations (`Cursor::scan`), with NULL-aware
//! `Nullable<T>` wrappers. `SqliteEngine` is the bundled engine binding;
//! other engines plug in through the `Engine` trait.
//!
//! # Example
//!
//! ```no_run
//! use dbcursor::{targets, Connection, NullableFloat64, Result};
//!
//! fn main() -> Result<()> {
//!     let conn = Connection::connect("database=/var/db/shop.db; timezone=+02:00")?;
//!
//!     {
//!         let mut cursor = conn.execute("SELECT NAME, PRICE FROM ITEMS", &[])?;
//!         let (mut name, mut price) = (String::new(), NullableFloat64::default());
//!         while cursor.next() {
//!             cursor.scan(targets![name, price])?;
//!             println!("{}: {:?}", name, price.get());
//!         }
//!         cursor.close()?;
//!     }
//!
//!     conn.close()
//! }
//! ```

pub mod connection;
pub mod convert;
pub mod cursor;
pub mod engine;
pub mod error;
pub mod nullable;

// Re-export main types
pub use connection::{connect, create, drop_database, Connection, Database, QueryResult};
pub use convert::{decode_value, FromValue, ScanTarget};
pub use cursor::{Cursor, CursorState, Rows};
pub use engine::connect::{parse_connection_string, parse_time_zone, ConnectParams, Zone};
pub use engine::sqlite::SqliteEngine;
pub use engine::types::{BlobHandle, Column, ColumnInfo, ColumnMetadata, Row, SqlType, Value};
pub use engine::{BlobReader, Cell, Engine, Execution, Fetch, StatementHandle};
pub use error::{Error, Result};
pub use nullable::{
    Nullable, NullableBool, NullableBytes, NullableFloat32, NullableFloat64, NullableInt16,
    NullableInt32, NullableInt64, NullableString, NullableTime,
};
