//! Error types for the database access layer.

use std::io;
use thiserror::Error;

use crate::engine::constants::{ISC_NO_DUP, ISC_UNIQUE_KEY_VIOLATION};

/// Result type alias for database operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for connection, cursor and conversion operations.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error during database file lifecycle operations.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Failure reported by the engine, passed through verbatim.
    #[error("{message}")]
    Engine { code: i32, message: String },

    /// The cursor just ran out of rows.
    #[error("End of data.")]
    EndOfData,

    /// `next()` was called again after the cursor ran out of rows.
    #[error("Cursor is past end of data.")]
    PastEndOfData,

    /// Row access without a current row.
    #[error("Cursor has no current row.")]
    NoCurrentRow,

    /// Operation on a closed cursor.
    #[error("Cursor is closed.")]
    CursorClosed,

    /// Connection closed.
    #[error("Connection closed")]
    ConnectionClosed,

    /// A column value cannot be represented in the destination type.
    #[error("Conversion error in column {column}: {message}")]
    Conversion { column: String, message: String },

    /// Scan destination count differs from the column count.
    #[error("Scan expected {expected} destinations, got {actual}")]
    Arity { expected: usize, actual: usize },

    /// Malformed engine-native cell data.
    #[error("Decode error: {message}")]
    Decode { message: String },

    /// Column not found.
    #[error("Column not found: {name}")]
    ColumnNotFound { name: String },

    /// Column index out of bounds.
    #[error("Column index {index} out of bounds (columns: {count})")]
    ColumnIndexOutOfBounds { index: usize, count: usize },

    /// Unsupported column type.
    #[error("Unsupported SQL type: {type_code}")]
    UnsupportedType { type_code: u16 },

    /// Invalid connect string.
    #[error("Invalid connect string: {message}")]
    InvalidConnectString { message: String },

    /// Time zone that is not a fixed UTC offset.
    #[error("Invalid time zone: {zone}")]
    InvalidTimeZone { zone: String },

    /// `create` found an existing database.
    #[error("Database already exists: {path}")]
    DatabaseExists { path: String },

    /// `connect` or `drop` found no database.
    #[error("Database not found: {path}")]
    DatabaseNotFound { path: String },
}

impl Error {
    /// Create an engine error.
    pub fn engine(code: i32, message: impl Into<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
        }
    }

    /// Create a conversion error for a column.
    pub fn conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Conversion {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Create a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Engine error code, if this is an engine error.
    pub fn engine_code(&self) -> Option<i32> {
        match self {
            Self::Engine { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Whether the engine rejected a statement for violating a unique or
    /// primary key constraint.
    pub fn is_duplicate(&self) -> bool {
        matches!(
            self.engine_code(),
            Some(ISC_UNIQUE_KEY_VIOLATION) | Some(ISC_NO_DUP)
        )
    }

    /// Whether this is the end-of-data signal.
    pub fn is_end_of_data(&self) -> bool {
        matches!(self, Self::EndOfData)
    }
}
