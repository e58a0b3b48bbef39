//! SQL data type enum with type-specific attributes.
//!
//! This enum represents the supported column types with their
//! type-specific metadata (scale, length, subtype).
//!
//! Note: Nullability is a column property, not a type property.

use crate::engine::constants::{
    BLOB_SUB_TYPE_TEXT, SQL_BLOB, SQL_BOOLEAN, SQL_DOUBLE, SQL_D_FLOAT, SQL_FLOAT, SQL_INT64,
    SQL_LONG, SQL_SHORT, SQL_TEXT, SQL_TIMESTAMP, SQL_TYPE_DATE, SQL_TYPE_TIME, SQL_VARYING,
};
use crate::error::{Error, Result};

/// SQL data type with type-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlType {
    /// CHAR(length) - fixed-length, space-padded string.
    Text { length: u32 },
    /// VARCHAR(length) - variable-length string.
    Varying { length: u32 },
    /// SMALLINT, or NUMERIC/DECIMAL(4, scale) when scale > 0.
    Short { scale: i16 },
    /// INTEGER, or NUMERIC/DECIMAL(9, scale) when scale > 0.
    Long { scale: i16 },
    /// BIGINT, or NUMERIC/DECIMAL(18, scale) when scale > 0.
    Int64 { scale: i16 },
    /// FLOAT - single precision.
    Float,
    /// DOUBLE PRECISION.
    Double,
    /// DATE - calendar date, no time of day.
    Date,
    /// TIME - time of day.
    Time,
    /// TIMESTAMP - date and time of day.
    Timestamp,
    /// BOOLEAN.
    Boolean,
    /// BLOB SUB_TYPE TEXT.
    TextBlob,
    /// BLOB with any non-text subtype.
    Blob { subtype: i16 },
}

impl SqlType {
    /// Create from a type code and column metadata.
    ///
    /// Returns `Err(Error::UnsupportedType)` for unsupported types.
    pub fn from_raw(type_code: u16, subtype: i16, scale: i16, length: u32) -> Result<Self> {
        match type_code {
            SQL_TEXT => Ok(SqlType::Text { length }),
            SQL_VARYING => Ok(SqlType::Varying { length }),
            SQL_SHORT => Ok(SqlType::Short { scale }),
            SQL_LONG => Ok(SqlType::Long { scale }),
            SQL_INT64 => Ok(SqlType::Int64 { scale }),
            SQL_FLOAT => Ok(SqlType::Float),
            SQL_DOUBLE | SQL_D_FLOAT => Ok(SqlType::Double),
            SQL_TYPE_DATE => Ok(SqlType::Date),
            SQL_TYPE_TIME => Ok(SqlType::Time),
            SQL_TIMESTAMP => Ok(SqlType::Timestamp),
            SQL_BOOLEAN => Ok(SqlType::Boolean),
            SQL_BLOB if subtype == BLOB_SUB_TYPE_TEXT => Ok(SqlType::TextBlob),
            SQL_BLOB => Ok(SqlType::Blob { subtype }),
            _ => Err(Error::UnsupportedType { type_code }),
        }
    }

    /// Get the type code.
    pub fn type_code(&self) -> u16 {
        match self {
            SqlType::Text { .. } => SQL_TEXT,
            SqlType::Varying { .. } => SQL_VARYING,
            SqlType::Short { .. } => SQL_SHORT,
            SqlType::Long { .. } => SQL_LONG,
            SqlType::Int64 { .. } => SQL_INT64,
            SqlType::Float => SQL_FLOAT,
            SqlType::Double => SQL_DOUBLE,
            SqlType::Date => SQL_TYPE_DATE,
            SqlType::Time => SQL_TYPE_TIME,
            SqlType::Timestamp => SQL_TIMESTAMP,
            SqlType::Boolean => SQL_BOOLEAN,
            SqlType::TextBlob | SqlType::Blob { .. } => SQL_BLOB,
        }
    }

    /// Get scale (for integer families, 0 otherwise).
    pub fn scale(&self) -> i16 {
        match self {
            SqlType::Short { scale } | SqlType::Long { scale } | SqlType::Int64 { scale } => {
                *scale
            }
            _ => 0,
        }
    }

    /// Whether the column holds a fixed-point decimal.
    pub fn is_scaled(&self) -> bool {
        self.scale() > 0
    }

    /// Whether cells of this type are BLOB handles.
    pub fn is_blob(&self) -> bool {
        matches!(self, SqlType::TextBlob | SqlType::Blob { .. })
    }

    /// Whether this is a date, time or timestamp.
    pub fn is_temporal(&self) -> bool {
        matches!(self, SqlType::Date | SqlType::Time | SqlType::Timestamp)
    }
}

impl std::fmt::Display for SqlType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlType::Text { length } => write!(f, "CHAR({})", length),
            SqlType::Varying { length } => write!(f, "VARCHAR({})", length),
            SqlType::Short { scale: 0 } => write!(f, "SMALLINT"),
            SqlType::Short { scale } => write!(f, "NUMERIC(4,{})", scale),
            SqlType::Long { scale: 0 } => write!(f, "INTEGER"),
            SqlType::Long { scale } => write!(f, "NUMERIC(9,{})", scale),
            SqlType::Int64 { scale: 0 } => write!(f, "BIGINT"),
            SqlType::Int64 { scale } => write!(f, "NUMERIC(18,{})", scale),
            SqlType::Float => write!(f, "FLOAT"),
            SqlType::Double => write!(f, "DOUBLE PRECISION"),
            SqlType::Date => write!(f, "DATE"),
            SqlType::Time => write!(f, "TIME"),
            SqlType::Timestamp => write!(f, "TIMESTAMP"),
            SqlType::Boolean => write!(f, "BOOLEAN"),
            SqlType::TextBlob => write!(f, "BLOB SUB_TYPE TEXT"),
            SqlType::Blob { subtype } => write!(f, "BLOB SUB_TYPE {}", subtype),
        }
    }
}
