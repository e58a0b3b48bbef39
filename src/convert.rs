//! Type conversion from engine cells to host values.
//!
//! Two paths share one decoder:
//!
//! - **Natural** (`decode_value`): each type code maps to a default host type.
//!   Used by `Cursor::row` and `Cursor::row_map`.
//! - **Requested** (`ScanTarget`): the natural value is then converted into
//!   the destination the caller asked for, widening or narrowing numbers only
//!   when no information is lost.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::engine::connect::Zone;
use crate::engine::decode::{
    decode_bool, decode_date, decode_f32, decode_f64, decode_i16, decode_i32, decode_i64,
    decode_time, decode_timestamp, scale_integer,
};
use crate::engine::types::{Column, SqlType, Value};
use crate::engine::{BlobReader, Cell};
use crate::error::{Error, Result};
use crate::nullable::Nullable;

/// Largest integer magnitude an `f32` holds exactly.
const F32_EXACT_INT: i64 = 1 << 24;
/// Largest integer magnitude an `f64` holds exactly.
const F64_EXACT_INT: i64 = 1 << 53;

/// Convert a cell to the natural host value for its column.
///
/// BLOB handles are dereferenced through `blobs`; inline BLOB data (an
/// engine may prefetch small BLOBs) is used as is. Bytes are always copied
/// out of the cell. Text that is not valid UTF-8 is a conversion error.
pub fn decode_value<B: BlobReader + ?Sized>(
    column: &Column,
    cell: &Cell,
    time_zone: &Zone,
    blobs: &mut B,
) -> Result<Value> {
    let data = match cell {
        Cell::Null => return Ok(Value::Null),
        Cell::Blob(handle) => {
            if !column.sql_type.is_blob() {
                return Err(Error::decode(format!(
                    "Unexpected BLOB handle in {} column {}",
                    column.sql_type, column.name
                )));
            }
            return blob_value(column, blobs.read_blob(*handle)?);
        }
        Cell::Data(data) => data.as_ref(),
    };

    let value = match &column.sql_type {
        SqlType::Text { .. } | SqlType::Varying { .. } => Value::Text(text(column, data.to_vec())?),
        SqlType::Short { scale } => {
            let raw = decode_i16(data)?;
            scaled(raw as i64, *scale, || Value::Short(raw))?
        }
        SqlType::Long { scale } => {
            let raw = decode_i32(data)?;
            scaled(raw as i64, *scale, || Value::Int(raw))?
        }
        SqlType::Int64 { scale } => {
            let raw = decode_i64(data)?;
            scaled(raw, *scale, || Value::BigInt(raw))?
        }
        SqlType::Float => Value::Float(decode_f32(data)?),
        SqlType::Double => Value::Double(decode_f64(data)?),
        SqlType::Boolean => Value::Bool(decode_bool(data)?),
        SqlType::Date => {
            let midnight = decode_date(data)?
                .and_hms_opt(0, 0, 0)
                .ok_or_else(|| Error::decode("Invalid DATE"))?;
            Value::Timestamp(localize(midnight, time_zone)?)
        }
        SqlType::Time => {
            let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or(NaiveDate::MIN);
            Value::Timestamp(localize(epoch.and_time(decode_time(data)?), time_zone)?)
        }
        SqlType::Timestamp => Value::Timestamp(localize(decode_timestamp(data)?, time_zone)?),
        SqlType::TextBlob | SqlType::Blob { .. } => blob_value(column, data.to_vec())?,
    };
    Ok(value)
}

fn scaled(raw: i64, scale: i16, unscaled: impl FnOnce() -> Value) -> Result<Value> {
    if scale > 0 {
        Ok(Value::Double(scale_integer(raw, scale)?))
    } else {
        Ok(unscaled())
    }
}

fn blob_value(column: &Column, bytes: Vec<u8>) -> Result<Value> {
    match column.sql_type {
        SqlType::TextBlob => Ok(Value::Text(text(column, bytes)?)),
        _ => Ok(Value::Bytes(bytes)),
    }
}

fn text(column: &Column, bytes: Vec<u8>) -> Result<String> {
    String::from_utf8(bytes).map_err(|e| {
        Error::conversion(
            &column.name,
            format!("invalid UTF-8 in {} value: {}", column.sql_type, e.utf8_error()),
        )
    })
}

fn localize(naive: NaiveDateTime, time_zone: &Zone) -> Result<DateTime<FixedOffset>> {
    time_zone
        .localize(&naive)
        .ok_or_else(|| Error::decode(format!("Cannot localize {} to {}", naive, time_zone)))
}

/// Conversion from a non-NULL natural value into a requested host type.
pub trait FromValue: Sized {
    /// Name used in conversion errors.
    const TYPE_NAME: &'static str;

    /// Returns `None` if the value cannot be represented.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for bool {
    const TYPE_NAME: &'static str = "bool";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(b),
            Value::Short(v) => Some(v != 0),
            Value::Int(v) => Some(v != 0),
            Value::BigInt(v) => Some(v != 0),
            _ => None,
        }
    }
}

macro_rules! impl_from_value_int {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl FromValue for $ty {
                const TYPE_NAME: &'static str = $name;

                fn from_value(value: Value) -> Option<Self> {
                    <$ty>::try_from(value.to_i64()?).ok()
                }
            }
        )*
    };
}

impl_from_value_int! {
    i16 => "i16",
    i32 => "i32",
    i64 => "i64",
}

/// A double narrows to `f32` only when the round trip is exact, so
/// `123456789.24` is rejected rather than read as `123456792.0`.
impl FromValue for f32 {
    const TYPE_NAME: &'static str = "f32";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            Value::Double(v) if !v.is_finite() || (v as f32) as f64 == v => Some(v as f32),
            Value::Short(v) => Some(v as f32),
            Value::Int(v) if (v as i64).abs() <= F32_EXACT_INT => Some(v as f32),
            Value::BigInt(v) if v.unsigned_abs() <= F32_EXACT_INT as u64 => Some(v as f32),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    const TYPE_NAME: &'static str = "f64";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v as f64),
            Value::Double(v) => Some(v),
            Value::Short(v) => Some(v as f64),
            Value::Int(v) => Some(v as f64),
            Value::BigInt(v) if v.unsigned_abs() <= F64_EXACT_INT as u64 => Some(v as f64),
            _ => None,
        }
    }
}

impl FromValue for String {
    const TYPE_NAME: &'static str = "String";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    const TYPE_NAME: &'static str = "bytes";

    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(b) => Some(b),
            Value::Text(s) => Some(s.into_bytes()),
            _ => None,
        }
    }
}

impl FromValue for DateTime<FixedOffset> {
    const TYPE_NAME: &'static str = "timestamp";

    fn from_value(value: Value) -> Option<Self> {
        value.as_timestamp()
    }
}

fn convert<T: FromValue>(value: Value, column: &Column) -> Result<T> {
    let from = value.type_name();
    T::from_value(value).ok_or_else(|| {
        Error::conversion(
            &column.name,
            format!("cannot convert {} ({}) to {}", from, column.sql_type, T::TYPE_NAME),
        )
    })
}

/// A destination accepted by `Cursor::scan`.
///
/// Implemented for every `FromValue` type (rejects NULL), for `Nullable<T>`
/// and `Option<T>` of those (accept NULL), and for `Value` (accepts anything).
pub trait ScanTarget {
    /// Store a column's natural value into this destination.
    fn scan_value(&mut self, value: Value, column: &Column) -> Result<()>;
}

macro_rules! impl_scan_target {
    ($($ty:ty),* $(,)?) => {
        $(
            impl ScanTarget for $ty {
                fn scan_value(&mut self, value: Value, column: &Column) -> Result<()> {
                    if value.is_null() {
                        return Err(Error::conversion(
                            &column.name,
                            format!("cannot scan NULL into {}", <$ty as FromValue>::TYPE_NAME),
                        ));
                    }
                    *self = convert(value, column)?;
                    Ok(())
                }
            }

            impl ScanTarget for Nullable<$ty> {
                fn scan_value(&mut self, value: Value, column: &Column) -> Result<()> {
                    *self = if value.is_null() {
                        Nullable::null()
                    } else {
                        Nullable::new(convert(value, column)?)
                    };
                    Ok(())
                }
            }

            impl ScanTarget for Option<$ty> {
                fn scan_value(&mut self, value: Value, column: &Column) -> Result<()> {
                    *self = if value.is_null() {
                        None
                    } else {
                        Some(convert(value, column)?)
                    };
                    Ok(())
                }
            }
        )*
    };
}

impl_scan_target!(bool, i16, i32, i64, f32, f64, String, Vec<u8>, DateTime<FixedOffset>);

impl ScanTarget for Value {
    fn scan_value(&mut self, value: Value, _column: &Column) -> Result<()> {
        *self = value;
        Ok(())
    }
}

/// Build a destination list for `Cursor::scan`.
///
/// ```ignore
/// let (mut id, mut name) = (0i64, NullableString::default());
/// cursor.scan(targets![id, name])?;
/// ```
#[macro_export]
macro_rules! targets {
    () => {
        &mut [] as &mut [&mut dyn $crate::ScanTarget]
    };
    ($($dest:expr),+ $(,)?) => {
        &mut [$(&mut $dest as &mut dyn $crate::ScanTarget),+] as &mut [&mut dyn $crate::ScanTarget]
    };
}
