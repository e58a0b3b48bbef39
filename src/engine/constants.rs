//! Engine type codes and related constants.
//!
//! Type codes follow the XSQLVAR `sqltype` numbering with the nullable bit
//! (the low bit) cleared.

// SQL type codes
pub const SQL_VARYING: u16 = 448;
pub const SQL_TEXT: u16 = 452;
pub const SQL_DOUBLE: u16 = 480;
pub const SQL_FLOAT: u16 = 482;
pub const SQL_LONG: u16 = 496;
pub const SQL_SHORT: u16 = 500;
pub const SQL_TIMESTAMP: u16 = 510;
pub const SQL_BLOB: u16 = 520;
pub const SQL_D_FLOAT: u16 = 530;
pub const SQL_ARRAY: u16 = 540;
pub const SQL_QUAD: u16 = 550;
pub const SQL_TYPE_TIME: u16 = 560;
pub const SQL_TYPE_DATE: u16 = 570;
pub const SQL_INT64: u16 = 580;
pub const SQL_BOOLEAN: u16 = 32764;

/// Nullable flag carried in the low bit of a raw `sqltype`.
pub const SQL_NULLABLE_FLAG: u16 = 1;

// BLOB subtypes
pub const BLOB_SUB_TYPE_BINARY: i16 = 0;
pub const BLOB_SUB_TYPE_TEXT: i16 = 1;

// Temporal encoding
/// Days between the engine date epoch (1858-11-17) and 1970-01-01.
pub const DATE_EPOCH_OFFSET_DAYS: i32 = 40_587;
/// Time values are counted in units of 1/10000 second.
pub const TIME_UNITS_PER_SECOND: u32 = 10_000;

/// Largest scale for which `10^scale` is an exactly representable `f64`.
pub const MAX_SCALE: i16 = 18;

// Defaults
pub const DEFAULT_PAGE_SIZE: u32 = 1024;
pub const DEFAULT_TEXT_LENGTH: u32 = 1;

// Engine error codes (isc_* numbering)
pub const ISC_UNIQUE_KEY_VIOLATION: i32 = 335_544_665;
pub const ISC_NO_DUP: i32 = 335_544_349;
pub const ISC_BAD_SEGSTR_ID: i32 = 335_544_329;
pub const ISC_BAD_STMT_HANDLE: i32 = 335_544_485;
pub const ISC_CONVERT_ERROR: i32 = 335_544_334;
pub const ISC_ARITH_EXCEPT: i32 = 335_544_321;
pub const ISC_IO_ERROR: i32 = 335_544_344;
