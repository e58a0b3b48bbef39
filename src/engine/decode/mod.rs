//! Decoders for engine-native cell encodings.
//!
//! Each family of types has its own module with decode functions and the
//! matching encoders used by engine bindings.
//!
//! | Type code | Module |
//! |-----------|--------|
//! | SHORT, LONG, INT64, FLOAT, DOUBLE, BOOLEAN | `number` |
//! | TYPE_DATE, TYPE_TIME, TIMESTAMP | `date` |
//!
//! TEXT and VARYING cells are plain bytes and don't need a dedicated decoder.

mod date;
mod number;

pub use date::{
    decode_date, decode_time, decode_timestamp, encode_date, encode_time, encode_timestamp,
};
pub use number::{
    decode_bool, decode_f32, decode_f64, decode_i16, decode_i32, decode_i64, encode_scaled,
    scale_integer,
};
