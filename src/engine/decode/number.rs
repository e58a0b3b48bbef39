//! Integer, floating-point and boolean cell decoders.
//!
//! Integer families are little-endian two's complement. Fixed-point
//! NUMERIC/DECIMAL columns are stored as a raw integer with a declared scale,
//! so `555` at scale 2 reads back as `5.55`.

use crate::engine::constants::MAX_SCALE;
use crate::error::{Error, Result};

fn fixed<const N: usize>(data: &[u8], what: &str) -> Result<[u8; N]> {
    data.try_into().map_err(|_| {
        Error::decode(format!(
            "{} value must be exactly {} bytes, got {}",
            what,
            N,
            data.len()
        ))
    })
}

/// Decode a SHORT cell.
pub fn decode_i16(data: &[u8]) -> Result<i16> {
    Ok(i16::from_le_bytes(fixed(data, "SHORT")?))
}

/// Decode a LONG cell.
pub fn decode_i32(data: &[u8]) -> Result<i32> {
    Ok(i32::from_le_bytes(fixed(data, "LONG")?))
}

/// Decode an INT64 cell.
pub fn decode_i64(data: &[u8]) -> Result<i64> {
    Ok(i64::from_le_bytes(fixed(data, "INT64")?))
}

/// Decode a FLOAT cell.
pub fn decode_f32(data: &[u8]) -> Result<f32> {
    Ok(f32::from_le_bytes(fixed(data, "FLOAT")?))
}

/// Decode a DOUBLE cell.
pub fn decode_f64(data: &[u8]) -> Result<f64> {
    Ok(f64::from_le_bytes(fixed(data, "DOUBLE")?))
}

/// Decode a BOOLEAN cell (one byte, non-zero is true).
pub fn decode_bool(data: &[u8]) -> Result<bool> {
    let [b] = fixed::<1>(data, "BOOLEAN")?;
    Ok(b != 0)
}

/// Apply a declared scale to a raw integer: `raw / 10^scale`.
///
/// Dividing by an exact power of ten keeps representable values exact,
/// e.g. `3030333` at scale 2 is the same `f64` as the literal `30303.33`.
pub fn scale_integer(raw: i64, scale: i16) -> Result<f64> {
    if !(0..=MAX_SCALE).contains(&scale) {
        return Err(Error::decode(format!("Unsupported scale: {}", scale)));
    }
    Ok(raw as f64 / 10f64.powi(scale as i32))
}

/// Encode a decimal value as a raw integer at the given scale.
///
/// Rounds half away from zero. Returns `None` if the result does not fit.
pub fn encode_scaled(value: f64, scale: i16) -> Option<i64> {
    if !(0..=MAX_SCALE).contains(&scale) || !value.is_finite() {
        return None;
    }
    let raw = (value * 10f64.powi(scale as i32)).round();
    if raw < i64::MIN as f64 || raw >= i64::MAX as f64 {
        return None;
    }
    Some(raw as i64)
}
