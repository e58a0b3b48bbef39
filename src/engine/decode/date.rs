//! Temporal cell decoders.
//!
//! - TYPE_DATE: 4 bytes, signed day count since 1858-11-17
//! - TYPE_TIME: 4 bytes, unsigned count of 1/10000 second since midnight
//! - TIMESTAMP: TYPE_DATE followed by TYPE_TIME (8 bytes)
//!
//! All values are little-endian and carry no time zone. The converter
//! attaches the connection's default zone.

use crate::engine::constants::TIME_UNITS_PER_SECOND;
use crate::error::{Error, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

const NANOS_PER_UNIT: u32 = 1_000_000_000 / TIME_UNITS_PER_SECOND;

fn date_epoch() -> NaiveDate {
    // 1858-11-17 is always a valid date.
    NaiveDate::from_ymd_opt(1858, 11, 17).unwrap_or(NaiveDate::MIN)
}

/// Decode a TYPE_DATE cell.
///
/// # Example
/// ```ignore
/// let date = decode_date(&56_575i32.to_le_bytes())?;
/// // Returns: 2013-10-10
/// ```
pub fn decode_date(data: &[u8]) -> Result<NaiveDate> {
    let bytes: [u8; 4] = data.try_into().map_err(|_| {
        Error::decode(format!(
            "DATE value must be exactly 4 bytes, got {}",
            data.len()
        ))
    })?;
    let days = i32::from_le_bytes(bytes);
    date_epoch()
        .checked_add_signed(Duration::days(days as i64))
        .ok_or_else(|| Error::decode(format!("DATE out of range: {} days", days)))
}

/// Decode a TYPE_TIME cell.
pub fn decode_time(data: &[u8]) -> Result<NaiveTime> {
    let bytes: [u8; 4] = data.try_into().map_err(|_| {
        Error::decode(format!(
            "TIME value must be exactly 4 bytes, got {}",
            data.len()
        ))
    })?;
    let units = u32::from_le_bytes(bytes);
    let secs = units / TIME_UNITS_PER_SECOND;
    let nanos = (units % TIME_UNITS_PER_SECOND) * NANOS_PER_UNIT;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
        .ok_or_else(|| Error::decode(format!("Invalid TIME: {} units", units)))
}

/// Decode a TIMESTAMP cell.
pub fn decode_timestamp(data: &[u8]) -> Result<NaiveDateTime> {
    if data.len() != 8 {
        return Err(Error::decode(format!(
            "TIMESTAMP value must be exactly 8 bytes, got {}",
            data.len()
        )));
    }
    let date = decode_date(&data[..4])?;
    let time = decode_time(&data[4..])?;
    Ok(NaiveDateTime::new(date, time))
}

/// Encode a date as a TYPE_DATE cell.
pub fn encode_date(date: NaiveDate) -> [u8; 4] {
    let days = date.signed_duration_since(date_epoch()).num_days() as i32;
    days.to_le_bytes()
}

/// Encode a time as a TYPE_TIME cell. Sub-unit precision is truncated.
pub fn encode_time(time: NaiveTime) -> [u8; 4] {
    // Leap-second nanos (>= 1e9) are folded into the last unit of the second.
    let frac = (time.nanosecond() / NANOS_PER_UNIT).min(TIME_UNITS_PER_SECOND - 1);
    let units = time.num_seconds_from_midnight() * TIME_UNITS_PER_SECOND + frac;
    units.to_le_bytes()
}

/// Encode a date and time as a TIMESTAMP cell.
pub fn encode_timestamp(ts: NaiveDateTime) -> [u8; 8] {
    let mut out = [0u8; 8];
    out[..4].copy_from_slice(&encode_date(ts.date()));
    out[4..].copy_from_slice(&encode_time(ts.time()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Datelike;

    #[test]
    fn test_decode_date_epoch() {
        let date = decode_date(&0i32.to_le_bytes()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1858, 11, 17).unwrap());
    }

    #[test]
    fn test_decode_date_unix_epoch() {
        let date = decode_date(&40_587i32.to_le_bytes()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap());
    }

    #[test]
    fn test_decode_date_2013_10_10() {
        let date = decode_date(&56_575i32.to_le_bytes()).unwrap();
        assert_eq!(date.year(), 2013);
        assert_eq!(date.month(), 10);
        assert_eq!(date.day(), 10);
    }

    #[test]
    fn test_decode_date_before_epoch() {
        let date = decode_date(&(-1i32).to_le_bytes()).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(1858, 11, 16).unwrap());
    }

    #[test]
    fn test_decode_time() {
        // 08:42:00 = 31320 s
        let units = 31_320u32 * TIME_UNITS_PER_SECOND;
        let time = decode_time(&units.to_le_bytes()).unwrap();
        assert_eq!(time, NaiveTime::from_hms_opt(8, 42, 0).unwrap());
    }

    #[test]
    fn test_decode_time_fraction() {
        let units = 5u32 * TIME_UNITS_PER_SECOND + 1234;
        let time = decode_time(&units.to_le_bytes()).unwrap();
        assert_eq!(time, NaiveTime::from_hms_micro_opt(0, 0, 5, 123_400).unwrap());
    }

    #[test]
    fn test_decode_time_out_of_range() {
        let units = 86_400u32 * TIME_UNITS_PER_SECOND;
        assert!(decode_time(&units.to_le_bytes()).is_err());
    }

    #[test]
    fn test_decode_timestamp() {
        let ts = NaiveDate::from_ymd_opt(2013, 10, 10)
            .unwrap()
            .and_hms_opt(8, 42, 0)
            .unwrap();
        assert_eq!(decode_timestamp(&encode_timestamp(ts)).unwrap(), ts);
    }

    #[test]
    fn test_decode_wrong_length() {
        assert!(decode_date(&[1, 2, 3]).is_err());
        assert!(decode_time(&[1, 2, 3, 4, 5]).is_err());
        assert!(decode_timestamp(&[0; 4]).is_err());
    }

    #[test]
    fn test_encode_time_truncates_below_unit() {
        let time = NaiveTime::from_hms_nano_opt(0, 0, 1, 123_456_789).unwrap();
        let units = u32::from_le_bytes(encode_time(time));
        assert_eq!(units, TIME_UNITS_PER_SECOND + 1234);
    }
}
