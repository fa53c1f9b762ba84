//! Sample timestamp decoding.
//!
//! Prometheus encodes sample times as decimal Unix seconds with a
//! fractional part (`1571988825.63`). Parsing that text as one `f64`
//! cannot represent sub-second offsets exactly at current epoch
//! magnitudes, so [`decode_timestamp`] splits the text and parses seconds
//! and nanoseconds as integers.

use chrono::{DateTime, Utc};

use crate::error::DecodeError;

const NANOS_DIGITS: usize = 9;

/// Decode `seconds[.fraction]` into an exact UTC instant.
///
/// The fraction is right-padded with zeros (or truncated) to nine digits
/// and read as nanoseconds, so `"10.5"` is 10 s + 500 000 000 ns.
pub fn decode_timestamp(raw: &str) -> Result<DateTime<Utc>, DecodeError> {
    let invalid = |reason| DecodeError::InvalidTimestamp {
        raw: raw.to_string(),
        reason,
    };

    let (secs, fraction) = raw.split_once('.').unwrap_or((raw, ""));

    let secs: i64 = secs
        .parse()
        .map_err(|_| invalid("seconds are not an integer"))?;

    if !fraction.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid("fraction is not a decimal number"));
    }
    let nanos: u32 = pad_nanos(fraction)
        .parse()
        .map_err(|_| invalid("fraction is not a decimal number"))?;

    DateTime::from_timestamp(secs, nanos).ok_or_else(|| invalid("out of range"))
}

fn pad_nanos(fraction: &str) -> String {
    let mut digits: String = fraction.chars().take(NANOS_DIGITS).collect();
    while digits.len() < NANOS_DIGITS {
        digits.push('0');
    }
    digits
}

/// Convert a float number of Unix seconds to an instant.
///
/// Lossy: `1571988825.63` becomes `...825.630000128`. Only for callers that
/// never had the decimal text; the response decoder does not use it.
pub fn timestamp_from_float_secs(secs: f64) -> Option<DateTime<Utc>> {
    let nanos = (secs * 1_000_000_000.0).round();
    if !nanos.is_finite() || nanos.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(DateTime::from_timestamp_nanos(nanos as i64))
}
