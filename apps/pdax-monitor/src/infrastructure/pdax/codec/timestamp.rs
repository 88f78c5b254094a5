//! Venue Timestamps
//!
//! PDAX encodes instants as a float count of seconds since
//! 2000-01-01T00:00:00Z. The browser client turns that into a calendar date
//! with a civil-from-days routine over a March-based year; this module
//! reproduces that routine step by step so that decoded dates agree with
//! what the venue displays, including around month and leap-year edges.
//!
//! Every intermediate division floors toward negative infinity, which keeps
//! instants before the epoch on the correct day.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

use super::CodecError;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Days between 0000-03-01 and the venue epoch.
const EPOCH_DAY_OFFSET: f64 = 730_425.0;

/// Days in a 400-year Gregorian cycle.
const DAYS_PER_ERA: f64 = 146_097.0;

/// Decode a venue timestamp into a UTC instant (whole seconds).
///
/// # Errors
///
/// Returns [`CodecError::InvalidTimestamp`] for non-finite values or values
/// that fall outside the supported calendar range.
#[allow(clippy::cast_possible_truncation)]
pub fn decode_timestamp(encoded: f64) -> Result<DateTime<Utc>, CodecError> {
    if !encoded.is_finite() {
        return Err(CodecError::InvalidTimestamp(encoded));
    }

    let day = (encoded / SECONDS_PER_DAY).floor() + EPOCH_DAY_OFFSET;

    let era = (day / DAYS_PER_ERA).floor();
    let day_of_era = day - DAYS_PER_ERA * era;
    let year_of_era = ((day_of_era - (day_of_era / 1460.0).floor()
        + (day_of_era / 36_524.0).floor()
        - (day_of_era / 146_096.0).floor())
        / 365.0)
        .floor();
    let day_of_year =
        day_of_era - (365.0 * year_of_era + (year_of_era / 4.0).floor() - (year_of_era / 100.0).floor());
    let month_index = ((5.0 * day_of_year + 2.0) / 153.0).floor();
    let month = if month_index < 10.0 {
        month_index + 3.0
    } else {
        month_index - 9.0
    };
    let year = year_of_era + 400.0 * era + if month <= 2.0 { 1.0 } else { 0.0 };
    let day_of_month = day_of_year - ((153.0 * month_index + 2.0) / 5.0).floor() + 1.0;

    let hour = (encoded / 3600.0).floor().rem_euclid(24.0);
    let minute = (encoded / 60.0).floor().rem_euclid(60.0);
    let second = encoded.rem_euclid(60.0).floor();

    let date = NaiveDate::from_ymd_opt(year as i32, month as u32, day_of_month as u32)
        .ok_or(CodecError::InvalidTimestamp(encoded))?;
    let datetime = date
        .and_hms_opt(hour as u32, minute as u32, second as u32)
        .ok_or(CodecError::InvalidTimestamp(encoded))?;

    Ok(Utc.from_utc_datetime(&datetime))
}
