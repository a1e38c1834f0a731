//! Time handling utilities for NEXRAD data.
//!
//! WSR-88D messages stamp times as a modified Julian date, where day 1 is
//! 1970-01-01, plus milliseconds (or seconds) past midnight UTC.

use chrono::{DateTime, Days, Duration, NaiveDate, NaiveDateTime, TimeZone, Utc};
use thiserror::Error;

/// Convert a NEXRAD modified Julian date and milliseconds-of-day to UTC.
///
/// Julian date 0 is treated as day 1, matching how the radar stamps
/// uninitialized fields. Returns `None` when the date is outside chrono's
/// representable range.
pub fn julian_to_datetime(julian_date: u32, milliseconds: u32) -> Option<DateTime<Utc>> {
    let days = u64::from(julian_date.max(1)) - 1;
    DateTime::<Utc>::UNIX_EPOCH
        .checked_add_days(Days::new(days))?
        .checked_add_signed(Duration::milliseconds(i64::from(milliseconds)))
}

/// Convert a calendar day to its NEXRAD modified Julian date.
pub fn julian_day(date: NaiveDate) -> u32 {
    let epoch = DateTime::<Utc>::UNIX_EPOCH.date_naive();
    let days = (date - epoch).num_days();
    (days + 1).max(0) as u32
}

/// Parse a fixed-width timestamp embedded in an object key.
///
/// `offset` and `len` select the substring; `format` is a chrono format
/// string describing it.
pub fn parse_key_timestamp(
    key: &str,
    offset: usize,
    len: usize,
    format: &str,
) -> Result<DateTime<Utc>, TimeParseError> {
    let slice = key
        .get(offset..offset + len)
        .ok_or_else(|| TimeParseError::OutOfRange(key.to_string()))?;

    let naive = NaiveDateTime::parse_from_str(slice, format)
        .map_err(|_| TimeParseError::InvalidFormat(slice.to_string()))?;

    Ok(Utc.from_utc_datetime(&naive))
}

/// Time parsing errors.
#[derive(Debug, Clone, Error)]
pub enum TimeParseError {
    #[error("Invalid time format: {0}")]
    InvalidFormat(String),

    #[error("Timestamp substring out of range: {0}")]
    OutOfRange(String),
}
