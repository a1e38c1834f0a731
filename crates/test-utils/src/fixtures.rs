//! Common test fixtures.
//!
//! Sites, archive keys and timestamps shared by the decoder and provider
//! tests. Keys follow the layouts of the public NEXRAD buckets.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};

/// St. Louis, MO.
pub const KLSX: &str = "KLSX";

/// Oklahoma City, OK.
pub const KTLX: &str = "KTLX";

/// Julian date (days since 1970-01-01, day 1 = 1970-01-01) of 2023-04-01.
pub const JULIAN_2023_04_01: u16 = 19449;

/// A Level II key on 2023-04-01 for KLSX.
pub const LEVEL2_KEY: &str = "2023/04/01/KLSX/KLSX20230401_235959_V06";

/// A Level III base reflectivity key on 2023-04-01 for KLSX.
pub const LEVEL3_KEY: &str = "LSX_N0Q_2023_04_01_23_59_59";

/// Build a UTC timestamp.
///
/// # Panics
///
/// Panics if the components do not form a valid time.
pub fn utc(year: i32, month: u32, day: u32, hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, second)
        .single()
        .expect("valid fixture timestamp")
}

/// Build a calendar date.
///
/// # Panics
///
/// Panics if the components do not form a valid date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// Level II key for `site` at `time`, with the `_V06` suffix.
pub fn level2_key(site: &str, time: DateTime<Utc>) -> String {
    format!(
        "{}/{}/{}{}_V06",
        time.format("%Y/%m/%d"),
        site,
        site,
        time.format("%Y%m%d_%H%M%S")
    )
}

/// Level III key for `site` and `product` at `time`. The site id drops the
/// leading ICAO letter.
pub fn level3_key(site: &str, product: &str, time: DateTime<Utc>) -> String {
    format!(
        "{}_{}_{}",
        site.get(1..).unwrap_or(site),
        product,
        time.format("%Y_%m_%d_%H_%M_%S")
    )
}

/// Level II keys for `site` every `step_minutes` through one day.
pub fn level2_day_keys(site: &str, day: NaiveDate, step_minutes: u32) -> Vec<String> {
    let start = Utc.from_utc_datetime(&day.and_hms_opt(0, 0, 0).expect("midnight"));
    (0..(24 * 60) / step_minutes.max(1))
        .map(|i| level2_key(site, start + chrono::Duration::minutes(i64::from(i * step_minutes))))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_keys() {
        let time = utc(2023, 4, 1, 23, 59, 59);
        assert_eq!(level2_key(KLSX, time), LEVEL2_KEY);
        assert_eq!(level3_key(KLSX, "N0Q", time), LEVEL3_KEY);
    }

    #[test]
    fn test_day_keys() {
        let keys = level2_day_keys(KTLX, date(2023, 4, 1), 60);
        assert_eq!(keys.len(), 24);
        assert_eq!(keys[0], "2023/04/01/KTLX/KTLX20230401_000000_V06");
        assert_eq!(keys[23], "2023/04/01/KTLX/KTLX20230401_230000_V06");
    }
}
