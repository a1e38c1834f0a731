//! Object key layouts of the public NEXRAD buckets.
//!
//! Level II: `YYYY/MM/DD/GGGG/GGGGYYYYMMDD_HHMMSS[_V##]`
//! Level III: `SSS_PPP_YYYY_MM_DD_HH_MM_SS`, where `SSS` is the ICAO without
//! its leading letter.

use chrono::{DateTime, NaiveDate, Utc};
use nexrad_common::{parse_key_timestamp, RadarProductLevel};
use tracing::warn;

const LEVEL2_TIME_FORMAT: &str = "%Y%m%d_%H%M%S";
const LEVEL2_TIME_LEN: usize = 15;

const LEVEL3_TIME_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";
const LEVEL3_TIME_LEN: usize = 19;
const LEVEL3_TIME_OFFSET: usize = 8;

/// How keys are named for one product level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyLayout {
    Level2,
    Level3 { product: String },
}

impl KeyLayout {
    pub fn level(&self) -> RadarProductLevel {
        match self {
            KeyLayout::Level2 => RadarProductLevel::Level2,
            KeyLayout::Level3 { .. } => RadarProductLevel::Level3,
        }
    }

    /// Listing prefix for `site` on `date`.
    pub fn prefix(&self, site: &str, date: NaiveDate) -> String {
        match self {
            KeyLayout::Level2 => format!("{}/{}/", date.format("%Y/%m/%d"), site),
            KeyLayout::Level3 { product } => {
                format!("{}_{}_{}_", site_id(site), product, date.format("%Y_%m_%d"))
            }
        }
    }

    /// Start time encoded in `key`.
    pub fn time_point(&self, key: &str) -> Option<DateTime<Utc>> {
        match self {
            KeyLayout::Level2 => level2_time_point(key),
            KeyLayout::Level3 { .. } => level3_time_point(key),
        }
    }
}

/// Three-letter site id used in Level III keys.
pub fn site_id(icao: &str) -> &str {
    icao.get(1..).unwrap_or(icao)
}

/// Start time of a Level II key. A bare file name (no `/`) starts with the
/// four-letter ICAO.
pub fn level2_time_point(key: &str) -> Option<DateTime<Utc>> {
    let offset = key.rfind('/').map(|i| i + 5).unwrap_or(4);
    parse_key_timestamp(key, offset, LEVEL2_TIME_LEN, LEVEL2_TIME_FORMAT)
        .map_err(|e| warn!(key = %key, error = %e, "Time not parsable from key"))
        .ok()
}

/// Start time of a Level III key.
pub fn level3_time_point(key: &str) -> Option<DateTime<Utc>> {
    parse_key_timestamp(key, LEVEL3_TIME_OFFSET, LEVEL3_TIME_LEN, LEVEL3_TIME_FORMAT)
        .map_err(|e| warn!(key = %key, error = %e, "Time not parsable from key"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_level2_prefix() {
        let date = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
        assert_eq!(KeyLayout::Level2.prefix("KLSX", date), "2023/04/01/KLSX/");
    }

    #[test]
    fn test_level3_prefix() {
        let date = NaiveDate::from_ymd_opt(2023, 4, 1).unwrap();
        let layout = KeyLayout::Level3 {
            product: "N0Q".to_string(),
        };
        assert_eq!(layout.prefix("KLSX", date), "LSX_N0Q_2023_04_01_");
    }

    #[test]
    fn test_level2_time_point() {
        let expected = Utc.with_ymd_and_hms(2023, 4, 1, 23, 59, 59).unwrap();
        assert_eq!(level2_time_point("KLSX20230401_235959_V06"), Some(expected));
        assert_eq!(
            level2_time_point("2023/04/01/KLSX/KLSX20230401_235959_V06"),
            Some(expected)
        );
        assert_eq!(
            level2_time_point("2013/05/20/KTLX/KTLX20130520_200356_V06.gz"),
            Some(Utc.with_ymd_and_hms(2013, 5, 20, 20, 3, 56).unwrap())
        );
    }

    #[test]
    fn test_level3_time_point() {
        let expected = Utc.with_ymd_and_hms(2023, 4, 1, 23, 59, 59).unwrap();
        assert_eq!(level3_time_point("LSX_N0Q_2023_04_01_23_59_59"), Some(expected));
    }

    #[test]
    fn test_unparsable_keys() {
        assert_eq!(level2_time_point("2023/04/01/KLSX/NWS_NEXRAD"), None);
        assert_eq!(level3_time_point("LSX_N0Q_2023"), None);
    }

    #[test]
    fn test_site_id() {
        assert_eq!(site_id("KLSX"), "LSX");
        assert_eq!(site_id(""), "");
    }
}
