//! Common test utilities for nexrad-provider tests
//!
//! Provides helpers for:
//! - Building catalogs over an in-memory bucket
//! - Seeding the bucket with a day of keys

use std::sync::Arc;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use nexrad_provider::{AwsNexradDataProvider, MemoryObjectSource, ProviderConfig};

/// A catalog over a fresh in-memory bucket.
#[allow(dead_code)]
pub fn catalog(config: ProviderConfig) -> (Arc<MemoryObjectSource>, AwsNexradDataProvider) {
    let source = Arc::new(MemoryObjectSource::new());
    let provider = AwsNexradDataProvider::new(&config, source.clone());
    (source, provider)
}

/// Last-modified time given to a seeded object starting at `time`.
#[allow(dead_code)]
pub fn modified_at(time: DateTime<Utc>) -> DateTime<Utc> {
    time + Duration::seconds(30)
}

/// Insert Level II keys for `site` every `step_minutes` through `day`.
/// Returns the start times in key order.
#[allow(dead_code)]
pub fn seed_level2_day(
    source: &MemoryObjectSource,
    site: &str,
    day: NaiveDate,
    step_minutes: u32,
) -> Vec<DateTime<Utc>> {
    let start = Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN));
    let keys = test_utils::level2_day_keys(site, day, step_minutes);

    keys.iter()
        .enumerate()
        .map(|(i, key)| {
            let time = start + Duration::minutes(i as i64 * i64::from(step_minutes));
            source.insert(key, modified_at(time), &b"volume"[..]);
            time
        })
        .collect()
}
