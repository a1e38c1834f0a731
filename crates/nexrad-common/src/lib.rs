//! Common types and utilities shared across the NEXRAD crates.

pub mod error;
pub mod level;
pub mod time;

pub use error::{NexradError, NexradResult};
pub use level::RadarProductLevel;
pub use time::{julian_day, julian_to_datetime, parse_key_timestamp, TimeParseError};
