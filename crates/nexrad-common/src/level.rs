//! Radar product tiers.

use serde::{Deserialize, Serialize};

/// NEXRAD product level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadarProductLevel {
    /// Base moment data (Archive II volumes).
    Level2,
    /// Derived products generated by the RPG.
    Level3,
}

impl RadarProductLevel {
    /// Default public bucket holding this product level.
    pub fn default_bucket(&self) -> &'static str {
        match self {
            RadarProductLevel::Level2 => "noaa-nexrad-level2",
            RadarProductLevel::Level3 => "unidata-nexrad-level3",
        }
    }
}

impl std::fmt::Display for RadarProductLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RadarProductLevel::Level2 => write!(f, "level2"),
            RadarProductLevel::Level3 => write!(f, "level3"),
        }
    }
}
