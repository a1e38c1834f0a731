//! Provider configuration loaded from YAML.

use std::path::Path;

use nexrad_common::{NexradError, NexradResult, RadarProductLevel};
use serde::Deserialize;
use tracing::{debug, info};

use crate::layout::KeyLayout;

/// Configuration for one catalog: a radar site in a public bucket.
///
/// ```yaml
/// level: level3
/// site: KLSX
/// product: N0Q
/// max_objects: 2500
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default = "default_level")]
    pub level: RadarProductLevel,
    /// ICAO identifier, e.g. `KLSX`.
    pub site: String,
    /// Level III product code, e.g. `N0Q`.
    #[serde(default)]
    pub product: Option<String>,
    /// Overrides the public bucket for the product level.
    #[serde(default)]
    pub bucket: Option<String>,
    #[serde(default = "default_region")]
    pub region: String,
    /// Soft cap on catalog entries before old days are pruned.
    #[serde(default = "default_max_objects")]
    pub max_objects: usize,
    /// Days the date ledger keeps regardless of the cap.
    #[serde(default = "default_min_dates")]
    pub min_dates_before_pruning: usize,
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
}

fn default_level() -> RadarProductLevel {
    RadarProductLevel::Level2
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_objects() -> usize {
    2500
}

fn default_min_dates() -> usize {
    4
}

fn default_refresh_interval() -> u64 {
    15
}

impl ProviderConfig {
    /// Level II configuration with defaults.
    pub fn level2(site: &str) -> Self {
        Self {
            level: RadarProductLevel::Level2,
            site: site.to_string(),
            product: None,
            bucket: None,
            region: default_region(),
            max_objects: default_max_objects(),
            min_dates_before_pruning: default_min_dates(),
            refresh_interval_secs: default_refresh_interval(),
        }
    }

    /// Level III configuration with defaults.
    pub fn level3(site: &str, product: &str) -> Self {
        Self {
            level: RadarProductLevel::Level3,
            product: Some(product.to_string()),
            ..Self::level2(site)
        }
    }

    pub fn from_yaml_str(content: &str) -> NexradResult<Self> {
        let config: Self = serde_yaml::from_str(content)
            .map_err(|e| NexradError::ConfigError(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        debug!(site = %config.site, level = %config.level, "Parsed provider config");
        Ok(config)
    }

    pub fn load(path: &Path) -> NexradResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_yaml_str(&content)?;
        info!(path = %path.display(), site = %config.site, "Loaded provider config");
        Ok(config)
    }

    pub fn validate(&self) -> NexradResult<()> {
        if self.site.len() != 4 || !self.site.is_ascii() {
            return Err(NexradError::ConfigError(format!(
                "Site must be a 4-letter ICAO identifier: {}",
                self.site
            )));
        }
        if self.level == RadarProductLevel::Level3 && self.product.is_none() {
            return Err(NexradError::ConfigError(
                "Level III configuration requires a product".to_string(),
            ));
        }
        Ok(())
    }

    /// Bucket to list, falling back to the public bucket for the level.
    pub fn bucket(&self) -> &str {
        self.bucket
            .as_deref()
            .unwrap_or_else(|| self.level.default_bucket())
    }

    pub fn layout(&self) -> KeyLayout {
        match self.level {
            RadarProductLevel::Level2 => KeyLayout::Level2,
            RadarProductLevel::Level3 => KeyLayout::Level3 {
                product: self.product.clone().unwrap_or_default(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ProviderConfig::from_yaml_str("site: KLSX\n").unwrap();
        assert_eq!(config.level, RadarProductLevel::Level2);
        assert_eq!(config.bucket(), "noaa-nexrad-level2");
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.max_objects, 2500);
        assert_eq!(config.min_dates_before_pruning, 4);
        assert_eq!(config.refresh_interval_secs, 15);
        assert_eq!(config.layout(), KeyLayout::Level2);
    }

    #[test]
    fn test_level3_config() {
        let yaml = "level: level3\nsite: KTLX\nproduct: N0B\nbucket: my-mirror\n";
        let config = ProviderConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.bucket(), "my-mirror");
        assert_eq!(
            config.layout(),
            KeyLayout::Level3 {
                product: "N0B".to_string()
            }
        );
    }

    #[test]
    fn test_level3_requires_product() {
        let err = ProviderConfig::from_yaml_str("level: level3\nsite: KTLX\n").unwrap_err();
        assert!(matches!(err, NexradError::ConfigError(_)));
    }

    #[test]
    fn test_invalid_site() {
        assert!(ProviderConfig::from_yaml_str("site: LSX\n").is_err());
        assert!(ProviderConfig::from_yaml_str("max_objects: 10\n").is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = test_utils::temp_test_dir();
        let path = dir.path().join("klsx.yaml");
        std::fs::write(&path, "site: KLSX\nmax_objects: 100\n").unwrap();

        let config = ProviderConfig::load(&path).unwrap();
        assert_eq!(config.max_objects, 100);
        assert!(ProviderConfig::load(&dir.path().join("missing.yaml")).is_err());
    }

    #[test]
    fn test_level3_constructor() {
        let config = ProviderConfig::level3("KLSX", "N0Q");
        assert_eq!(config.bucket(), "unidata-nexrad-level3");
        assert!(config.validate().is_ok());
    }
}
