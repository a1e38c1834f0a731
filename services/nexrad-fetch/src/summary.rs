//! JSON summaries of decoded files.

use chrono::{DateTime, Utc};
use serde::Serialize;
use wsr88d_parser::{Ar2vFile, Level3File, NexradFile};

#[derive(Debug, Serialize)]
#[serde(tag = "level", rename_all = "lowercase")]
pub enum FileSummary {
    Level2(VolumeSummary),
    Level3(ProductSummary),
}

#[derive(Debug, Serialize)]
pub struct VolumeSummary {
    pub key: String,
    pub icao: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub vcp: Option<u16>,
    pub elevation_angles: Vec<f64>,
    pub records: usize,
    pub skipped_records: usize,
    pub elevations: Vec<ElevationSummary>,
}

#[derive(Debug, Serialize)]
pub struct ElevationSummary {
    pub index: u16,
    pub radials: usize,
}

#[derive(Debug, Serialize)]
pub struct ProductSummary {
    pub key: String,
    pub icao: String,
    pub awips_id: String,
    pub product_code: i16,
    pub time: Option<DateTime<Utc>>,
    pub latitude: Option<f32>,
    pub longitude: Option<f32>,
    pub compressed: Option<bool>,
}

impl FileSummary {
    pub fn new(key: &str, file: &NexradFile) -> Self {
        match file {
            NexradFile::Level2(volume) => FileSummary::Level2(summarize_volume(key, volume)),
            NexradFile::Level3(product) => FileSummary::Level3(summarize_product(key, product)),
        }
    }
}

fn summarize_volume(key: &str, volume: &Ar2vFile) -> VolumeSummary {
    VolumeSummary {
        key: key.to_string(),
        icao: volume.icao().map(str::to_string),
        start_time: volume.start_time(),
        end_time: volume.end_time(),
        vcp: volume.vcp_data().map(|vcp| vcp.pattern_number),
        elevation_angles: volume
            .vcp_data()
            .map(|vcp| vcp.elevation_cuts.iter().map(|cut| cut.elevation_angle()).collect())
            .unwrap_or_default(),
        records: volume.record_count(),
        skipped_records: volume.skipped_records(),
        elevations: volume
            .radar_data()
            .iter()
            .map(|(index, scan)| ElevationSummary {
                index: *index,
                radials: scan.len(),
            })
            .collect(),
    }
}

fn summarize_product(key: &str, product: &Level3File) -> ProductSummary {
    let description = product.message.description_block();
    ProductSummary {
        key: key.to_string(),
        icao: product.icao().to_string(),
        awips_id: format!(
            "{}{}",
            product.wmo_header.product_category, product.wmo_header.product_designator
        ),
        product_code: product.message_header().message_code,
        time: product.message_header().time(),
        latitude: description.map(|d| d.latitude()),
        longitude: description.map(|d| d.longitude()),
        compressed: description.map(|d| d.is_compression_enabled()),
    }
}
