//! Product description block (halfwords 10-60).

use chrono::{DateTime, Utc};
use nexrad_common::julian_to_datetime;
use tracing::{trace, warn};

use crate::codec::{check_range, FieldReader};
use crate::error::{DecodeError, DecodeResult};

/// Products whose symbology may be bzip2 compressed.
const COMPRESSED_PRODUCTS: [i16; 32] = [
    32, 94, 99, 134, 135, 138, 149, 152, 153, 154, 155, 159, 161, 163, 165, 167, 168, 170, 172,
    173, 174, 175, 176, 177, 178, 179, 180, 182, 186, 193, 195, 202,
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDescriptionBlock {
    pub block_divider: i16,
    /// Thousandths of a degree.
    pub latitude_of_radar: i32,
    /// Thousandths of a degree.
    pub longitude_of_radar: i32,
    /// Feet above mean sea level.
    pub height_of_radar: i16,
    pub product_code: i16,
    pub operational_mode: u16,
    pub volume_coverage_pattern: u16,
    pub sequence_number: i16,
    pub volume_scan_number: u16,
    pub volume_scan_date: u16,
    /// Seconds past midnight UTC.
    pub volume_scan_start_time: u32,
    pub generation_date_of_product: u16,
    pub generation_time_of_product: u32,
    pub elevation_number: u16,
    /// Product dependent halfwords 31-35, usually threshold levels.
    pub data_levels: [u16; 5],
    /// Product dependent parameters 1-10.
    pub parameters: [u16; 10],
    pub version: u8,
    pub spot_blank: u8,
    /// Halfword offsets from the start of the message.
    pub offset_to_symbology: u32,
    pub offset_to_graphic: u32,
    pub offset_to_tabular: u32,
}

impl ProductDescriptionBlock {
    pub const SIZE: usize = 102;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let start = reader.position();

        let block_divider = reader.read_i16()?;
        let latitude_of_radar = reader.read_i32()?;
        let longitude_of_radar = reader.read_i32()?;
        let height_of_radar = reader.read_i16()?;
        let product_code = reader.read_i16()?;
        let operational_mode = reader.read_u16()?;
        let volume_coverage_pattern = reader.read_u16()?;
        let sequence_number = reader.read_i16()?;
        let volume_scan_number = reader.read_u16()?;
        let volume_scan_date = reader.read_u16()?;
        let volume_scan_start_time = reader.read_u32()?;
        let generation_date_of_product = reader.read_u16()?;
        let generation_time_of_product = reader.read_u32()?;

        let mut parameters = [0u16; 10];
        parameters[0] = reader.read_u16()?;
        parameters[1] = reader.read_u16()?;
        let elevation_number = reader.read_u16()?;
        parameters[2] = reader.read_u16()?;

        let mut data_levels = [0u16; 5];
        for level in data_levels.iter_mut() {
            *level = reader.read_u16()?;
        }

        reader.skip(11 * 2)?; // Halfwords 36-46
        for parameter in parameters[3..].iter_mut() {
            *parameter = reader.read_u16()?;
        }

        let version = reader.read_u8()?;
        let spot_blank = reader.read_u8()?;
        let offset_to_symbology = reader.read_u32()?;
        let offset_to_graphic = reader.read_u32()?;
        let offset_to_tabular = reader.read_u32()?;

        if block_divider != -1 {
            warn!(block_divider, "Invalid block divider");
            return Err(DecodeError::field("block divider", block_divider));
        }
        if (-15..16).contains(&product_code) {
            warn!(product_code, "Invalid product code");
            return Err(DecodeError::field("product code", product_code));
        }
        check_range("product code", product_code, -299..=299)?;

        trace!(product_code, "Product code");
        debug_assert_eq!(reader.position() - start, Self::SIZE);

        Ok(Self {
            block_divider,
            latitude_of_radar,
            longitude_of_radar,
            height_of_radar,
            product_code,
            operational_mode,
            volume_coverage_pattern,
            sequence_number,
            volume_scan_number,
            volume_scan_date,
            volume_scan_start_time,
            generation_date_of_product,
            generation_time_of_product,
            elevation_number,
            data_levels,
            parameters,
            version,
            spot_blank,
            offset_to_symbology,
            offset_to_graphic,
            offset_to_tabular,
        })
    }

    pub fn latitude(&self) -> f32 {
        self.latitude_of_radar as f32 / 1000.0
    }

    pub fn longitude(&self) -> f32 {
        self.longitude_of_radar as f32 / 1000.0
    }

    /// Product dependent parameter by its 1-based number.
    pub fn parameter(&self, number: usize) -> Option<u16> {
        number.checked_sub(1).and_then(|i| self.parameters.get(i).copied())
    }

    /// Data following the description block is a single bzip2 stream.
    pub fn is_compression_enabled(&self) -> bool {
        COMPRESSED_PRODUCTS.contains(&self.product_code) && self.parameters[7] == 1
    }

    pub fn volume_scan_start(&self) -> Option<DateTime<Utc>> {
        julian_to_datetime(
            u32::from(self.volume_scan_date),
            self.volume_scan_start_time.saturating_mul(1000),
        )
    }

    pub fn generation_time(&self) -> Option<DateTime<Utc>> {
        julian_to_datetime(
            u32::from(self.generation_date_of_product),
            self.generation_time_of_product.saturating_mul(1000),
        )
    }
}
