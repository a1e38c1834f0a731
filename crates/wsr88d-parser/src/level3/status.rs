//! Messages without symbology: the RPG general status message (code 2) and
//! the radar coded message (code 74).

use tracing::{trace, warn};

use crate::codec::{validate_message, FieldReader};
use crate::error::{DecodeError, DecodeResult};
use crate::level3::description::ProductDescriptionBlock;
use crate::level3::header::Level3MessageHeader;

/// Elevation angle slots in the general status message.
const ELEVATION_SLOTS: usize = 25;

/// RDA and RPG state broadcast with the product stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneralStatusMessage {
    pub header: Level3MessageHeader,
    pub length_of_block: u16,
    pub mode_of_operation: u16,
    pub rda_operability_status: u16,
    pub volume_coverage_pattern: u16,
    pub number_of_elevation_cuts: u16,
    /// Elevation angles in tenths of a degree, one per cut.
    pub elevations: Vec<i16>,
    pub rda_status: u16,
    pub rda_alarms: u16,
    pub data_transmission_enabled: u16,
    pub rpg_operability_status: u16,
    pub rpg_alarms: u16,
    pub rpg_status: u16,
    pub rpg_narrowband_status: u16,
    pub horizontal_reflectivity_calibration_correction: i16,
    pub product_availability: u16,
    pub super_resolution_elevation_cuts: u16,
    pub clutter_mitigation_decision_status: u16,
    pub vertical_reflectivity_calibration_correction: i16,
    pub rda_build_number: u16,
    pub rda_channel_number: u16,
    pub build_version: u16,
    pub vcp_supplemental_data: u16,
    pub supplemental_cut_map: u32,
}

impl GeneralStatusMessage {
    /// Bytes after the message header.
    pub const SIZE: usize = 182;

    /// Parse from a reader spanning exactly the bytes after the header.
    pub fn parse(header: Level3MessageHeader, reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let start = reader.position();

        let block_divider = reader.read_i16()?;
        if block_divider != -1 {
            warn!(block_divider, "Invalid block divider");
            return Err(DecodeError::field("block divider", block_divider));
        }

        let length_of_block = reader.read_u16()?;
        let mode_of_operation = reader.read_u16()?;
        let rda_operability_status = reader.read_u16()?;
        let volume_coverage_pattern = reader.read_u16()?;
        let number_of_elevation_cuts = reader.read_u16()?;

        let mut elevations = Vec::with_capacity(ELEVATION_SLOTS);
        for _ in 0..20 {
            elevations.push(reader.read_i16()?);
        }

        let rda_status = reader.read_u16()?;
        let rda_alarms = reader.read_u16()?;
        let data_transmission_enabled = reader.read_u16()?;
        let rpg_operability_status = reader.read_u16()?;
        let rpg_alarms = reader.read_u16()?;
        let rpg_status = reader.read_u16()?;
        let rpg_narrowband_status = reader.read_u16()?;
        let horizontal_reflectivity_calibration_correction = reader.read_i16()?;
        let product_availability = reader.read_u16()?;
        let super_resolution_elevation_cuts = reader.read_u16()?;
        let clutter_mitigation_decision_status = reader.read_u16()?;
        let vertical_reflectivity_calibration_correction = reader.read_i16()?;
        let rda_build_number = reader.read_u16()?;
        let rda_channel_number = reader.read_u16()?;
        reader.skip(4)?; // Spare
        let build_version = reader.read_u16()?;

        // The last five elevation slots were added after the spares
        for _ in 20..ELEVATION_SLOTS {
            elevations.push(reader.read_i16()?);
        }

        let vcp_supplemental_data = reader.read_u16()?;
        let supplemental_cut_map = reader.read_u32()?;
        reader.skip(80)?; // Spare

        validate_message(reader.position() - start, reader.len() - start)?;

        elevations.truncate((number_of_elevation_cuts as usize).min(ELEVATION_SLOTS));
        trace!(vcp = volume_coverage_pattern, cuts = elevations.len(), "General status");

        Ok(Self {
            header,
            length_of_block,
            mode_of_operation,
            rda_operability_status,
            volume_coverage_pattern,
            number_of_elevation_cuts,
            elevations,
            rda_status,
            rda_alarms,
            data_transmission_enabled,
            rpg_operability_status,
            rpg_alarms,
            rpg_status,
            rpg_narrowband_status,
            horizontal_reflectivity_calibration_correction,
            product_availability,
            super_resolution_elevation_cuts,
            clutter_mitigation_decision_status,
            vertical_reflectivity_calibration_correction,
            rda_build_number,
            rda_channel_number,
            build_version,
            vcp_supplemental_data,
            supplemental_cut_map,
        })
    }

    /// Elevation angles of the current VCP in degrees.
    pub fn elevation_angles(&self) -> Vec<f32> {
        self.elevations.iter().map(|&e| f32::from(e) / 10.0).collect()
    }
}

/// Radar coded message: a description block, the station identifiers and the
/// coded text.
#[derive(Debug, Clone, PartialEq)]
pub struct RadarCodedMessage {
    pub header: Level3MessageHeader,
    pub description_block: ProductDescriptionBlock,
    pub pup_site_identifier: String,
    pub product_category: String,
    pub rda_site_identifier: String,
    pub text: String,
}

impl RadarCodedMessage {
    pub fn parse(header: Level3MessageHeader, reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let description_block = ProductDescriptionBlock::parse(reader)?;

        let pup_site_identifier = reader.read_string(4)?;
        reader.skip(1)?;
        let product_category = reader.read_string(5)?;
        reader.skip(1)?;
        let rda_site_identifier = reader.read_string(4)?;
        let text = reader.read_string(reader.remaining())?;

        trace!(site = %rda_site_identifier, category = %product_category, "Radar coded message");

        Ok(Self {
            header,
            description_block,
            pup_site_identifier,
            product_category,
            rda_site_identifier,
            text,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(message_code: i16, data_size: usize) -> Level3MessageHeader {
        Level3MessageHeader {
            message_code,
            date_of_message: 19449,
            time_of_message: 0,
            length_of_message: (Level3MessageHeader::SIZE + data_size) as u32,
            source_id: 0,
            destination_id: 0,
            number_blocks: 1,
        }
    }

    fn status_body(cuts: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(-1i16).to_be_bytes());
        out.extend_from_slice(&(GeneralStatusMessage::SIZE as u16).to_be_bytes());
        out.extend_from_slice(&4u16.to_be_bytes()); // Precipitation mode
        out.extend_from_slice(&2u16.to_be_bytes());
        out.extend_from_slice(&212u16.to_be_bytes());
        out.extend_from_slice(&cuts.to_be_bytes());
        for i in 0..20i16 {
            out.extend_from_slice(&(5 + 10 * i).to_be_bytes());
        }
        out.resize(out.len() + 14 * 2, 0);
        out.resize(out.len() + 4, 0);
        out.extend_from_slice(&23u16.to_be_bytes());
        for i in 20..25i16 {
            out.extend_from_slice(&(5 + 10 * i).to_be_bytes());
        }
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.resize(out.len() + 80, 0);
        out
    }

    #[test]
    fn test_general_status() {
        let body = status_body(22);
        assert_eq!(body.len(), GeneralStatusMessage::SIZE);

        let mut reader = FieldReader::new(&body);
        let status = GeneralStatusMessage::parse(header(2, body.len()), &mut reader).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(status.volume_coverage_pattern, 212);
        assert_eq!(status.build_version, 23);
        assert_eq!(status.elevations.len(), 22);
        assert_eq!(status.elevations[21], 215);
        assert_eq!(status.elevation_angles()[0], 0.5);
    }

    #[test]
    fn test_general_status_trailing_bytes_rejected() {
        let mut body = status_body(1);
        body.extend_from_slice(&[0, 0]);
        assert!(matches!(
            GeneralStatusMessage::parse(header(2, body.len()), &mut FieldReader::new(&body)),
            Err(DecodeError::SizeMismatch { .. })
        ));
    }

    #[test]
    fn test_general_status_bad_divider() {
        let mut body = status_body(1);
        body[0] = 0;
        assert_eq!(
            GeneralStatusMessage::parse(header(2, body.len()), &mut FieldReader::new(&body)),
            Err(DecodeError::field("block divider", 255))
        );
    }
}
