//! Digital Radar Data (message type 31).
//!
//! A radial header followed by a table of pointers to data blocks. Pointers
//! are byte offsets from the start of the message payload; blocks are parsed
//! by seeking to each one rather than by reading sequentially.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use nexrad_common::julian_to_datetime;
use tracing::{trace, warn};

use crate::codec::{check_range, validate_message, FieldReader};
use crate::error::{DecodeError, DecodeResult};
use crate::level2::vcp::ANGLE_DATA_SCALE;

/// Maximum gates in a moment block.
pub const MAX_GATES: u16 = 1840;

/// Data block identifiers found in message 31.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DataBlockType {
    Volume,
    Elevation,
    Radial,
    MomentRef,
    MomentVel,
    MomentSw,
    MomentZdr,
    MomentPhi,
    MomentRho,
    MomentCfp,
    Unknown,
}

impl DataBlockType {
    /// Moment block types in decode order.
    pub const MOMENTS: [DataBlockType; 7] = [
        DataBlockType::MomentRef,
        DataBlockType::MomentVel,
        DataBlockType::MomentSw,
        DataBlockType::MomentZdr,
        DataBlockType::MomentPhi,
        DataBlockType::MomentRho,
        DataBlockType::MomentCfp,
    ];

    pub fn from_name(name: &str) -> Self {
        match name {
            "VOL" => DataBlockType::Volume,
            "ELV" => DataBlockType::Elevation,
            "RAD" => DataBlockType::Radial,
            "REF" => DataBlockType::MomentRef,
            "VEL" => DataBlockType::MomentVel,
            "SW " => DataBlockType::MomentSw,
            "ZDR" => DataBlockType::MomentZdr,
            "PHI" => DataBlockType::MomentPhi,
            "RHO" => DataBlockType::MomentRho,
            "CFP" => DataBlockType::MomentCfp,
            _ => DataBlockType::Unknown,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            DataBlockType::Volume => "VOL",
            DataBlockType::Elevation => "ELV",
            DataBlockType::Radial => "RAD",
            DataBlockType::MomentRef => "REF",
            DataBlockType::MomentVel => "VEL",
            DataBlockType::MomentSw => "SW ",
            DataBlockType::MomentZdr => "ZDR",
            DataBlockType::MomentPhi => "PHI",
            DataBlockType::MomentRho => "RHO",
            DataBlockType::MomentCfp => "CFP",
            DataBlockType::Unknown => "???",
        }
    }

    pub fn is_moment(&self) -> bool {
        Self::MOMENTS.contains(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeDataBlock {
    pub lrtup: u16,
    pub version_major: u8,
    pub version_minor: u8,
    pub latitude: f32,
    pub longitude: f32,
    pub site_height: i16,
    pub feedhorn_height: u16,
    pub calibration_constant: f32,
    pub horizontal_shv_tx_power: f32,
    pub vertical_shv_tx_power: f32,
    pub system_differential_reflectivity: f32,
    pub initial_system_differential_phase: f32,
    pub volume_coverage_pattern_number: u16,
    pub processing_status: u16,
}

impl VolumeDataBlock {
    fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            lrtup: reader.read_u16()?,
            version_major: reader.read_u8()?,
            version_minor: reader.read_u8()?,
            latitude: reader.read_f32()?,
            longitude: reader.read_f32()?,
            site_height: reader.read_i16()?,
            feedhorn_height: reader.read_u16()?,
            calibration_constant: reader.read_f32()?,
            horizontal_shv_tx_power: reader.read_f32()?,
            vertical_shv_tx_power: reader.read_f32()?,
            system_differential_reflectivity: reader.read_f32()?,
            initial_system_differential_phase: reader.read_f32()?,
            volume_coverage_pattern_number: reader.read_u16()?,
            processing_status: reader.read_u16()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationDataBlock {
    pub lrtup: u16,
    pub atmos: i16,
    pub calibration_constant: f32,
}

impl ElevationDataBlock {
    fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            lrtup: reader.read_u16()?,
            atmos: reader.read_i16()?,
            calibration_constant: reader.read_f32()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadialDataBlock {
    pub lrtup: u16,
    /// Unambiguous range in km.
    pub unambiguous_range: f32,
    pub noise_level_horizontal: f32,
    pub noise_level_vertical: f32,
    pub nyquist_velocity: u16,
    pub radial_flags: u16,
    pub calibration_constant_horizontal: f32,
    pub calibration_constant_vertical: f32,
}

impl RadialDataBlock {
    fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            lrtup: reader.read_u16()?,
            unambiguous_range: f32::from(reader.read_u16()?) / 10.0,
            noise_level_horizontal: reader.read_f32()?,
            noise_level_vertical: reader.read_f32()?,
            nyquist_velocity: reader.read_u16()?,
            radial_flags: reader.read_u16()?,
            calibration_constant_horizontal: reader.read_f32()?,
            calibration_constant_vertical: reader.read_f32()?,
        })
    }
}

/// Raw gate words of a moment block.
#[derive(Debug, Clone, PartialEq)]
pub enum MomentGates {
    Bits8(Vec<u8>),
    Bits16(Vec<u16>),
}

impl MomentGates {
    pub fn len(&self) -> usize {
        match self {
            MomentGates::Bits8(g) => g.len(),
            MomentGates::Bits16(g) => g.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Raw gate word at an index.
    pub fn raw(&self, index: usize) -> Option<u16> {
        match self {
            MomentGates::Bits8(g) => g.get(index).map(|&v| u16::from(v)),
            MomentGates::Bits16(g) => g.get(index).copied(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MomentDataBlock {
    pub block_type: DataBlockType,
    pub number_of_gates: u16,
    /// Range to the center of the first gate in meters.
    pub data_moment_range: u16,
    pub data_moment_range_sample_interval: u16,
    pub tover: u16,
    pub snr_threshold: i16,
    pub control_flags: u8,
    pub data_word_size: u8,
    pub scale: f32,
    pub offset: f32,
    pub gates: MomentGates,
}

impl MomentDataBlock {
    fn parse(block_type: DataBlockType, reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        reader.skip(4)?; // Reserved
        let number_of_gates = reader.read_u16()?;
        let data_moment_range = reader.read_u16()?;
        let data_moment_range_sample_interval = reader.read_u16()?;
        let tover = reader.read_u16()?;
        let snr_threshold = reader.read_i16()?;
        let control_flags = reader.read_u8()?;
        let data_word_size = reader.read_u8()?;
        let scale = reader.read_f32()?;
        let offset = reader.read_f32()?;

        check_range("number of data moment gates", number_of_gates, 0..=i64::from(MAX_GATES))?;

        let gates = match data_word_size {
            8 => MomentGates::Bits8(reader.read_bytes(number_of_gates as usize)?.to_vec()),
            16 => MomentGates::Bits16(reader.read_u16_vec(number_of_gates as usize)?),
            other => {
                warn!(word_size = other, "Invalid data word size");
                return Err(DecodeError::field("data word size", other));
            }
        };

        Ok(Self {
            block_type,
            number_of_gates,
            data_moment_range,
            data_moment_range_sample_interval,
            tover,
            snr_threshold,
            control_flags,
            data_word_size,
            scale,
            offset,
            gates,
        })
    }

    /// Decode a gate to its physical value. Raw values 0 and 1 are
    /// "below threshold" and "range folded" and decode to `None`.
    pub fn value(&self, index: usize) -> Option<f32> {
        let raw = self.gates.raw(index)?;
        if raw < 2 || self.scale == 0.0 {
            return None;
        }
        Some((f32::from(raw) - self.offset) / self.scale)
    }

    /// Range to the center of a gate in meters.
    pub fn gate_range(&self, index: usize) -> f32 {
        f32::from(self.data_moment_range)
            + f32::from(self.data_moment_range_sample_interval) * index as f32
    }
}

/// One radial of base data.
#[derive(Debug, Clone, PartialEq)]
pub struct DigitalRadarData {
    pub radar_identifier: String,
    /// Milliseconds past midnight UTC.
    pub collection_time: u32,
    pub modified_julian_date: u16,
    pub azimuth_number: u16,
    pub azimuth_angle: f32,
    pub compression_indicator: u8,
    pub radial_length: u16,
    pub azimuth_resolution_spacing: u8,
    pub radial_status: u8,
    pub elevation_number: u8,
    pub cut_sector_number: u8,
    pub elevation_angle: f32,
    pub radial_spot_blanking_status: u8,
    pub azimuth_indexing_mode: u8,
    pub volume: Option<VolumeDataBlock>,
    pub elevation: Option<ElevationDataBlock>,
    pub radial: Option<RadialDataBlock>,
    pub moments: BTreeMap<DataBlockType, MomentDataBlock>,
}

impl DigitalRadarData {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        trace!("Parsing Digital Radar Data (Message Type 31)");

        let mut radial = Self {
            radar_identifier: reader.read_string(4)?,
            collection_time: reader.read_u32()?,
            modified_julian_date: reader.read_u16()?,
            azimuth_number: reader.read_u16()?,
            azimuth_angle: reader.read_f32()?,
            compression_indicator: reader.read_u8()?,
            radial_length: {
                reader.skip(1)?; // Spare
                reader.read_u16()?
            },
            azimuth_resolution_spacing: reader.read_u8()?,
            radial_status: reader.read_u8()?,
            elevation_number: reader.read_u8()?,
            cut_sector_number: reader.read_u8()?,
            elevation_angle: reader.read_f32()?,
            radial_spot_blanking_status: reader.read_u8()?,
            azimuth_indexing_mode: reader.read_u8()?,
            volume: None,
            elevation: None,
            radial: None,
            moments: BTreeMap::new(),
        };
        let data_block_count = reader.read_u16()?;

        check_range("azimuth number", radial.azimuth_number, 1..=720)?;
        check_range("elevation number", radial.elevation_number, 1..=32)?;
        check_range("number of data blocks", data_block_count, 4..=10)?;
        if radial.compression_indicator != 0 {
            warn!(indicator = radial.compression_indicator, "Compression not supported");
            return Err(DecodeError::field("compression indicator", radial.compression_indicator));
        }

        let pointers = (0..data_block_count)
            .map(|_| reader.read_u32())
            .collect::<DecodeResult<Vec<_>>>()?;

        // Blocks may appear in any order; the radial ends with the last byte
        // any of them used.
        let mut consumed = reader.position();
        for pointer in pointers {
            match radial.parse_block(reader, pointer as usize) {
                Ok(()) => consumed = consumed.max(reader.position()),
                Err(e) => warn!(pointer, error = %e, "Invalid data block"),
            }
        }

        // Payloads are padded to a whole number of halfwords
        let consumed = consumed + consumed % 2;
        reader.seek_clamped(reader.len());
        validate_message(consumed, reader.len())?;

        Ok(radial)
    }

    fn parse_block(&mut self, reader: &mut FieldReader<'_>, pointer: usize) -> DecodeResult<()> {
        reader.seek(pointer)?;

        let _block_kind = reader.read_u8()?;
        let name = reader.read_string(3)?;
        let block_type = DataBlockType::from_name(&name);

        match block_type {
            DataBlockType::Volume => self.volume = Some(VolumeDataBlock::parse(reader)?),
            DataBlockType::Elevation => self.elevation = Some(ElevationDataBlock::parse(reader)?),
            DataBlockType::Radial => self.radial = Some(RadialDataBlock::parse(reader)?),
            DataBlockType::Unknown => {
                warn!(name = %name, "Unknown data name");
            }
            moment => {
                self.moments.insert(moment, MomentDataBlock::parse(moment, reader)?);
            }
        }
        Ok(())
    }

    /// Collection time of this radial.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        julian_to_datetime(u32::from(self.modified_julian_date), self.collection_time)
    }

    /// Elevation angle in coded angle units.
    pub fn elevation_angle_raw(&self) -> u16 {
        (f64::from(self.elevation_angle) / ANGLE_DATA_SCALE).round() as u16
    }

    pub fn moment(&self, block_type: DataBlockType) -> Option<&MomentDataBlock> {
        self.moments.get(&block_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn moment_block(name: &[u8; 3], gates: &[u8]) -> Vec<u8> {
        let mut out = vec![b'D'];
        out.extend_from_slice(name);
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&(gates.len() as u16).to_be_bytes());
        out.extend_from_slice(&2125u16.to_be_bytes());
        out.extend_from_slice(&250u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&16i16.to_be_bytes());
        out.push(0);
        out.push(8);
        out.extend_from_slice(&2.0f32.to_be_bytes());
        out.extend_from_slice(&66.0f32.to_be_bytes());
        out.extend_from_slice(gates);
        out
    }

    fn radial_bytes(azimuth_number: u16, compression: u8) -> Vec<u8> {
        let mut header = Vec::new();
        header.extend_from_slice(b"KLSX");
        header.extend_from_slice(&43_200_000u32.to_be_bytes());
        header.extend_from_slice(&19449u16.to_be_bytes());
        header.extend_from_slice(&azimuth_number.to_be_bytes());
        header.extend_from_slice(&45.5f32.to_be_bytes());
        header.push(compression);
        header.push(0);
        header.extend_from_slice(&0u16.to_be_bytes());
        header.extend_from_slice(&[1, 0, 1, 1]);
        header.extend_from_slice(&0.5f32.to_be_bytes());
        header.extend_from_slice(&[0, 0]);
        header.extend_from_slice(&4u16.to_be_bytes());

        let mut blocks: Vec<Vec<u8>> = Vec::new();
        let mut vol = b"RVOL".to_vec();
        vol.extend_from_slice(&[0; 40]);
        blocks.push(vol);
        let mut elv = b"RELV".to_vec();
        elv.extend_from_slice(&[0; 8]);
        blocks.push(elv);
        let mut rad = b"RRAD".to_vec();
        rad.extend_from_slice(&[0; 24]);
        blocks.push(rad);
        blocks.push(moment_block(b"REF", &[0, 1, 76, 86]));

        let mut offset = header.len() + 4 * blocks.len();
        let mut out = header;
        let mut body = Vec::new();
        for block in &blocks {
            out.extend_from_slice(&(offset as u32).to_be_bytes());
            offset += block.len();
            body.extend_from_slice(block);
        }
        out.extend_from_slice(&body);
        out.extend_from_slice(&[0, 0]);
        out
    }

    #[test]
    fn test_parse_radial() {
        let bytes = radial_bytes(12, 0);
        let radial = DigitalRadarData::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(radial.radar_identifier, "KLSX");
        assert_eq!(radial.azimuth_number, 12);
        assert!(radial.volume.is_some());
        assert!(radial.elevation.is_some());
        assert!(radial.radial.is_some());
        assert_eq!(
            radial.time().map(|t| t.to_rfc3339()).as_deref(),
            Some("2023-04-01T12:00:00+00:00")
        );

        let reflectivity = radial.moment(DataBlockType::MomentRef).unwrap();
        assert_eq!(reflectivity.number_of_gates, 4);
        assert_eq!(reflectivity.value(0), None);
        assert_eq!(reflectivity.value(1), None);
        assert_eq!(reflectivity.value(2), Some(5.0));
        assert_eq!(reflectivity.gate_range(2), 2625.0);
    }

    #[test]
    fn test_invalid_azimuth_number() {
        let bytes = radial_bytes(721, 0);
        assert!(DigitalRadarData::parse(&mut FieldReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_compressed_radial_rejected() {
        let bytes = radial_bytes(1, 1);
        assert!(DigitalRadarData::parse(&mut FieldReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_block_names() {
        assert_eq!(DataBlockType::from_name("SW "), DataBlockType::MomentSw);
        assert_eq!(DataBlockType::from_name("XYZ"), DataBlockType::Unknown);
        assert!(DataBlockType::MomentCfp.is_moment());
        assert!(!DataBlockType::Volume.is_moment());
    }
}
