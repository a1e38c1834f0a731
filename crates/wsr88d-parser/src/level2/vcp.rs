//! Volume Coverage Pattern data (message type 5).

use tracing::{trace, warn};

use crate::codec::{check_range, validate_message, FieldReader};
use crate::error::DecodeResult;

/// Degrees per coded angle unit.
pub const ANGLE_DATA_SCALE: f64 = 360.0 / 65536.0;
/// Degrees per second per coded azimuth rate unit.
pub const AZ_EL_RATE_DATA_SCALE: f64 = 45.0 / 32768.0;

const HEADER_SIZE: usize = 22;
const CUT_SIZE: usize = 46;

/// Pulse waveform used for an elevation cut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WaveformType {
    ContiguousSurveillance,
    ContiguousDopplerWithAmbiguityResolution,
    ContiguousDopplerWithoutAmbiguityResolution,
    Batch,
    StaggeredPulsePair,
    Unknown,
}

impl From<u8> for WaveformType {
    fn from(code: u8) -> Self {
        match code {
            1 => WaveformType::ContiguousSurveillance,
            2 => WaveformType::ContiguousDopplerWithAmbiguityResolution,
            3 => WaveformType::ContiguousDopplerWithoutAmbiguityResolution,
            4 => WaveformType::Batch,
            5 => WaveformType::StaggeredPulsePair,
            _ => WaveformType::Unknown,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sector {
    pub edge_angle: u16,
    pub doppler_prf_number: u16,
    pub doppler_prf_pulse_count_radial: u16,
}

impl Sector {
    fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        Ok(Self {
            edge_angle: reader.read_u16()?,
            doppler_prf_number: reader.read_u16()?,
            doppler_prf_pulse_count_radial: reader.read_u16()?,
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ElevationCut {
    pub elevation_angle_raw: u16,
    pub channel_configuration: u8,
    pub waveform_type: u8,
    pub super_resolution_control: u8,
    pub surveillance_prf_number: u8,
    pub surveillance_prf_pulse_count_radial: u16,
    pub azimuth_rate_raw: i16,
    pub reflectivity_threshold_raw: u16,
    pub velocity_threshold_raw: u16,
    pub spectrum_width_threshold_raw: u16,
    pub differential_reflectivity_threshold_raw: u16,
    pub differential_phase_threshold_raw: u16,
    pub correlation_coefficient_threshold_raw: u16,
    pub sectors: [Sector; 3],
    pub supplemental_data: u16,
    pub ebc_angle_raw: u16,
}

impl ElevationCut {
    fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let elevation_angle_raw = reader.read_u16()?;
        let channel_configuration = reader.read_u8()?;
        let waveform_type = reader.read_u8()?;
        let super_resolution_control = reader.read_u8()?;
        let surveillance_prf_number = reader.read_u8()?;
        let surveillance_prf_pulse_count_radial = reader.read_u16()?;
        let azimuth_rate_raw = reader.read_i16()?;
        let reflectivity_threshold_raw = reader.read_u16()?;
        let velocity_threshold_raw = reader.read_u16()?;
        let spectrum_width_threshold_raw = reader.read_u16()?;
        let differential_reflectivity_threshold_raw = reader.read_u16()?;
        let differential_phase_threshold_raw = reader.read_u16()?;
        let correlation_coefficient_threshold_raw = reader.read_u16()?;
        let sector0 = Sector::parse(reader)?;
        let supplemental_data = reader.read_u16()?;
        let sector1 = Sector::parse(reader)?;
        let ebc_angle_raw = reader.read_u16()?;
        let sector2 = Sector::parse(reader)?;
        reader.skip(2)?; // Reserved

        Ok(Self {
            elevation_angle_raw,
            channel_configuration,
            waveform_type,
            super_resolution_control,
            surveillance_prf_number,
            surveillance_prf_pulse_count_radial,
            azimuth_rate_raw,
            reflectivity_threshold_raw,
            velocity_threshold_raw,
            spectrum_width_threshold_raw,
            differential_reflectivity_threshold_raw,
            differential_phase_threshold_raw,
            correlation_coefficient_threshold_raw,
            sectors: [sector0, sector1, sector2],
            supplemental_data,
            ebc_angle_raw,
        })
    }

    pub fn elevation_angle(&self) -> f64 {
        f64::from(self.elevation_angle_raw) * ANGLE_DATA_SCALE
    }

    pub fn waveform(&self) -> WaveformType {
        WaveformType::from(self.waveform_type)
    }

    pub fn azimuth_rate(&self) -> f64 {
        f64::from(self.azimuth_rate_raw) * AZ_EL_RATE_DATA_SCALE
    }

    pub fn reflectivity_threshold(&self) -> f32 {
        f32::from(self.reflectivity_threshold_raw) * 0.125
    }

    pub fn velocity_threshold(&self) -> f32 {
        f32::from(self.velocity_threshold_raw) * 0.125
    }

    pub fn half_degree_azimuth(&self) -> bool {
        self.super_resolution_control & 0x01 != 0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VolumeCoveragePatternData {
    pub pattern_type: u16,
    pub pattern_number: u16,
    pub version: u8,
    pub clutter_map_group_number: u8,
    pub doppler_velocity_resolution: u8,
    pub pulse_width: u8,
    pub vcp_sequencing: u16,
    pub vcp_supplemental_data: u16,
    pub elevation_cuts: Vec<ElevationCut>,
}

impl VolumeCoveragePatternData {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        trace!("Parsing Volume Coverage Pattern Data (Message Type 5)");

        let message_size = reader.read_u16()?;
        let pattern_type = reader.read_u16()?;
        let pattern_number = reader.read_u16()?;
        let number_of_elevation_cuts = reader.read_u16()?;
        let version = reader.read_u8()?;
        let clutter_map_group_number = reader.read_u8()?;
        let doppler_velocity_resolution = reader.read_u8()?;
        let pulse_width = reader.read_u8()?;
        reader.skip(4)?; // Reserved
        let vcp_sequencing = reader.read_u16()?;
        let vcp_supplemental_data = reader.read_u16()?;
        reader.skip(2)?; // Reserved

        check_range("VCP message size", message_size, 34..=747)?;
        check_range("number of elevation cuts", number_of_elevation_cuts, 1..=32)?;

        let elevation_cuts = (0..number_of_elevation_cuts)
            .map(|_| ElevationCut::parse(reader))
            .collect::<DecodeResult<Vec<_>>>()?;

        let pattern_bytes = HEADER_SIZE + CUT_SIZE * elevation_cuts.len();
        if pattern_bytes != message_size as usize * 2 {
            warn!(
                bytes_read = pattern_bytes,
                message_size = message_size as usize * 2,
                "VCP bytes read not equal to pattern size"
            );
        }

        validate_message(reader.position(), reader.len())?;

        Ok(Self {
            pattern_type,
            pattern_number,
            version,
            clutter_map_group_number,
            doppler_velocity_resolution,
            pulse_width,
            vcp_sequencing,
            vcp_supplemental_data,
            elevation_cuts,
        })
    }

    pub fn number_of_elevation_cuts(&self) -> usize {
        self.elevation_cuts.len()
    }

    /// Doppler velocity resolution in m/s.
    pub fn velocity_resolution(&self) -> Option<f32> {
        match self.doppler_velocity_resolution {
            2 => Some(0.5),
            4 => Some(1.0),
            _ => None,
        }
    }

    pub fn elevation_angle(&self, cut: usize) -> Option<f64> {
        self.elevation_cuts.get(cut).map(ElevationCut::elevation_angle)
    }

    pub fn elevation_angle_raw(&self, cut: usize) -> Option<u16> {
        self.elevation_cuts.get(cut).map(|c| c.elevation_angle_raw)
    }

    pub fn waveform_type(&self, cut: usize) -> WaveformType {
        self.elevation_cuts
            .get(cut)
            .map(ElevationCut::waveform)
            .unwrap_or(WaveformType::Unknown)
    }

    pub fn sails_enabled(&self) -> bool {
        self.vcp_supplemental_data & 0x0001 != 0
    }

    pub fn number_of_sails_cuts(&self) -> u16 {
        (self.vcp_supplemental_data & 0x000E) >> 1
    }
}
