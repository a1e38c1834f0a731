//! RDA Status Data (message type 2).

use tracing::trace;

use crate::codec::{validate_message, FieldReader};
use crate::error::DecodeResult;

/// Operational status of the Radar Data Acquisition unit.
#[derive(Debug, Clone, PartialEq)]
pub struct RdaStatusData {
    pub rda_status: u16,
    pub operability_status: u16,
    pub control_status: u16,
    pub auxiliary_power_generator_state: u16,
    pub average_transmitter_power: u16,
    horizontal_reflectivity_calibration_correction: i16,
    pub data_transmission_enabled: u16,
    pub volume_coverage_pattern_number: u16,
    pub rda_control_authorization: u16,
    pub rda_build_number: u16,
    pub operational_mode: u16,
    pub super_resolution_status: u16,
    pub clutter_mitigation_decision_status: u16,
    pub avset_ebc_rda_log_data_status: u16,
    pub rda_alarm_summary: u16,
    pub command_acknowledgement: u16,
    pub channel_control_status: u16,
    pub spot_blanking_status: u16,
    pub bypass_map_generation_date: u16,
    pub bypass_map_generation_time: u16,
    pub clutter_filter_map_generation_date: u16,
    pub clutter_filter_map_generation_time: u16,
    vertical_reflectivity_calibration_correction: i16,
    pub transition_power_source_status: u16,
    pub rms_control_status: u16,
    pub performance_check_status: u16,
    pub alarm_codes: [u16; 14],
    pub signal_processing_options: u16,
    pub status_version: u16,
}

impl RdaStatusData {
    pub const SIZE: usize = 120;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        trace!("Parsing RDA Status Data (Message Type 2)");

        let mut status = Self {
            rda_status: reader.read_u16()?,
            operability_status: reader.read_u16()?,
            control_status: reader.read_u16()?,
            auxiliary_power_generator_state: reader.read_u16()?,
            average_transmitter_power: reader.read_u16()?,
            horizontal_reflectivity_calibration_correction: reader.read_i16()?,
            data_transmission_enabled: reader.read_u16()?,
            volume_coverage_pattern_number: reader.read_u16()?,
            rda_control_authorization: reader.read_u16()?,
            rda_build_number: reader.read_u16()?,
            operational_mode: reader.read_u16()?,
            super_resolution_status: reader.read_u16()?,
            clutter_mitigation_decision_status: reader.read_u16()?,
            avset_ebc_rda_log_data_status: reader.read_u16()?,
            rda_alarm_summary: reader.read_u16()?,
            command_acknowledgement: reader.read_u16()?,
            channel_control_status: reader.read_u16()?,
            spot_blanking_status: reader.read_u16()?,
            bypass_map_generation_date: reader.read_u16()?,
            bypass_map_generation_time: reader.read_u16()?,
            clutter_filter_map_generation_date: reader.read_u16()?,
            clutter_filter_map_generation_time: reader.read_u16()?,
            vertical_reflectivity_calibration_correction: reader.read_i16()?,
            transition_power_source_status: reader.read_u16()?,
            rms_control_status: reader.read_u16()?,
            performance_check_status: reader.read_u16()?,
            alarm_codes: [0; 14],
            signal_processing_options: 0,
            status_version: 0,
        };

        for code in status.alarm_codes.iter_mut() {
            *code = reader.read_u16()?;
        }
        status.signal_processing_options = reader.read_u16()?;
        reader.skip(36)?; // Spare
        status.status_version = reader.read_u16()?;

        validate_message(reader.position(), reader.len())?;
        Ok(status)
    }

    /// Horizontal reflectivity calibration correction in dB.
    pub fn horizontal_reflectivity_calibration_correction(&self) -> f32 {
        f32::from(self.horizontal_reflectivity_calibration_correction) * 0.01
    }

    /// Vertical reflectivity calibration correction in dB.
    pub fn vertical_reflectivity_calibration_correction(&self) -> f32 {
        f32::from(self.vertical_reflectivity_calibration_correction) * 0.01
    }
}
