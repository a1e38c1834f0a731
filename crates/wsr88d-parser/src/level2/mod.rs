//! Level II (RDA) message decoding.
//!
//! Messages arrive as a 16-byte [`MessageHeader`] followed by a payload whose
//! layout depends on the message type. Large messages are split into
//! segments and reassembled by [`Level2MessageFactory`].

pub mod clutter_bypass_map;
pub mod clutter_filter_map;
pub mod digital_radar_data;
pub mod factory;
pub mod header;
pub mod rda_status;
pub mod vcp;

use std::sync::Arc;

use bytes::Bytes;

pub use clutter_bypass_map::ClutterFilterBypassMap;
pub use clutter_filter_map::{ClutterFilterMap, RangeZone};
pub use digital_radar_data::{DataBlockType, DigitalRadarData, MomentDataBlock, MomentGates};
pub use factory::{Level2MessageFactory, MessageInfo, ReassemblyState};
pub use header::MessageHeader;
pub use rda_status::RdaStatusData;
pub use vcp::{VolumeCoveragePatternData, WaveformType};

use crate::codec::FieldReader;
use crate::error::DecodeResult;

/// Message type codes carried in the header.
pub mod message_type {
    pub const RDA_STATUS_DATA: u8 = 2;
    pub const PERFORMANCE_MAINTENANCE_DATA: u8 = 3;
    pub const VOLUME_COVERAGE_PATTERN: u8 = 5;
    pub const CLUTTER_FILTER_BYPASS_MAP: u8 = 13;
    pub const CLUTTER_FILTER_MAP: u8 = 15;
    pub const RDA_ADAPTATION_DATA: u8 = 18;
    pub const DIGITAL_RADAR_DATA: u8 = 31;
}

/// Decoded payload of a Level II message.
#[derive(Debug, Clone, PartialEq)]
pub enum Level2MessageData {
    RdaStatus(RdaStatusData),
    VolumeCoveragePattern(Arc<VolumeCoveragePatternData>),
    ClutterFilterBypassMap(ClutterFilterBypassMap),
    ClutterFilterMap(ClutterFilterMap),
    DigitalRadarData(Arc<DigitalRadarData>),
    /// Recognised message kept undecoded.
    Opaque { message_type: u8, payload: Bytes },
}

/// A decoded Level II message and the header it arrived with.
#[derive(Debug, Clone, PartialEq)]
pub struct Level2Message {
    pub header: MessageHeader,
    pub data: Level2MessageData,
}

impl Level2Message {
    pub fn message_type(&self) -> u8 {
        self.header.message_type
    }
}

/// Payload decoder registered for a message type.
pub type DecodeFn = fn(&MessageHeader, &mut FieldReader<'_>) -> DecodeResult<Level2MessageData>;

/// Look up the decoder for a message type. `None` means the type is unknown.
pub fn decoder_for(message_type: u8) -> Option<DecodeFn> {
    use self::message_type::*;

    let decode: DecodeFn = match message_type {
        RDA_STATUS_DATA => decode_rda_status,
        VOLUME_COVERAGE_PATTERN => decode_vcp,
        CLUTTER_FILTER_BYPASS_MAP => decode_clutter_bypass_map,
        CLUTTER_FILTER_MAP => decode_clutter_filter_map,
        DIGITAL_RADAR_DATA => decode_digital_radar_data,
        PERFORMANCE_MAINTENANCE_DATA | RDA_ADAPTATION_DATA => decode_opaque,
        _ => return None,
    };

    Some(decode)
}

fn decode_rda_status(_: &MessageHeader, r: &mut FieldReader<'_>) -> DecodeResult<Level2MessageData> {
    RdaStatusData::parse(r).map(Level2MessageData::RdaStatus)
}

fn decode_vcp(_: &MessageHeader, r: &mut FieldReader<'_>) -> DecodeResult<Level2MessageData> {
    VolumeCoveragePatternData::parse(r).map(|v| Level2MessageData::VolumeCoveragePattern(Arc::new(v)))
}

fn decode_clutter_bypass_map(
    _: &MessageHeader,
    r: &mut FieldReader<'_>,
) -> DecodeResult<Level2MessageData> {
    ClutterFilterBypassMap::parse(r).map(Level2MessageData::ClutterFilterBypassMap)
}

fn decode_clutter_filter_map(
    _: &MessageHeader,
    r: &mut FieldReader<'_>,
) -> DecodeResult<Level2MessageData> {
    ClutterFilterMap::parse(r).map(Level2MessageData::ClutterFilterMap)
}

fn decode_digital_radar_data(
    _: &MessageHeader,
    r: &mut FieldReader<'_>,
) -> DecodeResult<Level2MessageData> {
    DigitalRadarData::parse(r).map(|d| Level2MessageData::DigitalRadarData(Arc::new(d)))
}

fn decode_opaque(h: &MessageHeader, r: &mut FieldReader<'_>) -> DecodeResult<Level2MessageData> {
    let payload = Bytes::copy_from_slice(r.read_bytes(r.remaining())?);
    Ok(Level2MessageData::Opaque {
        message_type: h.message_type,
        payload,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decoder_registry() {
        for code in [2u8, 3, 5, 13, 15, 18, 31] {
            assert!(decoder_for(code).is_some(), "missing decoder for {}", code);
        }
        for code in [0u8, 1, 4, 6, 30, 32, 255] {
            assert!(decoder_for(code).is_none(), "unexpected decoder for {}", code);
        }
    }
}
