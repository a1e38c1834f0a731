use tracing::warn;

use super::{framed, packet_code};
use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};

/// Text (packet codes 1 and 8) or special symbols (packet code 2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAndSpecialSymbolPacket {
    pub packet_code: u16,
    /// Color level of the text, packet code 8 only.
    pub value_of_text: Option<u16>,
    pub start_i: i16,
    pub start_j: i16,
    pub characters: String,
}

impl TextAndSpecialSymbolPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        let value_of_text = if packet_code == packet_code::TEXT_WITH_VALUE {
            Some(data.read_u16()?)
        } else {
            None
        };
        let start_i = data.read_i16()?;
        let start_j = data.read_i16()?;
        let characters = data.read_string(data.remaining())?;

        if !matches!(
            packet_code,
            packet_code::TEXT_NO_VALUE | packet_code::SPECIAL_SYMBOL | packet_code::TEXT_WITH_VALUE
        ) {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        Ok(Self {
            packet_code,
            value_of_text,
            start_i,
            start_j,
            characters,
        })
    }
}

/// Sets the color of the contour vectors that follow (packet code 0x0802).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SetColorLevelPacket {
    pub color_value_indicator: u16,
    pub value_of_contour: u16,
}

impl SetColorLevelPacket {
    pub const SIZE: usize = 6;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let packet_code = reader.read_u16()?;
        let color_value_indicator = reader.read_u16()?;
        let value_of_contour = reader.read_u16()?;

        if packet_code != packet_code::SET_COLOR_LEVEL {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }
        if color_value_indicator != 0x0002 {
            warn!(color_value_indicator, "Invalid color value indicator");
            return Err(DecodeError::field("color value indicator", color_value_indicator));
        }

        Ok(Self {
            color_value_indicator,
            value_of_contour,
        })
    }
}
