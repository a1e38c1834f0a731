//! Packets whose bodies are kept as bytes: SCIT past and forecast data
//! (codes 23 and 24) and generic data (codes 28 and 29).

use bytes::Bytes;
use tracing::warn;

use super::{framed, packet_code, parse_packet, Packet};
use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};

/// SCIT past (23) or forecast (24) track data. The body is itself a list
/// of symbology packets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScitForecastDataPacket {
    pub packet_code: u16,
    pub data: Bytes,
}

impl ScitForecastDataPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, data) = framed(reader)?;

        if !matches!(
            packet_code,
            packet_code::SCIT_PAST_DATA | packet_code::SCIT_FORECAST_DATA
        ) {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        Ok(Self {
            packet_code,
            data: Bytes::copy_from_slice(data.rest()),
        })
    }

    /// Decode the embedded packets.
    pub fn packets(&self) -> DecodeResult<Vec<Packet>> {
        let mut reader = FieldReader::new(&self.data);
        let mut packets = Vec::new();
        while !reader.is_at_end() {
            packets.push(parse_packet(&mut reader)?);
        }
        Ok(packets)
    }
}

/// Generic data (28 for products, 29 for the product description). The
/// body is XDR encoded and kept undecoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenericDataPacket {
    pub packet_code: u16,
    pub data: Bytes,
}

impl GenericDataPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let packet_code = reader.read_u16()?;
        reader.skip(2)?; // Reserved
        let length_of_block = reader.read_u32()?;
        let data = reader.read_bytes(length_of_block as usize)?;

        if !matches!(
            packet_code,
            packet_code::GENERIC_DATA_28 | packet_code::GENERIC_DATA_29
        ) {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        Ok(Self {
            packet_code,
            data: Bytes::copy_from_slice(data),
        })
    }
}
