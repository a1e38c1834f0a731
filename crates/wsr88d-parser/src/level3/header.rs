//! Level III message header block.

use chrono::{DateTime, Utc};
use nexrad_common::julian_to_datetime;
use tracing::trace;

use crate::codec::{check_range, FieldReader};
use crate::error::DecodeResult;

/// Halfwords 1-9 of every Level III product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Level3MessageHeader {
    pub message_code: i16,
    pub date_of_message: u16,
    /// Seconds past midnight UTC.
    pub time_of_message: u32,
    /// Bytes in the whole message, header included.
    pub length_of_message: u32,
    pub source_id: u16,
    pub destination_id: u16,
    pub number_blocks: u16,
}

impl Level3MessageHeader {
    pub const SIZE: usize = 18;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let header = Self {
            message_code: reader.read_i16()?,
            date_of_message: reader.read_u16()?,
            time_of_message: reader.read_u32()?,
            length_of_message: reader.read_u32()?,
            source_id: reader.read_u16()?,
            destination_id: reader.read_u16()?,
            number_blocks: reader.read_u16()?,
        };

        let code = i64::from(header.message_code);
        if (-15..0).contains(&code) {
            check_range("message code", code, 0..=211)?;
        }
        check_range("message code", code, -131..=211)?;
        check_range("date", header.date_of_message, 1..=32767)?;
        check_range("time", header.time_of_message, 0..=86399)?;
        check_range("length", header.length_of_message, 18..=1_329_270)?;
        check_range("source ID", header.source_id, 0..=999)?;
        check_range("destination ID", header.destination_id, 0..=999)?;
        check_range("block count", header.number_blocks, 1..=51)?;

        trace!(message_code = header.message_code, "Message code");

        Ok(header)
    }

    /// Bytes that follow the header.
    pub fn data_size(&self) -> usize {
        (self.length_of_message as usize).saturating_sub(Self::SIZE)
    }

    pub fn time(&self) -> Option<DateTime<Utc>> {
        julian_to_datetime(
            u32::from(self.date_of_message),
            self.time_of_message.saturating_mul(1000),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(code: i16, length: u32, blocks: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&code.to_be_bytes());
        out.extend_from_slice(&19449u16.to_be_bytes());
        out.extend_from_slice(&3600u32.to_be_bytes());
        out.extend_from_slice(&length.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&blocks.to_be_bytes());
        out
    }

    #[test]
    fn test_parse_header() {
        let bytes = header_bytes(94, 120, 3);
        let header = Level3MessageHeader::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(header.message_code, 94);
        assert_eq!(header.data_size(), 102);
        assert_eq!(
            header.time().map(|t| t.to_rfc3339()).as_deref(),
            Some("2023-04-01T01:00:00+00:00")
        );
    }

    #[test]
    fn test_invalid_codes() {
        for code in [-132i16, -5, 212] {
            let bytes = header_bytes(code, 120, 3);
            assert!(Level3MessageHeader::parse(&mut FieldReader::new(&bytes)).is_err());
        }
        let bytes = header_bytes(-16, 120, 3);
        assert!(Level3MessageHeader::parse(&mut FieldReader::new(&bytes)).is_ok());
    }

    #[test]
    fn test_invalid_length_and_blocks() {
        let bytes = header_bytes(94, 17, 3);
        assert!(Level3MessageHeader::parse(&mut FieldReader::new(&bytes)).is_err());
        let bytes = header_bytes(94, 120, 52);
        assert!(Level3MessageHeader::parse(&mut FieldReader::new(&bytes)).is_err());
    }
}
