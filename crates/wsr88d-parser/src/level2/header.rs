//! Level II message header (16 bytes).

use tracing::warn;

use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};

/// Header preceding every Level II message or message segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageHeader {
    /// Declared message size in halfwords, including this header.
    pub message_size: u32,
    pub rda_redundant_channel: u8,
    pub message_type: u8,
    pub sequence_number: u16,
    pub julian_date: u16,
    pub milliseconds: u32,
    pub number_of_segments: u16,
    pub segment_number: u16,
}

impl MessageHeader {
    pub const SIZE: usize = 16;

    /// Parse a header, rejecting sizes and times outside the ICD limits.
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let header = Self {
            message_size: u32::from(reader.read_u16()?),
            rda_redundant_channel: reader.read_u8()?,
            message_type: reader.read_u8()?,
            sequence_number: reader.read_u16()?,
            julian_date: reader.read_u16()?,
            milliseconds: reader.read_u32()?,
            number_of_segments: reader.read_u16()?,
            segment_number: reader.read_u16()?,
        };

        if header.message_size < 9 {
            // Zero-sized headers are padding at the end of a record
            if header.message_size != 0 {
                warn!(size = header.message_size, "Invalid message size");
            }
            return Err(DecodeError::InvalidHeader(format!(
                "message size {}",
                header.message_size
            )));
        }
        if header.milliseconds > 86_399_999 {
            warn!(milliseconds = header.milliseconds, "Invalid milliseconds");
            return Err(DecodeError::InvalidHeader(format!(
                "milliseconds {}",
                header.milliseconds
            )));
        }
        if header.message_size < 65534 && header.segment_number > header.number_of_segments {
            warn!(
                segment = header.segment_number,
                total = header.number_of_segments,
                "Invalid segment"
            );
            return Err(DecodeError::InvalidHeader(format!(
                "segment {}/{}",
                header.segment_number, header.number_of_segments
            )));
        }

        Ok(header)
    }

    /// Size of the payload that follows this header, in bytes.
    pub fn payload_size(&self) -> usize {
        (self.message_size as usize * 2).saturating_sub(Self::SIZE)
    }

    /// Rewrite the declared size so the payload is exactly `bytes` long.
    pub fn set_payload_size(&mut self, bytes: usize) {
        self.message_size = ((bytes + Self::SIZE) / 2) as u32;
    }

    pub fn is_segmented(&self) -> bool {
        self.number_of_segments > 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(size: u16, msg_type: u8, ms: u32, segs: u16, seg: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&size.to_be_bytes());
        out.push(0);
        out.push(msg_type);
        out.extend_from_slice(&1u16.to_be_bytes());
        out.extend_from_slice(&19449u16.to_be_bytes());
        out.extend_from_slice(&ms.to_be_bytes());
        out.extend_from_slice(&segs.to_be_bytes());
        out.extend_from_slice(&seg.to_be_bytes());
        out
    }

    #[test]
    fn test_parse_valid_header() {
        let bytes = header_bytes(68, 2, 1000, 1, 1);
        let header = MessageHeader::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(header.message_type, 2);
        assert_eq!(header.payload_size(), 120);
        assert!(!header.is_segmented());
    }

    #[test]
    fn test_rejects_small_size() {
        let bytes = header_bytes(0, 2, 0, 1, 1);
        assert!(MessageHeader::parse(&mut FieldReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_rejects_bad_milliseconds() {
        let bytes = header_bytes(68, 2, 86_400_000, 1, 1);
        assert!(MessageHeader::parse(&mut FieldReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_rejects_segment_past_total() {
        let bytes = header_bytes(68, 15, 0, 2, 3);
        assert!(MessageHeader::parse(&mut FieldReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_set_payload_size() {
        let bytes = header_bytes(68, 15, 0, 3, 3);
        let mut header = MessageHeader::parse(&mut FieldReader::new(&bytes)).unwrap();
        header.set_payload_size(300_000);
        assert_eq!(header.payload_size(), 300_000);
    }
}
