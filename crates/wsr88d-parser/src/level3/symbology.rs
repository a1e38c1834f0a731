//! Product symbology block and the paged packet lists shared with the
//! graphic alphanumeric block.

use tracing::{debug, trace, warn};

use crate::codec::{check_range, validate_message, FieldReader};
use crate::error::{DecodeError, DecodeResult};
use crate::level3::packets::{parse_packet, skip_packet, Packet};

/// Decode packets until `length` bytes are consumed.
///
/// Packets with an unknown code are stepped over. On a short or long read
/// the reader is moved to the declared end and the list is rejected.
pub(crate) fn parse_packet_list(
    reader: &mut FieldReader<'_>,
    length: usize,
) -> DecodeResult<Vec<Packet>> {
    let start = reader.position();
    let end = start + length;
    let mut packets = Vec::new();
    let mut bytes_read = 0;

    while bytes_read < length {
        match parse_packet(reader) {
            Ok(packet) => packets.push(packet),
            Err(DecodeError::UnknownType(code)) => {
                if skip_packet(reader).is_err() {
                    break;
                }
                debug!(packet_code = code, "Skipped unknown packet");
            }
            Err(_) => break,
        }
        bytes_read = reader.position() - start;
    }

    if bytes_read != length {
        if bytes_read < length {
            trace!(bytes_read, length, "Packet list bytes read smaller than size");
        } else {
            warn!(bytes_read, length, "Packet list bytes read larger than size");
        }
        reader.seek_clamped(end);
        return Err(DecodeError::SizeMismatch {
            read: bytes_read,
            declared: length,
        });
    }

    Ok(packets)
}

fn parse_block_header(reader: &mut FieldReader<'_>, block_id: i16) -> DecodeResult<(u32, u16)> {
    let block_divider = reader.read_i16()?;
    let id = reader.read_i16()?;
    let length_of_block = reader.read_u32()?;
    let count = reader.read_u16()?;

    if block_divider != -1 {
        warn!(block_divider, "Invalid block divider");
        return Err(DecodeError::field("block divider", block_divider));
    }
    if id != block_id {
        warn!(block_id = id, "Invalid block ID");
        return Err(DecodeError::field("block ID", id));
    }
    check_range("block length", length_of_block, 10..=i64::from(u32::MAX))?;

    Ok((length_of_block, count))
}

/// Packets grouped by data layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductSymbologyBlock {
    pub length_of_block: u32,
    pub layers: Vec<Vec<Packet>>,
}

impl ProductSymbologyBlock {
    pub const BLOCK_ID: i16 = 1;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let start = reader.position();

        let (length_of_block, number_of_layers) = parse_block_header(reader, Self::BLOCK_ID)?;
        check_range("number of layers", number_of_layers, 1..=18)?;

        let mut layers = Vec::with_capacity(number_of_layers as usize);
        for i in 0..number_of_layers {
            trace!(layer = i, "Layer");

            let _layer_divider = reader.read_i16()?;
            let length_of_layer = reader.read_u32()?;
            layers.push(parse_packet_list(reader, length_of_layer as usize)?);
        }

        validate_message(reader.position() - start, length_of_block as usize)?;

        Ok(Self {
            length_of_block,
            layers,
        })
    }

    pub fn packets(&self) -> impl Iterator<Item = &Packet> {
        self.layers.iter().flatten()
    }
}

/// Packets grouped by page.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicAlphanumericBlock {
    pub length_of_block: u32,
    pub pages: Vec<Vec<Packet>>,
}

impl GraphicAlphanumericBlock {
    pub const BLOCK_ID: i16 = 2;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let start = reader.position();

        let (length_of_block, number_of_pages) = parse_block_header(reader, Self::BLOCK_ID)?;
        check_range("number of pages", number_of_pages, 1..=48)?;

        let mut pages = Vec::with_capacity(number_of_pages as usize);
        for i in 1..=number_of_pages {
            trace!(page = i, "Page");

            let page_number = reader.read_u16()?;
            let length_of_page = reader.read_u16()?;

            if page_number != i {
                warn!(expected = i, found = page_number, "Page out of order");
            }

            pages.push(parse_packet_list(reader, length_of_page as usize)?);
        }

        validate_message(reader.position() - start, length_of_block as usize)?;

        Ok(Self {
            length_of_block,
            pages,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_packet(value: u16) -> Vec<u8> {
        let mut out = vec![0x08, 0x02, 0x00, 0x02];
        out.extend_from_slice(&value.to_be_bytes());
        out
    }

    fn symbology(layers: &[Vec<u8>]) -> Vec<u8> {
        let mut body = Vec::new();
        for layer in layers {
            body.extend_from_slice(&(-1i16).to_be_bytes());
            body.extend_from_slice(&(layer.len() as u32).to_be_bytes());
            body.extend_from_slice(layer);
        }
        let mut out = Vec::new();
        out.extend_from_slice(&(-1i16).to_be_bytes());
        out.extend_from_slice(&1i16.to_be_bytes());
        out.extend_from_slice(&((body.len() + 10) as u32).to_be_bytes());
        out.extend_from_slice(&(layers.len() as u16).to_be_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn test_layers_parsed() {
        let mut layer = color_packet(1);
        layer.extend_from_slice(&color_packet(2));
        let bytes = symbology(&[layer, color_packet(3)]);

        let mut reader = FieldReader::new(&bytes);
        let block = ProductSymbologyBlock::parse(&mut reader).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(block.layers.len(), 2);
        assert_eq!(block.layers[0].len(), 2);
        assert_eq!(block.packets().count(), 3);
    }

    #[test]
    fn test_unknown_packet_skipped() {
        let mut layer = color_packet(1);
        layer.extend_from_slice(&[0x00, 0x63, 0x00, 0x04, 1, 2, 3, 4]);
        layer.extend_from_slice(&color_packet(2));
        let bytes = symbology(&[layer, color_packet(3)]);

        let mut reader = FieldReader::new(&bytes);
        let block = ProductSymbologyBlock::parse(&mut reader).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(block.layers[0].len(), 2);
        assert_eq!(block.packets().count(), 3);
    }

    #[test]
    fn test_unknown_packet_overrunning_layer() {
        let mut layer = color_packet(1);
        layer.extend_from_slice(&[0x00, 0x63, 0x00, 0x40, 1, 2]);
        let bytes = symbology(&[layer]);
        assert!(ProductSymbologyBlock::parse(&mut FieldReader::new(&bytes)).is_err());
    }

    #[test]
    fn test_packet_list_realigns() {
        let mut bytes = color_packet(1);
        // Set color level with a bad color value indicator
        bytes.extend_from_slice(&[0x08, 0x02, 0x00, 0x03, 0x00, 0x07]);
        bytes.extend_from_slice(&color_packet(2));

        let mut reader = FieldReader::new(&bytes);
        assert!(parse_packet_list(&mut reader, 12).is_err());
        assert_eq!(reader.position(), 12);
        assert_eq!(parse_packet_list(&mut reader, 6).unwrap().len(), 1);
    }

    #[test]
    fn test_graphic_pages() {
        let mut body = Vec::new();
        for page in 1..=2u16 {
            let packet = color_packet(page);
            body.extend_from_slice(&page.to_be_bytes());
            body.extend_from_slice(&(packet.len() as u16).to_be_bytes());
            body.extend_from_slice(&packet);
        }
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(-1i16).to_be_bytes());
        bytes.extend_from_slice(&2i16.to_be_bytes());
        bytes.extend_from_slice(&((body.len() + 10) as u32).to_be_bytes());
        bytes.extend_from_slice(&2u16.to_be_bytes());
        bytes.extend_from_slice(&body);

        let block = GraphicAlphanumericBlock::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(block.pages.len(), 2);
        assert_eq!(block.pages[1].len(), 1);
    }

    #[test]
    fn test_wrong_block_id() {
        let mut bytes = symbology(&[color_packet(1)]);
        bytes[3] = 2;
        assert_eq!(
            ProductSymbologyBlock::parse(&mut FieldReader::new(&bytes)),
            Err(DecodeError::field("block ID", 2))
        );
    }
}
