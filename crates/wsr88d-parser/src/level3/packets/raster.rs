use tracing::{trace, warn};

use super::packet_code;
use crate::codec::{check_range, FieldReader};
use crate::error::{DecodeError, DecodeResult};

/// One run-length encoded raster row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterRow {
    /// Packed runs, high nibble is the run length and low nibble the level.
    pub data: Vec<u8>,
}

impl RasterRow {
    pub fn levels(&self) -> Vec<u8> {
        self.data.iter().map(|b| b & 0x0f).collect()
    }

    pub fn expand(&self) -> Vec<u8> {
        self.data
            .iter()
            .flat_map(|b| std::iter::repeat(b & 0x0f).take((b >> 4) as usize))
            .collect()
    }
}

/// Run-length encoded raster image (packet codes 0xBA0F and 0xBA07).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RasterDataPacket {
    pub packet_code: u16,
    pub op_flags: [u16; 2],
    pub i_coordinate_start: i16,
    pub j_coordinate_start: i16,
    pub x_scale_int: u16,
    pub x_scale_fractional: u16,
    pub y_scale_int: u16,
    pub y_scale_fractional: u16,
    pub packaging_descriptor: u16,
    pub rows: Vec<RasterRow>,
}

impl RasterDataPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let packet_code = reader.read_u16()?;
        let op_flags = [reader.read_u16()?, reader.read_u16()?];
        let i_coordinate_start = reader.read_i16()?;
        let j_coordinate_start = reader.read_i16()?;
        let x_scale_int = reader.read_u16()?;
        let x_scale_fractional = reader.read_u16()?;
        let y_scale_int = reader.read_u16()?;
        let y_scale_fractional = reader.read_u16()?;
        let number_of_rows = reader.read_u16()?;
        let packaging_descriptor = reader.read_u16()?;

        if packet_code != packet_code::RASTER_DATA_F && packet_code != packet_code::RASTER_DATA_7 {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }
        check_range("number of rows", number_of_rows, 1..=464)?;

        let mut rows = Vec::with_capacity(number_of_rows as usize);
        for r in 0..number_of_rows {
            let number_of_bytes = reader.read_u16()?;

            if !(2..=920).contains(&number_of_bytes) || number_of_bytes % 2 != 0 {
                warn!(number_of_bytes, row = r, "Invalid number of bytes in row");
                return Err(DecodeError::field("number of bytes in row", number_of_bytes));
            }

            let mut data = reader.read_bytes(number_of_bytes as usize)?.to_vec();
            if data.last() == Some(&0) {
                data.pop();
            }
            rows.push(RasterRow { data });
        }

        trace!(rows = rows.len(), "Parsed raster data packet");

        Ok(Self {
            packet_code,
            op_flags,
            i_coordinate_start,
            j_coordinate_start,
            x_scale_int,
            x_scale_fractional,
            y_scale_int,
            y_scale_fractional,
            packaging_descriptor,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raster(rows: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&0xBA07u16.to_be_bytes());
        out.extend_from_slice(&[0x80, 0x00, 0x00, 0xC0]);
        out.extend_from_slice(&(-256i16).to_be_bytes());
        out.extend_from_slice(&(-256i16).to_be_bytes());
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&4u16.to_be_bytes());
        out.extend_from_slice(&0u16.to_be_bytes());
        out.extend_from_slice(&(rows.len() as u16).to_be_bytes());
        out.extend_from_slice(&2u16.to_be_bytes());
        for row in rows {
            out.extend_from_slice(&(row.len() as u16).to_be_bytes());
            out.extend_from_slice(row);
        }
        out
    }

    #[test]
    fn test_rows_trimmed() {
        let bytes = raster(&[&[0x21, 0x13, 0x40, 0x00], &[0x1A, 0x1B]]);
        let mut reader = FieldReader::new(&bytes);
        let packet = RasterDataPacket::parse(&mut reader).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(packet.i_coordinate_start, -256);
        assert_eq!(packet.rows[0].data, vec![0x21, 0x13, 0x40]);
        assert_eq!(packet.rows[0].expand(), vec![1, 1, 3, 0, 0, 0, 0]);
        assert_eq!(packet.rows[1].levels(), vec![10, 11]);
    }

    #[test]
    fn test_odd_row_length_rejected() {
        let bytes = raster(&[&[0x21, 0x13, 0x40]]);
        assert_eq!(
            RasterDataPacket::parse(&mut FieldReader::new(&bytes)),
            Err(DecodeError::field("number of bytes in row", 3))
        );
    }
}
