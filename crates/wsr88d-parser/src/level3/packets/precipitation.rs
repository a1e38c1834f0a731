//! Precipitation arrays on the LFM grid (packet codes 17 and 18).

use tracing::warn;

use super::packet_code;
use crate::codec::{check_range, FieldReader};
use crate::error::{DecodeError, DecodeResult};

/// Read the 10-byte array header: code, two spares, boxes per row and rows.
fn array_header(reader: &mut FieldReader<'_>, expected_code: u16) -> DecodeResult<(u16, u16)> {
    let packet_code = reader.read_u16()?;
    reader.skip(4)?; // Spare
    let boxes_per_row = reader.read_u16()?;
    let number_of_rows = reader.read_u16()?;

    if packet_code != expected_code {
        warn!(packet_code, "Invalid packet code");
        return Err(DecodeError::field("packet code", packet_code));
    }
    Ok((boxes_per_row, number_of_rows))
}

/// Digital precipitation array (packet code 17): 131 rows of run-length
/// encoded 1/4 LFM boxes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalPrecipitationDataArrayPacket {
    pub number_of_lfm_boxes_in_row: u16,
    /// `(run, level)` pairs per row.
    pub rows: Vec<Vec<(u8, u8)>>,
}

impl DigitalPrecipitationDataArrayPacket {
    pub const NUMBER_OF_ROWS: u16 = 131;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (number_of_lfm_boxes_in_row, number_of_rows) =
            array_header(reader, packet_code::DIGITAL_PRECIPITATION_DATA_ARRAY)?;
        check_range(
            "number of rows",
            number_of_rows,
            i64::from(Self::NUMBER_OF_ROWS)..=i64::from(Self::NUMBER_OF_ROWS),
        )?;

        let mut rows = Vec::with_capacity(number_of_rows as usize);
        for _ in 0..number_of_rows {
            let number_of_bytes = reader.read_u16()?;
            check_range("row bytes", number_of_bytes, 2..=262)?;
            if number_of_bytes % 2 != 0 {
                return Err(DecodeError::field("row bytes", number_of_bytes));
            }

            let row = reader
                .read_bytes(number_of_bytes as usize)?
                .chunks_exact(2)
                .map(|pair| (pair[0], pair[1]))
                .collect();
            rows.push(row);
        }

        Ok(Self {
            number_of_lfm_boxes_in_row,
            rows,
        })
    }

    /// Expand one row to a level per box.
    pub fn row_levels(&self, row: usize) -> Option<Vec<u8>> {
        self.rows.get(row).map(|runs| {
            runs.iter()
                .flat_map(|&(run, level)| std::iter::repeat(level).take(run as usize))
                .collect()
        })
    }
}

/// Precipitation rate array (packet code 18): 13 rows of packed nibbles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecipitationRateDataArrayPacket {
    pub number_of_lfm_boxes_in_row: u16,
    /// Raw row bytes with any zero pad byte removed.
    pub rows: Vec<Vec<u8>>,
}

impl PrecipitationRateDataArrayPacket {
    pub const NUMBER_OF_ROWS: u16 = 13;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (number_of_lfm_boxes_in_row, number_of_rows) =
            array_header(reader, packet_code::PRECIPITATION_RATE_DATA_ARRAY)?;
        check_range(
            "number of rows",
            number_of_rows,
            i64::from(Self::NUMBER_OF_ROWS)..=i64::from(Self::NUMBER_OF_ROWS),
        )?;

        let mut rows = Vec::with_capacity(number_of_rows as usize);
        for _ in 0..number_of_rows {
            let number_of_bytes = reader.read_u16()?;
            check_range("row bytes", number_of_bytes, 2..=14)?;
            if number_of_bytes % 2 != 0 {
                return Err(DecodeError::field("row bytes", number_of_bytes));
            }

            let mut row = reader.read_bytes(number_of_bytes as usize)?.to_vec();
            if row.last() == Some(&0) {
                row.pop();
            }
            rows.push(row);
        }

        Ok(Self {
            number_of_lfm_boxes_in_row,
            rows,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn array(code: u16, rows: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&code.to_be_bytes());
        out.extend_from_slice(&[0; 4]);
        out.extend_from_slice(&13u16.to_be_bytes());
        out.extend_from_slice(&(rows.len() as u16).to_be_bytes());
        for row in rows {
            out.extend_from_slice(&(row.len() as u16).to_be_bytes());
            out.extend_from_slice(row);
        }
        out
    }

    #[test]
    fn test_digital_precipitation_rows() {
        let row: &[u8] = &[3, 1, 10, 0];
        let rows = vec![row; 131];
        let bytes = array(17, &rows);

        let mut reader = FieldReader::new(&bytes);
        let packet = DigitalPrecipitationDataArrayPacket::parse(&mut reader).unwrap();
        assert!(reader.is_at_end());
        assert_eq!(packet.rows.len(), 131);
        assert_eq!(packet.rows[0], vec![(3, 1), (10, 0)]);
        assert_eq!(packet.row_levels(0).map(|l| l.len()), Some(13));
    }

    #[test]
    fn test_digital_precipitation_row_count() {
        let bytes = array(17, &[&[1, 1]]);
        assert_eq!(
            DigitalPrecipitationDataArrayPacket::parse(&mut FieldReader::new(&bytes)),
            Err(DecodeError::field("number of rows", 1))
        );
    }

    #[test]
    fn test_precipitation_rate_pad_removed() {
        let row: &[u8] = &[0x12, 0x34, 0x50, 0x00];
        let bytes = array(18, &vec![row; 13]);
        let packet = PrecipitationRateDataArrayPacket::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(packet.rows[12], vec![0x12, 0x34, 0x50]);
    }

    #[test]
    fn test_odd_row_rejected() {
        let row: &[u8] = &[1, 2, 3];
        let bytes = array(18, &vec![row; 13]);
        assert_eq!(
            PrecipitationRateDataArrayPacket::parse(&mut FieldReader::new(&bytes)),
            Err(DecodeError::field("row bytes", 3))
        );
    }
}
