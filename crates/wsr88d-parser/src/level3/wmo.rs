//! WMO abbreviated heading and the NWS communications control block (CCB)
//! that prefix Level III products in transmission form.

use tracing::debug;

use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};

const SOH: u8 = 0x01;

/// Read up to and including the next line feed, returning the line without it.
fn read_line<'a>(reader: &mut FieldReader<'a>) -> DecodeResult<&'a [u8]> {
    let rest = reader.rest();
    let Some(end) = rest.iter().position(|&b| b == b'\n') else {
        debug!("Reached end of file");
        return Err(DecodeError::UnexpectedEof {
            offset: reader.position(),
            needed: rest.len() + 1,
            available: rest.len(),
        });
    };
    reader.skip(end + 1)?;
    Ok(&rest[..end])
}

fn strip_suffix<'a>(line: &'a [u8], suffix: &[u8], what: &str) -> DecodeResult<&'a [u8]> {
    line.strip_suffix(suffix).ok_or_else(|| {
        debug!("{} is malformed", what);
        DecodeError::InvalidHeader(format!("{} is malformed", what))
    })
}

fn malformed(what: &str) -> DecodeError {
    debug!("{} malformed", what);
    DecodeError::InvalidHeader(format!("{} malformed", what))
}

/// `T1T2A1A2ii CCCC YYGGgg [BBB]` plus the `NNNxxx` AWIPS identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WmoHeader {
    pub sequence_number: Option<String>,
    pub data_type: String,
    pub geographic_designator: String,
    pub bulletin_id: String,
    pub icao: String,
    pub date_time: String,
    pub bbb_indicator: Option<String>,
    pub product_category: String,
    pub product_designator: String,
}

impl WmoHeader {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let mut sequence_number = None;

        if reader.peek_u8() == Some(SOH) {
            let soh_line = read_line(reader)?;
            let sequence_line = read_line(reader)?;
            strip_suffix(soh_line, b"\r\r", "Start of Heading Line")?;
            let sequence = strip_suffix(sequence_line, b" \r\r", "Sequence Line")?;
            sequence_number = Some(String::from_utf8_lossy(sequence).into_owned());
        }

        let wmo_line = read_line(reader)?;
        let awips_line = read_line(reader)?;
        let wmo_line = strip_suffix(wmo_line, b"\r\r", "WMO Abbreviated Heading Line")?;
        let awips_line = strip_suffix(awips_line, b"\r\r", "AWIPS Identifier Line")?;

        let wmo_line = String::from_utf8_lossy(wmo_line);
        let tokens: Vec<&str> = wmo_line.split_whitespace().collect();

        if !(3..=4).contains(&tokens.len()) {
            return Err(malformed("WMO token count"));
        }
        if tokens[0].len() != 6 || !tokens[0].is_ascii() {
            return Err(malformed("WMO identifier"));
        }
        if tokens[1].len() != 4 {
            return Err(malformed("ICAO"));
        }
        if tokens[2].len() != 6 {
            return Err(malformed("Date/time"));
        }
        if tokens.get(3).is_some_and(|bbb| bbb.len() != 3) {
            return Err(malformed("BBB indicator"));
        }

        let awips_line = String::from_utf8_lossy(awips_line);
        let awips_line = awips_line.trim_end();
        if awips_line.len() != 6 || !awips_line.is_ascii() {
            return Err(malformed("AWIPS Identifier Line"));
        }

        let header = Self {
            sequence_number,
            data_type: tokens[0][0..2].to_string(),
            geographic_designator: tokens[0][2..4].to_string(),
            bulletin_id: tokens[0][4..6].to_string(),
            icao: tokens[1].to_string(),
            date_time: tokens[2].to_string(),
            bbb_indicator: tokens.get(3).map(|s| s.to_string()),
            product_category: awips_line[0..3].to_string(),
            product_designator: awips_line[3..6].to_string(),
        };

        debug!(
            data_type = %header.data_type,
            icao = %header.icao,
            date_time = %header.date_time,
            category = %header.product_category,
            "Parsed WMO header"
        );

        Ok(header)
    }
}

/// Communications control block preceding the inner WMO heading of a
/// zlib compressed product.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CcbHeader {
    pub ff: u8,
    /// Halfwords in the block.
    pub ccb_length: u16,
    pub mode: u8,
    pub submode: u8,
    pub precedence: u8,
    pub classification: u8,
    pub message_originator: String,
    pub category: u8,
    pub subcategory: u8,
    pub user_defined: u16,
    pub year: u8,
    pub month: u8,
    pub tor_day: u8,
    pub tor_hour: u8,
    pub tor_minute: u8,
    pub message_destinations: Vec<String>,
}

impl CcbHeader {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let length = reader.read_u16()?;
        let mode = reader.read_u8()?;
        let submode = reader.read_u8()?;
        let precedence = reader.read_u8()?;
        let classification = reader.read_u8()?;
        let message_originator = reader.read_string(4)?;
        let category = reader.read_u8()?;
        let subcategory = reader.read_u8()?;
        let user_defined = reader.read_u16()?;
        let year = reader.read_u8()?;
        let month = reader.read_u8()?;
        let tor_day = reader.read_u8()?;
        let tor_hour = reader.read_u8()?;
        let tor_minute = reader.read_u8()?;
        let number_of_destinations = reader.read_u8()?;

        let message_destinations = (0..number_of_destinations)
            .map(|_| reader.read_string(4))
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self {
            ff: (length >> 14) as u8,
            ccb_length: length & 0x3fff,
            mode,
            submode,
            precedence,
            classification,
            message_originator,
            category,
            subcategory,
            user_defined,
            year,
            month,
            tor_day,
            tor_hour,
            tor_minute,
            message_destinations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_with_soh() {
        let bytes = b"\x01\r\r\n123 \r\r\nSDUS53 KLSX 012359\r\r\nN0QLSX\r\r\nrest";
        let mut reader = FieldReader::new(bytes);
        let header = WmoHeader::parse(&mut reader).unwrap();
        assert_eq!(header.sequence_number.as_deref(), Some("123"));
        assert_eq!(header.data_type, "SD");
        assert_eq!(header.geographic_designator, "US");
        assert_eq!(header.bulletin_id, "53");
        assert_eq!(header.icao, "KLSX");
        assert_eq!(header.date_time, "012359");
        assert_eq!(header.bbb_indicator, None);
        assert_eq!(header.product_category, "N0Q");
        assert_eq!(header.product_designator, "LSX");
        assert_eq!(reader.rest(), b"rest");
    }

    #[test]
    fn test_header_with_bbb() {
        let bytes = b"SDUS53 KLSX 012359 RRA\r\r\nN0QLSX\r\r\n";
        let header = WmoHeader::parse(&mut FieldReader::new(bytes)).unwrap();
        assert_eq!(header.sequence_number, None);
        assert_eq!(header.bbb_indicator.as_deref(), Some("RRA"));
    }

    #[test]
    fn test_malformed_lines() {
        let missing_cr = b"SDUS53 KLSX 012359\r\nN0QLSX\r\r\n";
        assert!(WmoHeader::parse(&mut FieldReader::new(missing_cr)).is_err());

        let bad_icao = b"SDUS53 KLS 012359\r\r\nN0QLSX\r\r\n";
        assert!(WmoHeader::parse(&mut FieldReader::new(bad_icao)).is_err());

        let truncated = b"SDUS53 KLSX 012359\r\r\n";
        assert!(WmoHeader::parse(&mut FieldReader::new(truncated)).is_err());
    }

    #[test]
    fn test_ccb_header() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(&(0x4000u16 | 12).to_be_bytes());
        bytes.extend_from_slice(&[2, 0, b'4', b'U']);
        bytes.extend_from_slice(b"KLSX");
        bytes.extend_from_slice(&[3, 1]);
        bytes.extend_from_slice(&0u16.to_be_bytes());
        bytes.extend_from_slice(&[23, 4, 1, 23, 59, 1]);
        bytes.extend_from_slice(b"NWSA");

        let ccb = CcbHeader::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(ccb.ff, 1);
        assert_eq!(ccb.ccb_length, 12);
        assert_eq!(ccb.message_originator, "KLSX");
        assert_eq!(ccb.message_destinations, vec!["NWSA".to_string()]);
    }
}
