//! Level III product files as distributed: a WMO heading, optionally a zlib
//! compressed body carrying a CCB and a second heading, then the product.

use std::io::Read;

use flate2::bufread::ZlibDecoder;
use tracing::{debug, trace, warn};

use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};
use crate::level3::header::Level3MessageHeader;
use crate::level3::message::{Level3Message, ProductKind};
use crate::level3::wmo::{CcbHeader, WmoHeader};

/// First byte of a zlib stream with the default window size.
const ZLIB_MAGIC: u8 = 0x78;

#[derive(Debug, Clone, PartialEq)]
pub struct Level3File {
    pub wmo_header: WmoHeader,
    pub ccb_header: Option<CcbHeader>,
    pub inner_header: Option<WmoHeader>,
    pub message: Level3Message,
}

impl Level3File {
    pub fn load(data: &[u8]) -> DecodeResult<Self> {
        debug!(size = data.len(), "Loading Level III data");

        let mut reader = FieldReader::new(data);
        let wmo_header = WmoHeader::parse(&mut reader)?;

        if reader.peek_u8() == Some(ZLIB_MAGIC) {
            let inflated = inflate_streams(reader.rest())?;
            let mut reader = FieldReader::new(&inflated);
            let ccb_header = CcbHeader::parse(&mut reader)?;
            let inner_header = WmoHeader::parse(&mut reader)?;
            let message = load_message(&mut reader)?;

            Ok(Self {
                wmo_header,
                ccb_header: Some(ccb_header),
                inner_header: Some(inner_header),
                message,
            })
        } else {
            let message = load_message(&mut reader)?;
            Ok(Self {
                wmo_header,
                ccb_header: None,
                inner_header: None,
                message,
            })
        }
    }

    pub fn message_header(&self) -> &Level3MessageHeader {
        self.message.header()
    }

    pub fn icao(&self) -> &str {
        &self.wmo_header.icao
    }
}

/// Inflate back-to-back zlib streams into one buffer.
fn inflate_streams(mut input: &[u8]) -> DecodeResult<Vec<u8>> {
    let mut out = Vec::new();
    let mut total_in = 0u64;

    while input.first() == Some(&ZLIB_MAGIC) {
        let mut decoder = ZlibDecoder::new(input);
        decoder.read_to_end(&mut out).map_err(|e| {
            warn!(error = %e, "Error decompressing data");
            DecodeError::Decompression(e.to_string())
        })?;

        let consumed = decoder.total_in();
        if consumed == 0 {
            break;
        }
        total_in += consumed;
        input = decoder.into_inner();
    }

    trace!(consumed = total_in, decompressed = out.len(), "Inflated Level III data");
    Ok(out)
}

/// Product message following the headings. The declared length is trusted
/// only as far as the data actually goes.
fn load_message(reader: &mut FieldReader<'_>) -> DecodeResult<Level3Message> {
    let header = Level3MessageHeader::parse(reader)?;
    debug!(message_code = header.message_code, "Code");

    let declared = header.data_size();
    if declared > reader.remaining() {
        warn!(declared, available = reader.remaining(), "Level III message truncated");
    }
    let mut data = reader.sub_reader(declared.min(reader.remaining()))?;

    let kind = ProductKind::for_code(header.message_code).unwrap_or(ProductKind::Graphic);
    Level3Message::parse(kind, header, &mut data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::ZlibEncoder;
    use flate2::Compression;
    use std::io::Write;

    fn zlib(data: &[u8]) -> Vec<u8> {
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(data).unwrap();
        encoder.finish().unwrap()
    }

    #[test]
    fn test_inflate_multiple_streams() {
        let mut input = zlib(b"first ");
        input.extend_from_slice(&zlib(b"second"));
        input.extend_from_slice(b"trailer");
        assert_eq!(inflate_streams(&input).unwrap(), b"first second");
    }

    #[test]
    fn test_corrupt_stream() {
        let input = [0x78, 0x9c, 0xFF, 0xFF, 0xFF];
        assert!(inflate_streams(&input).is_err());
    }

    #[test]
    fn test_missing_wmo_header() {
        assert!(Level3File::load(&[0u8; 40]).is_err());
    }
}
