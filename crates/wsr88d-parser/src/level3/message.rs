//! Level III product messages and the message factory.

use std::io::Read;

use bzip2::read::BzDecoder;
use tracing::{debug, trace, warn};

use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};
use crate::level3::description::ProductDescriptionBlock;
use crate::level3::header::Level3MessageHeader;
use crate::level3::status::{GeneralStatusMessage, RadarCodedMessage};
use crate::level3::symbology::{GraphicAlphanumericBlock, ProductSymbologyBlock};
use crate::level3::tabular::TabularAlphanumericBlock;

/// Message codes decoded as graphic products.
const GRAPHIC_PRODUCTS: &[i16] = &[
    19, 20, 27, 30, 31, 32, 37, 38, 41, 48, 49, 50, 51, 56, 57, 58, 59, 61, 65, 66, 67, 78, 79, 80,
    81, 84, 86, 90, 93, 94, 97, 98, 99, 100, 101, 102, 104, 105, 107, 108, 109, 110, 111, 113, 132,
    133, 134, 135, 137, 138, 140, 141, 143, 144, 145, 146, 147, 149, 150, 151, 152, 153, 154, 155,
    159, 161, 163, 165, 166, 167, 168, 169, 170, 171, 172, 173, 174, 175, 176, 177, 178, 179, 193,
    195, 196, 202,
];

/// Message codes decoded as stand-alone tabular products.
const TABULAR_PRODUCTS: [i16; 4] = [62, 75, 77, 82];

const GENERAL_STATUS: i16 = 2;
const RADAR_CODED_MESSAGE: i16 = 74;

/// Offsets in the description block count from the start of the message.
const OFFSET_BASE: usize = Level3MessageHeader::SIZE + ProductDescriptionBlock::SIZE;

/// Kind of decoder used for a message code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductKind {
    Graphic,
    Tabular,
    GeneralStatus,
    RadarCoded,
}

impl ProductKind {
    pub fn for_code(message_code: i16) -> Option<Self> {
        if message_code == GENERAL_STATUS {
            Some(ProductKind::GeneralStatus)
        } else if message_code == RADAR_CODED_MESSAGE {
            Some(ProductKind::RadarCoded)
        } else if GRAPHIC_PRODUCTS.contains(&message_code) {
            Some(ProductKind::Graphic)
        } else if TABULAR_PRODUCTS.contains(&message_code) {
            Some(ProductKind::Tabular)
        } else {
            None
        }
    }
}

/// Graphic product: description block plus up to three optional blocks.
///
/// A block that fails to decode is left as `None` without invalidating the
/// rest of the product.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicProductMessage {
    pub header: Level3MessageHeader,
    pub description_block: ProductDescriptionBlock,
    pub symbology_block: Option<ProductSymbologyBlock>,
    pub graphic_block: Option<GraphicAlphanumericBlock>,
    pub tabular_block: Option<TabularAlphanumericBlock>,
}

impl GraphicProductMessage {
    /// Parse from a reader spanning exactly the bytes after the header.
    pub fn parse(header: Level3MessageHeader, reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let description_block = ProductDescriptionBlock::parse(reader)?;
        let data = reader.rest();
        reader.seek_clamped(reader.len());

        let decompressed;
        let body = if description_block.is_compression_enabled() {
            decompressed = decompress_symbology(data)?;
            trace!(size = decompressed.len(), "Decompressed data size");
            &decompressed[..]
        } else {
            data
        };

        debug!("Loading Blocks");

        let symbology_block = load_block(
            body,
            description_block.offset_to_symbology,
            "Product symbology block",
            ProductSymbologyBlock::parse,
        );
        let graphic_block = load_block(
            body,
            description_block.offset_to_graphic,
            "Graphic alphanumeric block",
            GraphicAlphanumericBlock::parse,
        );
        let tabular_block = load_block(
            body,
            description_block.offset_to_tabular,
            "Tabular alphanumeric block",
            TabularAlphanumericBlock::parse,
        );

        Ok(Self {
            header,
            description_block,
            symbology_block,
            graphic_block,
            tabular_block,
        })
    }
}

/// Stand-alone tabular product. The pages sit at the symbology offset
/// without a block header.
#[derive(Debug, Clone, PartialEq)]
pub struct TabularProductMessage {
    pub header: Level3MessageHeader,
    pub description_block: ProductDescriptionBlock,
    pub tabular_block: Option<TabularAlphanumericBlock>,
}

impl TabularProductMessage {
    pub fn parse(header: Level3MessageHeader, reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let description_block = ProductDescriptionBlock::parse(reader)?;
        let body = reader.rest();
        reader.seek_clamped(reader.len());

        debug!("Loading Blocks");

        let tabular_block = load_block(
            body,
            description_block.offset_to_symbology,
            "Tabular alphanumeric block",
            TabularAlphanumericBlock::parse_pages,
        );

        Ok(Self {
            header,
            description_block,
            tabular_block,
        })
    }
}

/// A decoded Level III message.
#[derive(Debug, Clone, PartialEq)]
pub enum Level3Message {
    GraphicProduct(GraphicProductMessage),
    TabularProduct(TabularProductMessage),
    GeneralStatus(GeneralStatusMessage),
    RadarCoded(RadarCodedMessage),
}

impl Level3Message {
    /// Decode the bytes after `header` with the decoder for `kind`.
    pub fn parse(
        kind: ProductKind,
        header: Level3MessageHeader,
        reader: &mut FieldReader<'_>,
    ) -> DecodeResult<Self> {
        match kind {
            ProductKind::Graphic => {
                GraphicProductMessage::parse(header, reader).map(Level3Message::GraphicProduct)
            }
            ProductKind::Tabular => {
                TabularProductMessage::parse(header, reader).map(Level3Message::TabularProduct)
            }
            ProductKind::GeneralStatus => {
                GeneralStatusMessage::parse(header, reader).map(Level3Message::GeneralStatus)
            }
            ProductKind::RadarCoded => {
                RadarCodedMessage::parse(header, reader).map(Level3Message::RadarCoded)
            }
        }
    }

    pub fn header(&self) -> &Level3MessageHeader {
        match self {
            Level3Message::GraphicProduct(m) => &m.header,
            Level3Message::TabularProduct(m) => &m.header,
            Level3Message::GeneralStatus(m) => &m.header,
            Level3Message::RadarCoded(m) => &m.header,
        }
    }

    /// The product description block; the general status message has none.
    pub fn description_block(&self) -> Option<&ProductDescriptionBlock> {
        match self {
            Level3Message::GraphicProduct(m) => Some(&m.description_block),
            Level3Message::TabularProduct(m) => Some(&m.description_block),
            Level3Message::RadarCoded(m) => Some(&m.description_block),
            Level3Message::GeneralStatus(_) => None,
        }
    }

    pub fn tabular_block(&self) -> Option<&TabularAlphanumericBlock> {
        match self {
            Level3Message::GraphicProduct(m) => m.tabular_block.as_ref(),
            Level3Message::TabularProduct(m) => m.tabular_block.as_ref(),
            _ => None,
        }
    }
}

/// Read one Level III message.
///
/// Unless the header itself is invalid, the reader is left at the end of the
/// declared message length (or the end of the input).
pub fn create_message(reader: &mut FieldReader<'_>) -> DecodeResult<Level3Message> {
    let header = Level3MessageHeader::parse(reader)?;
    let data_size = header.data_size();

    let Some(kind) = ProductKind::for_code(header.message_code) else {
        warn!(message_code = header.message_code, "Unknown message type");
        reader.seek_clamped(reader.position() + data_size);
        return Err(DecodeError::UnknownType(i32::from(header.message_code)));
    };

    debug!(message_code = header.message_code, "Found Message");

    let mut data = reader.sub_reader(data_size).map_err(|e| {
        warn!(error = %e, "End of data reached reading message");
        reader.seek_clamped(reader.len());
        e
    })?;

    Level3Message::parse(kind, header, &mut data)
}

fn decompress_symbology(data: &[u8]) -> DecodeResult<Vec<u8>> {
    let mut out = Vec::new();
    BzDecoder::new(data).read_to_end(&mut out).map_err(|e| {
        warn!(error = %e, "Error decompressing data");
        DecodeError::Decompression(e.to_string())
    })?;
    Ok(out)
}

fn load_block<T>(
    body: &[u8],
    offset_halfwords: u32,
    name: &str,
    parse: fn(&mut FieldReader<'_>) -> DecodeResult<T>,
) -> Option<T> {
    let offset = offset_halfwords as usize * 2;
    if offset < OFFSET_BASE {
        return None;
    }

    let mut reader = FieldReader::new(body);
    let result = reader.seek(offset - OFFSET_BASE).and_then(|_| parse(&mut reader));
    debug!(block = name, valid = result.is_ok(), "Block loaded");
    result.ok()
}
