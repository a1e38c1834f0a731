//! Tabular alphanumeric block: pages of 80-column text.

use tracing::{trace, warn};

use crate::codec::{check_range, validate_message, FieldReader};
use crate::error::{DecodeError, DecodeResult};
use crate::level3::description::ProductDescriptionBlock;
use crate::level3::header::Level3MessageHeader;

const MAX_LINE_LENGTH: u16 = 80;
const END_OF_PAGE: u16 = 0xFFFF;

#[derive(Debug, Clone, PartialEq)]
pub struct TabularAlphanumericBlock {
    /// Absent for stand-alone tabular products.
    pub length_of_block: Option<u32>,
    /// Copy of the product header carried inside the block.
    pub message_header: Option<Level3MessageHeader>,
    pub description_block: Option<ProductDescriptionBlock>,
    pub pages: Vec<Vec<String>>,
}

impl TabularAlphanumericBlock {
    pub const BLOCK_ID: i16 = 3;

    /// Parse a block with its divider, ID, length and embedded headers.
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        Self::parse_with(reader, false)
    }

    /// Parse only the pages, as found in stand-alone tabular products.
    pub fn parse_pages(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        Self::parse_with(reader, true)
    }

    fn parse_with(reader: &mut FieldReader<'_>, skip_header: bool) -> DecodeResult<Self> {
        let start = reader.position();

        let mut length_of_block = None;
        let mut message_header = None;
        let mut description_block = None;

        if !skip_header {
            let block_divider = reader.read_i16()?;
            let block_id = reader.read_i16()?;
            let length = reader.read_u32()?;

            if block_divider != -1 {
                warn!(block_divider, "Invalid first block divider");
                return Err(DecodeError::field("block divider", block_divider));
            }
            if block_id != Self::BLOCK_ID {
                warn!(block_id, "Invalid block ID");
                return Err(DecodeError::field("block ID", block_id));
            }
            check_range("block length", length, 10..=i64::from(u32::MAX))?;

            length_of_block = Some(length);
            message_header = Some(Level3MessageHeader::parse(reader)?);
            description_block = Some(ProductDescriptionBlock::parse(reader)?);
        }

        let block_divider = reader.read_i16()?;
        let number_of_pages = reader.read_u16()?;

        if block_divider != -1 {
            warn!(block_divider, "Invalid second block divider");
            return Err(DecodeError::field("block divider", block_divider));
        }
        check_range("number of pages", number_of_pages, 1..=48)?;

        let mut pages = Vec::with_capacity(number_of_pages as usize);
        for page in 1..=number_of_pages {
            let mut lines = Vec::new();
            loop {
                let number_of_characters = reader.read_u16()?;
                if number_of_characters == END_OF_PAGE {
                    break;
                }
                if number_of_characters > MAX_LINE_LENGTH {
                    warn!(number_of_characters, page, "Invalid number of characters");
                    return Err(DecodeError::field("number of characters", number_of_characters));
                }
                lines.push(reader.read_string(number_of_characters as usize)?);
            }
            trace!(page, lines = lines.len(), "Page");
            pages.push(lines);
        }

        if let Some(length) = length_of_block {
            validate_message(reader.position() - start, length as usize)?;
        }

        Ok(Self {
            length_of_block,
            message_header,
            description_block,
            pages,
        })
    }

    /// Lines of every page, in order.
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.pages.iter().flatten().map(String::as_str)
    }
}
