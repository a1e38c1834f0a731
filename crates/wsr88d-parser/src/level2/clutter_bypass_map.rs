//! Clutter Filter Bypass Map (message type 13).

use tracing::trace;

use crate::codec::{check_range, validate_message, FieldReader};
use crate::error::DecodeResult;

pub const NUM_RADIALS: usize = 360;
pub const NUM_RANGE_BINS: usize = 512;
/// Halfwords per radial; each bit is one range bin.
pub const NUM_CODED_RANGE_BINS: usize = NUM_RANGE_BINS / 16;

#[derive(Debug, Clone, PartialEq)]
pub struct ClutterFilterBypassMap {
    pub map_generation_date: u16,
    pub map_generation_time: u16,
    /// `[elevation segment][radial]` → 32 halfwords of bypass bits.
    pub range_bins: Vec<Vec<Vec<u16>>>,
}

impl ClutterFilterBypassMap {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        trace!("Parsing Clutter Filter Bypass Map (Message Type 13)");

        let map_generation_date = reader.read_u16()?;
        let map_generation_time = reader.read_u16()?;
        let num_elevation_segments = reader.read_u16()?;

        check_range("map generation date", map_generation_date, 1..=i64::from(u16::MAX))?;
        check_range("map generation time", map_generation_time, 0..=1440)?;
        check_range("number of elevation segments", num_elevation_segments, 1..=5)?;

        let mut range_bins = Vec::with_capacity(num_elevation_segments as usize);
        for _ in 0..num_elevation_segments {
            reader.skip(2)?; // Segment number (redundant)

            let mut radials = Vec::with_capacity(NUM_RADIALS);
            for _ in 0..NUM_RADIALS {
                radials.push(reader.read_u16_vec(NUM_CODED_RANGE_BINS)?);
            }
            range_bins.push(radials);
        }

        validate_message(reader.position(), reader.len())?;

        Ok(Self {
            map_generation_date,
            map_generation_time,
            range_bins,
        })
    }

    /// Whether the bypass map applies at a given elevation segment, radial and bin.
    pub fn is_bypassed(&self, elevation_segment: usize, radial: usize, bin: usize) -> bool {
        if bin >= NUM_RANGE_BINS {
            return false;
        }
        self.range_bins
            .get(elevation_segment)
            .and_then(|e| e.get(radial))
            .and_then(|words| words.get(bin / 16))
            .map(|word| word & (0x8000 >> (bin % 16)) != 0)
            .unwrap_or(false)
    }
}
