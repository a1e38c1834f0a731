use tracing::{trace, warn};

use super::packet_code;
use crate::codec::{check_range, FieldReader};
use crate::error::{DecodeError, DecodeResult};

/// One run-length encoded radial.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RleRadial {
    /// Tenths of a degree.
    pub start_angle: u16,
    /// Tenths of a degree.
    pub angle_delta: u16,
    /// Packed runs, high nibble is the run length and low nibble the level.
    pub data: Vec<u8>,
}

impl RleRadial {
    pub fn start_angle_degrees(&self) -> f32 {
        f32::from(self.start_angle) * 0.1
    }

    pub fn angle_delta_degrees(&self) -> f32 {
        f32::from(self.angle_delta) * 0.1
    }

    /// Color level of each packed run.
    pub fn levels(&self) -> Vec<u8> {
        self.data.iter().map(|b| b & 0x0f).collect()
    }

    /// `(run, level)` for each packed run.
    pub fn runs(&self) -> impl Iterator<Item = (u8, u8)> + '_ {
        self.data.iter().map(|b| (b >> 4, b & 0x0f))
    }

    /// Expand the runs into one level per range bin.
    pub fn expand(&self) -> Vec<u8> {
        self.runs()
            .flat_map(|(run, level)| std::iter::repeat(level).take(run as usize))
            .collect()
    }
}

/// Run-length encoded radial image (packet code 0xAF1F).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RadialDataPacket {
    pub index_of_first_range_bin: u16,
    pub number_of_range_bins: u16,
    pub i_center_of_sweep: i16,
    pub j_center_of_sweep: i16,
    /// Pixels per range bin, in thousandths.
    pub scale_factor: u16,
    pub radials: Vec<RleRadial>,
}

impl RadialDataPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let packet_code = reader.read_u16()?;
        let index_of_first_range_bin = reader.read_u16()?;
        let number_of_range_bins = reader.read_u16()?;
        let i_center_of_sweep = reader.read_i16()?;
        let j_center_of_sweep = reader.read_i16()?;
        let scale_factor = reader.read_u16()?;
        let number_of_radials = reader.read_u16()?;

        if packet_code != packet_code::RADIAL_DATA {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }
        check_range("number of range bins", number_of_range_bins, 1..=460)?;
        check_range("number of radials", number_of_radials, 1..=400)?;

        let mut radials = Vec::with_capacity(number_of_radials as usize);
        for r in 0..number_of_radials {
            let number_of_rle_halfwords = reader.read_u16()?;
            let start_angle = reader.read_u16()?;
            let angle_delta = reader.read_u16()?;

            if !(1..=230).contains(&number_of_rle_halfwords) {
                warn!(number_of_rle_halfwords, radial = r, "Invalid number of RLE halfwords");
                return Err(DecodeError::field("number of RLE halfwords", number_of_rle_halfwords));
            }

            let mut data = reader.read_bytes(number_of_rle_halfwords as usize * 2)?.to_vec();
            if data.last() == Some(&0) {
                data.pop();
            }

            radials.push(RleRadial {
                start_angle,
                angle_delta,
                data,
            });
        }

        trace!(radials = radials.len(), "Parsed radial data packet");

        Ok(Self {
            index_of_first_range_bin,
            number_of_range_bins,
            i_center_of_sweep,
            j_center_of_sweep,
            scale_factor,
            radials,
        })
    }
}

/// One radial of 8-bit levels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalRadial {
    /// Tenths of a degree.
    pub start_angle: u16,
    /// Tenths of a degree.
    pub delta_angle: u16,
    pub levels: Vec<u8>,
}

/// Digital radial data array (packet code 16).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DigitalRadialDataArrayPacket {
    pub index_of_first_range_bin: i16,
    pub number_of_range_bins: i16,
    pub i_center_of_sweep: i16,
    pub j_center_of_sweep: i16,
    /// Pixels per range bin, in thousandths.
    pub range_scale_factor: u16,
    pub radials: Vec<DigitalRadial>,
}

impl DigitalRadialDataArrayPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let packet_code = reader.read_u16()?;
        let index_of_first_range_bin = reader.read_i16()?;
        let number_of_range_bins = reader.read_i16()?;
        let i_center_of_sweep = reader.read_i16()?;
        let j_center_of_sweep = reader.read_i16()?;
        let range_scale_factor = reader.read_u16()?;
        let number_of_radials = reader.read_u16()?;

        if packet_code != packet_code::DIGITAL_RADIAL_DATA_ARRAY {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }
        check_range("index of first range bin", index_of_first_range_bin, 0..=230)?;
        check_range("number of range bins", number_of_range_bins, 0..=1840)?;
        check_range("number of radials", number_of_radials, 1..=720)?;

        let bins = number_of_range_bins as usize;
        let mut radials = Vec::with_capacity(number_of_radials as usize);
        for r in 0..number_of_radials {
            let number_of_bytes = reader.read_u16()?;
            let start_angle = reader.read_u16()?;
            let delta_angle = reader.read_u16()?;

            if !(1..=1840).contains(&number_of_bytes) {
                warn!(number_of_bytes, radial = r, "Invalid number of bytes");
                return Err(DecodeError::field("number of bytes", number_of_bytes));
            }
            if (number_of_bytes as usize) < bins {
                warn!(
                    number_of_bytes,
                    number_of_range_bins, radial = r,
                    "Number of bytes < number of range bins"
                );
                return Err(DecodeError::field("number of bytes", number_of_bytes));
            }

            // Radials are padded to a halfword boundary
            let data = reader.read_bytes(number_of_bytes as usize)?;
            radials.push(DigitalRadial {
                start_angle,
                delta_angle,
                levels: data[..bins].to_vec(),
            });
        }

        trace!(radials = radials.len(), "Parsed digital radial data array packet");

        Ok(Self {
            index_of_first_range_bin,
            number_of_range_bins,
            i_center_of_sweep,
            j_center_of_sweep,
            range_scale_factor,
            radials,
        })
    }
}
