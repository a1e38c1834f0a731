//! Special graphic symbols: fixed-size records placed at screen positions.

use tracing::warn;

use super::{framed, packet_code};
use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};

/// Decode whole `size`-byte records until the packet data runs out.
/// Trailing bytes that do not make a whole record are ignored.
fn records<T>(
    data: &mut FieldReader<'_>,
    size: usize,
    read: impl Fn(&mut FieldReader<'_>) -> DecodeResult<T>,
) -> DecodeResult<Vec<T>> {
    (0..data.remaining() / size).map(|_| read(data)).collect()
}

fn check_code(packet_code: u16, valid: &[u16]) -> DecodeResult<()> {
    if !valid.contains(&packet_code) {
        warn!(packet_code, "Invalid packet code");
        return Err(DecodeError::field("packet code", packet_code));
    }
    Ok(())
}

/// A symbol with a radius in screen units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CircleSymbol {
    pub i_position: i16,
    pub j_position: i16,
    pub radius: i16,
}

fn circle(data: &mut FieldReader<'_>) -> DecodeResult<CircleSymbol> {
    Ok(CircleSymbol {
        i_position: data.read_i16()?,
        j_position: data.read_i16()?,
        radius: data.read_i16()?,
    })
}

/// Mesocyclone (packet code 3) or correlated shear (packet code 11).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MesocycloneSymbolPacket {
    pub packet_code: u16,
    pub symbols: Vec<CircleSymbol>,
}

impl MesocycloneSymbolPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;
        check_code(
            packet_code,
            &[packet_code::MESOCYCLONE, packet_code::CORRELATED_SHEAR],
        )?;

        Ok(Self {
            packet_code,
            symbols: records(&mut data, 6, circle)?,
        })
    }
}

/// Storm track information circle (packet code 25).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StiCircleSymbolPacket {
    pub circles: Vec<CircleSymbol>,
}

impl StiCircleSymbolPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;
        check_code(packet_code, &[packet_code::STI_CIRCLE])?;

        Ok(Self {
            circles: records(&mut data, 6, circle)?,
        })
    }
}

/// Position-only symbols: TVS (12), elevated TVS (26), and past (13) or
/// forecast (14) storm positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointGraphicSymbolPacket {
    pub packet_code: u16,
    pub points: Vec<(i16, i16)>,
}

impl PointGraphicSymbolPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;
        check_code(
            packet_code,
            &[
                packet_code::TVS,
                packet_code::STORM_POSITION_PAST,
                packet_code::STORM_POSITION_FORECAST,
                packet_code::ELEVATED_TVS,
            ],
        )?;

        Ok(Self {
            packet_code,
            points: records(&mut data, 4, |d| Ok((d.read_i16()?, d.read_i16()?)))?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StormIdSymbol {
    pub i_position: i16,
    pub j_position: i16,
    /// Two-character storm identifier.
    pub storm_id: String,
}

/// Storm ID labels (packet code 15).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StormIdSymbolPacket {
    pub symbols: Vec<StormIdSymbol>,
}

impl StormIdSymbolPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;
        check_code(packet_code, &[packet_code::STORM_ID])?;

        let symbols = records(&mut data, 6, |d| {
            Ok(StormIdSymbol {
                i_position: d.read_i16()?,
                j_position: d.read_i16()?,
                storm_id: d.read_string(2)?,
            })
        })?;

        Ok(Self { symbols })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HdaHailSymbol {
    pub i_position: i16,
    pub j_position: i16,
    /// Percent, or -999 when the cell is out of range.
    pub probability_of_hail: i16,
    pub probability_of_severe_hail: i16,
    /// Inches, rounded.
    pub max_hail_size: u16,
}

/// Hail detection algorithm results (packet code 19).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HdaHailSymbolPacket {
    pub symbols: Vec<HdaHailSymbol>,
}

impl HdaHailSymbolPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;
        check_code(packet_code, &[packet_code::HDA_HAIL])?;

        let symbols = records(&mut data, 10, |d| {
            Ok(HdaHailSymbol {
                i_position: d.read_i16()?,
                j_position: d.read_i16()?,
                probability_of_hail: d.read_i16()?,
                probability_of_severe_hail: d.read_i16()?,
                max_hail_size: d.read_u16()?,
            })
        })?;

        Ok(Self { symbols })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PointFeature {
    pub i_position: i16,
    pub j_position: i16,
    pub feature_type: u16,
    pub feature_attribute: u16,
}

/// Mesocyclone detection features (packet code 20).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PointFeatureSymbolPacket {
    pub features: Vec<PointFeature>,
}

impl PointFeatureSymbolPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;
        check_code(packet_code, &[packet_code::POINT_FEATURE])?;

        let features = records(&mut data, 8, |d| {
            Ok(PointFeature {
                i_position: d.read_i16()?,
                j_position: d.read_i16()?,
                feature_type: d.read_u16()?,
                feature_attribute: d.read_u16()?,
            })
        })?;

        Ok(Self { features })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packet(code: u16, halfwords: &[i16]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&code.to_be_bytes());
        out.extend_from_slice(&((halfwords.len() * 2) as u16).to_be_bytes());
        for hw in halfwords {
            out.extend_from_slice(&hw.to_be_bytes());
        }
        out
    }

    #[test]
    fn test_mesocyclone_symbols() {
        let bytes = packet(3, &[10, 20, 4, -10, -20, 6]);
        let mut reader = FieldReader::new(&bytes);
        let packet = MesocycloneSymbolPacket::parse(&mut reader).unwrap();
        assert_eq!(packet.symbols.len(), 2);
        assert_eq!(packet.symbols[1].radius, 6);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_wrong_code_rejected() {
        let bytes = packet(12, &[1, 2, 3]);
        assert_eq!(
            MesocycloneSymbolPacket::parse(&mut FieldReader::new(&bytes)),
            Err(DecodeError::field("packet code", 12))
        );
    }

    #[test]
    fn test_storm_id() {
        let mut bytes = packet(15, &[5, -5]);
        bytes.extend_from_slice(b"A0");
        bytes[3] = 6;
        let packet = StormIdSymbolPacket::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(packet.symbols[0].storm_id, "A0");
        assert_eq!(packet.symbols[0].j_position, -5);
    }

    #[test]
    fn test_hail_symbols() {
        let bytes = packet(19, &[1, 2, -999, 30, 2]);
        let packet = HdaHailSymbolPacket::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(packet.symbols[0].probability_of_hail, -999);
        assert_eq!(packet.symbols[0].max_hail_size, 2);
    }

    #[test]
    fn test_partial_record_ignored() {
        let bytes = packet(20, &[1, 2, 3, 4, 5]);
        let mut reader = FieldReader::new(&bytes);
        let packet = PointFeatureSymbolPacket::parse(&mut reader).unwrap();
        assert_eq!(packet.features.len(), 1);
        assert!(reader.is_at_end());
    }
}
