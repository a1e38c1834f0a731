//! Symbology packets.
//!
//! Every packet starts with a 16-bit packet code. [`parse_packet`] peeks at
//! the code and hands the reader, still positioned on the code, to the
//! matching decoder.

mod generic;
mod precipitation;
mod radial;
mod raster;
mod symbol;
mod text;
mod trend;
mod vector;

use tracing::{trace, warn};

pub use generic::{GenericDataPacket, ScitForecastDataPacket};
pub use precipitation::{DigitalPrecipitationDataArrayPacket, PrecipitationRateDataArrayPacket};
pub use radial::{DigitalRadial, DigitalRadialDataArrayPacket, RadialDataPacket, RleRadial};
pub use raster::{RasterDataPacket, RasterRow};
pub use symbol::{
    CircleSymbol, HdaHailSymbol, HdaHailSymbolPacket, MesocycloneSymbolPacket, PointFeature,
    PointFeatureSymbolPacket, PointGraphicSymbolPacket, StiCircleSymbolPacket, StormIdSymbol,
    StormIdSymbolPacket,
};
pub use text::{SetColorLevelPacket, TextAndSpecialSymbolPacket};
pub use trend::{CellTrend, CellTrendDataPacket, CellTrendVolumeScanTimes};
pub use vector::{
    LinkedContourVectorPacket, LinkedVectorPacket, UnlinkedContourVectorPacket,
    UnlinkedVectorPacket, Vector, VectorArrow, VectorArrowDataPacket, WindBarb,
    WindBarbDataPacket,
};

use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};

/// Packet codes with a decoder.
pub mod packet_code {
    pub const TEXT_NO_VALUE: u16 = 1;
    pub const SPECIAL_SYMBOL: u16 = 2;
    pub const MESOCYCLONE: u16 = 3;
    pub const WIND_BARB: u16 = 4;
    pub const VECTOR_ARROW: u16 = 5;
    pub const LINKED_VECTOR_NO_VALUE: u16 = 6;
    pub const UNLINKED_VECTOR_NO_VALUE: u16 = 7;
    pub const TEXT_WITH_VALUE: u16 = 8;
    pub const LINKED_VECTOR_WITH_VALUE: u16 = 9;
    pub const UNLINKED_VECTOR_WITH_VALUE: u16 = 10;
    pub const CORRELATED_SHEAR: u16 = 11;
    pub const TVS: u16 = 12;
    pub const STORM_POSITION_PAST: u16 = 13;
    pub const STORM_POSITION_FORECAST: u16 = 14;
    pub const STORM_ID: u16 = 15;
    pub const DIGITAL_RADIAL_DATA_ARRAY: u16 = 16;
    pub const DIGITAL_PRECIPITATION_DATA_ARRAY: u16 = 17;
    pub const PRECIPITATION_RATE_DATA_ARRAY: u16 = 18;
    pub const HDA_HAIL: u16 = 19;
    pub const POINT_FEATURE: u16 = 20;
    pub const CELL_TREND_DATA: u16 = 21;
    pub const CELL_TREND_VOLUME_SCAN_TIMES: u16 = 22;
    pub const SCIT_PAST_DATA: u16 = 23;
    pub const SCIT_FORECAST_DATA: u16 = 24;
    pub const STI_CIRCLE: u16 = 25;
    pub const ELEVATED_TVS: u16 = 26;
    pub const GENERIC_DATA_28: u16 = 28;
    pub const GENERIC_DATA_29: u16 = 29;
    pub const SET_COLOR_LEVEL: u16 = 0x0802;
    pub const LINKED_CONTOUR_VECTOR: u16 = 0x0E03;
    pub const UNLINKED_CONTOUR_VECTOR: u16 = 0x3501;
    pub const RADIAL_DATA: u16 = 0xAF1F;
    pub const RASTER_DATA_7: u16 = 0xBA07;
    pub const RASTER_DATA_F: u16 = 0xBA0F;
}

#[derive(Debug, Clone, PartialEq)]
pub enum Packet {
    TextAndSpecialSymbol(TextAndSpecialSymbolPacket),
    SetColorLevel(SetColorLevelPacket),
    LinkedVector(LinkedVectorPacket),
    UnlinkedVector(UnlinkedVectorPacket),
    RadialData(RadialDataPacket),
    RasterData(RasterDataPacket),
    DigitalRadialDataArray(DigitalRadialDataArrayPacket),
    Mesocyclone(MesocycloneSymbolPacket),
    WindBarb(WindBarbDataPacket),
    VectorArrow(VectorArrowDataPacket),
    PointGraphic(PointGraphicSymbolPacket),
    StormId(StormIdSymbolPacket),
    DigitalPrecipitationDataArray(DigitalPrecipitationDataArrayPacket),
    PrecipitationRateDataArray(PrecipitationRateDataArrayPacket),
    HdaHail(HdaHailSymbolPacket),
    PointFeature(PointFeatureSymbolPacket),
    CellTrendData(CellTrendDataPacket),
    CellTrendVolumeScanTimes(CellTrendVolumeScanTimes),
    ScitForecastData(ScitForecastDataPacket),
    StiCircle(StiCircleSymbolPacket),
    GenericData(GenericDataPacket),
    LinkedContourVector(LinkedContourVectorPacket),
    UnlinkedContourVector(UnlinkedContourVectorPacket),
}

impl Packet {
    pub fn packet_code(&self) -> u16 {
        match self {
            Packet::TextAndSpecialSymbol(p) => p.packet_code,
            Packet::SetColorLevel(_) => packet_code::SET_COLOR_LEVEL,
            Packet::LinkedVector(p) => p.packet_code,
            Packet::UnlinkedVector(p) => p.packet_code,
            Packet::RadialData(_) => packet_code::RADIAL_DATA,
            Packet::RasterData(p) => p.packet_code,
            Packet::DigitalRadialDataArray(_) => packet_code::DIGITAL_RADIAL_DATA_ARRAY,
            Packet::Mesocyclone(p) => p.packet_code,
            Packet::WindBarb(_) => packet_code::WIND_BARB,
            Packet::VectorArrow(_) => packet_code::VECTOR_ARROW,
            Packet::PointGraphic(p) => p.packet_code,
            Packet::StormId(_) => packet_code::STORM_ID,
            Packet::DigitalPrecipitationDataArray(_) => {
                packet_code::DIGITAL_PRECIPITATION_DATA_ARRAY
            }
            Packet::PrecipitationRateDataArray(_) => packet_code::PRECIPITATION_RATE_DATA_ARRAY,
            Packet::HdaHail(_) => packet_code::HDA_HAIL,
            Packet::PointFeature(_) => packet_code::POINT_FEATURE,
            Packet::CellTrendData(_) => packet_code::CELL_TREND_DATA,
            Packet::CellTrendVolumeScanTimes(_) => packet_code::CELL_TREND_VOLUME_SCAN_TIMES,
            Packet::ScitForecastData(p) => p.packet_code,
            Packet::StiCircle(_) => packet_code::STI_CIRCLE,
            Packet::GenericData(p) => p.packet_code,
            Packet::LinkedContourVector(_) => packet_code::LINKED_CONTOUR_VECTOR,
            Packet::UnlinkedContourVector(_) => packet_code::UNLINKED_CONTOUR_VECTOR,
        }
    }
}

/// Decode the packet at the reader's position.
///
/// An unknown code is an error and leaves the reader where it was.
pub fn parse_packet(reader: &mut FieldReader<'_>) -> DecodeResult<Packet> {
    use self::packet_code::*;

    let code = reader.peek_u16().ok_or(DecodeError::UnexpectedEof {
        offset: reader.position(),
        needed: 2,
        available: reader.remaining(),
    })?;

    let packet = match code {
        TEXT_NO_VALUE | SPECIAL_SYMBOL | TEXT_WITH_VALUE => {
            Packet::TextAndSpecialSymbol(TextAndSpecialSymbolPacket::parse(reader)?)
        }
        SET_COLOR_LEVEL => Packet::SetColorLevel(SetColorLevelPacket::parse(reader)?),
        LINKED_VECTOR_NO_VALUE | LINKED_VECTOR_WITH_VALUE => {
            Packet::LinkedVector(LinkedVectorPacket::parse(reader)?)
        }
        UNLINKED_VECTOR_NO_VALUE | UNLINKED_VECTOR_WITH_VALUE => {
            Packet::UnlinkedVector(UnlinkedVectorPacket::parse(reader)?)
        }
        DIGITAL_RADIAL_DATA_ARRAY => {
            Packet::DigitalRadialDataArray(DigitalRadialDataArrayPacket::parse(reader)?)
        }
        RADIAL_DATA => Packet::RadialData(RadialDataPacket::parse(reader)?),
        RASTER_DATA_7 | RASTER_DATA_F => Packet::RasterData(RasterDataPacket::parse(reader)?),
        MESOCYCLONE | CORRELATED_SHEAR => {
            Packet::Mesocyclone(MesocycloneSymbolPacket::parse(reader)?)
        }
        WIND_BARB => Packet::WindBarb(WindBarbDataPacket::parse(reader)?),
        VECTOR_ARROW => Packet::VectorArrow(VectorArrowDataPacket::parse(reader)?),
        TVS | STORM_POSITION_PAST | STORM_POSITION_FORECAST | ELEVATED_TVS => {
            Packet::PointGraphic(PointGraphicSymbolPacket::parse(reader)?)
        }
        STORM_ID => Packet::StormId(StormIdSymbolPacket::parse(reader)?),
        DIGITAL_PRECIPITATION_DATA_ARRAY => Packet::DigitalPrecipitationDataArray(
            DigitalPrecipitationDataArrayPacket::parse(reader)?,
        ),
        PRECIPITATION_RATE_DATA_ARRAY => {
            Packet::PrecipitationRateDataArray(PrecipitationRateDataArrayPacket::parse(reader)?)
        }
        HDA_HAIL => Packet::HdaHail(HdaHailSymbolPacket::parse(reader)?),
        POINT_FEATURE => Packet::PointFeature(PointFeatureSymbolPacket::parse(reader)?),
        CELL_TREND_DATA => Packet::CellTrendData(CellTrendDataPacket::parse(reader)?),
        CELL_TREND_VOLUME_SCAN_TIMES => {
            Packet::CellTrendVolumeScanTimes(CellTrendVolumeScanTimes::parse(reader)?)
        }
        SCIT_PAST_DATA | SCIT_FORECAST_DATA => {
            Packet::ScitForecastData(ScitForecastDataPacket::parse(reader)?)
        }
        STI_CIRCLE => Packet::StiCircle(StiCircleSymbolPacket::parse(reader)?),
        GENERIC_DATA_28 | GENERIC_DATA_29 => Packet::GenericData(GenericDataPacket::parse(reader)?),
        LINKED_CONTOUR_VECTOR => {
            Packet::LinkedContourVector(LinkedContourVectorPacket::parse(reader)?)
        }
        UNLINKED_CONTOUR_VECTOR => {
            Packet::UnlinkedContourVector(UnlinkedContourVectorPacket::parse(reader)?)
        }
        _ => {
            warn!(packet_code = code, "Unknown packet code: {:#06x}", code);
            return Err(DecodeError::UnknownType(i32::from(code)));
        }
    };

    trace!(packet_code = code, "Found packet");
    Ok(packet)
}

/// Step over a packet without decoding it, assuming the common framing of a
/// code then a 16-bit length.
pub(crate) fn skip_packet(reader: &mut FieldReader<'_>) -> DecodeResult<u16> {
    let code = reader.read_u16()?;
    let length = reader.read_u16()?;
    reader.skip(length as usize)?;
    Ok(code)
}

/// Read the code and 16-bit length that frame the simpler packets and
/// return a reader over exactly `length` bytes of packet data.
fn framed<'a>(reader: &mut FieldReader<'a>) -> DecodeResult<(u16, FieldReader<'a>)> {
    let code = reader.read_u16()?;
    let length = reader.read_u16()?;
    let data = reader.sub_reader(length as usize)?;
    Ok((code, data))
}
