//! Cell trend packets (codes 21 and 22).

use tracing::warn;

use super::{framed, packet_code};
use crate::codec::{check_range, FieldReader};
use crate::error::{DecodeError, DecodeResult};

/// History of one attribute of a storm cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTrend {
    pub trend_code: u16,
    /// One-based index into `values` of the latest volume.
    pub latest_volume_pointer: u8,
    pub values: Vec<i16>,
}

/// Trends for one storm cell (packet code 21).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTrendDataPacket {
    pub cell_id: String,
    pub i_position: i16,
    pub j_position: i16,
    pub trends: Vec<CellTrend>,
}

impl CellTrendDataPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        if packet_code != packet_code::CELL_TREND_DATA {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }
        check_range("length of block", data.len() as u32, 12..=198)?;

        let cell_id = data.read_string(2)?;
        let i_position = data.read_i16()?;
        let j_position = data.read_i16()?;

        let mut trends = Vec::new();
        while !data.is_at_end() {
            let trend_code = data.read_u16()?;
            let number_of_volumes = data.read_u8()?;
            let latest_volume_pointer = data.read_u8()?;
            let values = (0..number_of_volumes)
                .map(|_| data.read_i16())
                .collect::<DecodeResult<Vec<_>>>()?;
            trends.push(CellTrend {
                trend_code,
                latest_volume_pointer,
                values,
            });
        }

        Ok(Self {
            cell_id,
            i_position,
            j_position,
            trends,
        })
    }
}

/// Volume scan times the cell trends refer to (packet code 22).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CellTrendVolumeScanTimes {
    pub latest_volume_pointer: u8,
    /// Minutes past midnight UTC.
    pub volume_times: Vec<u16>,
}

impl CellTrendVolumeScanTimes {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        if packet_code != packet_code::CELL_TREND_VOLUME_SCAN_TIMES {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }
        check_range("length of block", data.len() as u32, 4..=22)?;

        let number_of_volumes = data.read_u8()?;
        let latest_volume_pointer = data.read_u8()?;
        let volume_times = data.read_u16_vec(number_of_volumes as usize)?;

        Ok(Self {
            latest_volume_pointer,
            volume_times,
        })
    }
}
