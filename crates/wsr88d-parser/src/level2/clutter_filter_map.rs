//! Clutter Filter Map (message type 15).
//!
//! The map is nested: elevation segments, each holding a fixed table of
//! 360 azimuth segments, each holding a variable list of range zones.

use tracing::trace;

use crate::codec::{check_range, validate_message, FieldReader};
use crate::error::DecodeResult;

/// Number of one-degree azimuth segments per elevation segment.
pub const NUM_AZIMUTH_SEGMENTS: usize = 360;

/// A range interval within one azimuth segment and its filter behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeZone {
    /// 0 = bypass filter, 1 = bypass map in control, 2 = force filter.
    pub op_code: u16,
    /// End of the zone in km.
    pub end_range: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClutterFilterMap {
    pub map_generation_date: u16,
    pub map_generation_time: u16,
    /// `[elevation segment][azimuth segment]` → range zones.
    pub range_zones: Vec<Vec<Vec<RangeZone>>>,
}

impl ClutterFilterMap {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        trace!("Parsing Clutter Filter Map (Message Type 15)");

        let map_generation_date = reader.read_u16()?;
        let map_generation_time = reader.read_u16()?;
        let num_elevation_segments = reader.read_u16()?;

        check_range("map generation date", map_generation_date, 1..=i64::from(u16::MAX))?;
        check_range("map generation time", map_generation_time, 0..=1440)?;
        check_range("number of elevation segments", num_elevation_segments, 1..=5)?;

        let mut range_zones = Vec::with_capacity(num_elevation_segments as usize);

        for _ in 0..num_elevation_segments {
            let mut azimuths = Vec::with_capacity(NUM_AZIMUTH_SEGMENTS);

            for _ in 0..NUM_AZIMUTH_SEGMENTS {
                let num_range_zones = reader.read_u16()?;
                check_range("number of range zones", num_range_zones, 1..=20)?;

                let mut zones = Vec::with_capacity(num_range_zones as usize);
                for _ in 0..num_range_zones {
                    let zone = RangeZone {
                        op_code: reader.read_u16()?,
                        end_range: reader.read_u16()?,
                    };
                    check_range("op code", zone.op_code, 0..=2)?;
                    check_range("end range", zone.end_range, 0..=511)?;
                    zones.push(zone);
                }
                azimuths.push(zones);
            }
            range_zones.push(azimuths);
        }

        validate_message(reader.position(), reader.len())?;

        Ok(Self {
            map_generation_date,
            map_generation_time,
            range_zones,
        })
    }

    pub fn number_of_elevation_segments(&self) -> usize {
        self.range_zones.len()
    }

    /// Range zones for one elevation and azimuth segment, if present.
    pub fn zones(&self, elevation_segment: usize, azimuth_segment: usize) -> Option<&[RangeZone]> {
        self.range_zones
            .get(elevation_segment)
            .and_then(|e| e.get(azimuth_segment))
            .map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeError;

    fn map_bytes(segments: u16, zones_per_azimuth: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&19000u16.to_be_bytes());
        out.extend_from_slice(&720u16.to_be_bytes());
        out.extend_from_slice(&segments.to_be_bytes());
        for _ in 0..segments.min(5) {
            for _ in 0..NUM_AZIMUTH_SEGMENTS {
                out.extend_from_slice(&zones_per_azimuth.to_be_bytes());
                for z in 0..zones_per_azimuth {
                    out.extend_from_slice(&(z % 3).to_be_bytes());
                    out.extend_from_slice(&(511 - z).to_be_bytes());
                }
            }
        }
        out
    }

    #[test]
    fn test_parse_two_segments() {
        let bytes = map_bytes(2, 2);
        let map = ClutterFilterMap::parse(&mut FieldReader::new(&bytes)).unwrap();
        assert_eq!(map.number_of_elevation_segments(), 2);
        let zones = map.zones(1, 359).unwrap();
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[1], RangeZone { op_code: 1, end_range: 510 });
    }

    #[test]
    fn test_six_elevation_segments_invalid() {
        let bytes = map_bytes(6, 1);
        let err = ClutterFilterMap::parse(&mut FieldReader::new(&bytes)).unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidField {
                field: "number of elevation segments",
                value: 6
            }
        );
    }

    #[test]
    fn test_too_many_range_zones_invalid() {
        let bytes = map_bytes(1, 21);
        assert!(ClutterFilterMap::parse(&mut FieldReader::new(&bytes)).is_err());
    }
}
