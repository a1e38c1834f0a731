use tracing::warn;

use super::{framed, packet_code};
use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};

/// A line segment in screen coordinates (1/4 km units).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vector {
    pub begin_i: i16,
    pub begin_j: i16,
    pub end_i: i16,
    pub end_j: i16,
}

/// Connected line segments (packet codes 6 and 9).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedVectorPacket {
    pub packet_code: u16,
    /// Color level, packet code 9 only.
    pub value_of_vector: Option<u16>,
    pub start_i: i16,
    pub start_j: i16,
    /// End points, each one starting the next segment.
    pub end_points: Vec<(i16, i16)>,
}

impl LinkedVectorPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        let value_of_vector = if packet_code == packet_code::LINKED_VECTOR_WITH_VALUE {
            Some(data.read_u16()?)
        } else {
            None
        };
        let start_i = data.read_i16()?;
        let start_j = data.read_i16()?;

        let count = data.remaining() / 4;
        let end_points = (0..count)
            .map(|_| -> DecodeResult<(i16, i16)> { Ok((data.read_i16()?, data.read_i16()?)) })
            .collect::<DecodeResult<Vec<_>>>()?;

        if !matches!(
            packet_code,
            packet_code::LINKED_VECTOR_NO_VALUE | packet_code::LINKED_VECTOR_WITH_VALUE
        ) {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        Ok(Self {
            packet_code,
            value_of_vector,
            start_i,
            start_j,
            end_points,
        })
    }

    /// The packet as individual segments.
    pub fn vectors(&self) -> Vec<Vector> {
        let mut begin = (self.start_i, self.start_j);
        self.end_points
            .iter()
            .map(|&end| {
                let vector = Vector {
                    begin_i: begin.0,
                    begin_j: begin.1,
                    end_i: end.0,
                    end_j: end.1,
                };
                begin = end;
                vector
            })
            .collect()
    }
}

/// Independent line segments (packet codes 7 and 10).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkedVectorPacket {
    pub packet_code: u16,
    /// Color level, packet code 10 only.
    pub value_of_vector: Option<u16>,
    pub vectors: Vec<Vector>,
}

impl UnlinkedVectorPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        let value_of_vector = if packet_code == packet_code::UNLINKED_VECTOR_WITH_VALUE {
            Some(data.read_u16()?)
        } else {
            None
        };

        let count = data.remaining() / 8;
        let vectors = (0..count)
            .map(|_| -> DecodeResult<Vector> {
                Ok(Vector {
                    begin_i: data.read_i16()?,
                    begin_j: data.read_i16()?,
                    end_i: data.read_i16()?,
                    end_j: data.read_i16()?,
                })
            })
            .collect::<DecodeResult<Vec<_>>>()?;

        if !matches!(
            packet_code,
            packet_code::UNLINKED_VECTOR_NO_VALUE | packet_code::UNLINKED_VECTOR_WITH_VALUE
        ) {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        Ok(Self {
            packet_code,
            value_of_vector,
            vectors,
        })
    }
}

/// Contour line segments preceded by a start point (packet code 0x0E03).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedContourVectorPacket {
    pub start_i: i16,
    pub start_j: i16,
    pub end_points: Vec<(i16, i16)>,
}

impl LinkedContourVectorPacket {
    const INITIAL_POINT_INDICATOR: u16 = 0x8000;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let packet_code = reader.read_u16()?;
        let initial_point_indicator = reader.read_u16()?;
        let start_i = reader.read_i16()?;
        let start_j = reader.read_i16()?;
        let length_of_vectors = reader.read_u16()?;
        let mut data = reader.sub_reader(length_of_vectors as usize)?;

        if packet_code != packet_code::LINKED_CONTOUR_VECTOR {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }
        if initial_point_indicator != Self::INITIAL_POINT_INDICATOR {
            warn!(initial_point_indicator, "Invalid initial point indicator");
            return Err(DecodeError::field("initial point indicator", initial_point_indicator));
        }

        let count = data.remaining() / 4;
        let end_points = (0..count)
            .map(|_| -> DecodeResult<(i16, i16)> { Ok((data.read_i16()?, data.read_i16()?)) })
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self {
            start_i,
            start_j,
            end_points,
        })
    }
}

/// Independent contour segments (packet code 0x3501).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnlinkedContourVectorPacket {
    pub vectors: Vec<Vector>,
}

impl UnlinkedContourVectorPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        if packet_code != packet_code::UNLINKED_CONTOUR_VECTOR {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        let count = data.remaining() / 8;
        let vectors = (0..count)
            .map(|_| -> DecodeResult<Vector> {
                Ok(Vector {
                    begin_i: data.read_i16()?,
                    begin_j: data.read_i16()?,
                    end_i: data.read_i16()?,
                    end_j: data.read_i16()?,
                })
            })
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self { vectors })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindBarb {
    /// Color level.
    pub value: i16,
    pub x_coordinate: i16,
    pub y_coordinate: i16,
    /// Degrees the wind blows from.
    pub direction_of_wind: i16,
    /// Knots.
    pub wind_speed: i16,
}

/// Wind barbs (packet code 4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindBarbDataPacket {
    pub barbs: Vec<WindBarb>,
}

impl WindBarbDataPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        if packet_code != packet_code::WIND_BARB {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        let count = data.remaining() / 10;
        let barbs = (0..count)
            .map(|_| -> DecodeResult<WindBarb> {
                Ok(WindBarb {
                    value: data.read_i16()?,
                    x_coordinate: data.read_i16()?,
                    y_coordinate: data.read_i16()?,
                    direction_of_wind: data.read_i16()?,
                    wind_speed: data.read_i16()?,
                })
            })
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self { barbs })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VectorArrow {
    pub i_coordinate: i16,
    pub j_coordinate: i16,
    pub direction_of_arrow: i16,
    pub arrow_length: i16,
    pub arrow_head_length: i16,
}

/// Vector arrows (packet code 5).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VectorArrowDataPacket {
    pub arrows: Vec<VectorArrow>,
}

impl VectorArrowDataPacket {
    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let (packet_code, mut data) = framed(reader)?;

        if packet_code != packet_code::VECTOR_ARROW {
            warn!(packet_code, "Invalid packet code");
            return Err(DecodeError::field("packet code", packet_code));
        }

        let count = data.remaining() / 10;
        let arrows = (0..count)
            .map(|_| -> DecodeResult<VectorArrow> {
                Ok(VectorArrow {
                    i_coordinate: data.read_i16()?,
                    j_coordinate: data.read_i16()?,
                    direction_of_arrow: data.read_i16()?,
                    arrow_length: data.read_i16()?,
                    arrow_head_length: data.read_i16()?,
                })
            })
            .collect::<DecodeResult<Vec<_>>>()?;

        Ok(Self { arrows })
    }
}
