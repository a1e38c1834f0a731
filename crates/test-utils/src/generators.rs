//! Synthetic NEXRAD data generators.
//!
//! Builders for byte-exact Level II messages, LDM records, Archive II
//! volumes and Level III products. All fields are big-endian, matching the
//! on-disk formats.

use std::io::Write;

use bzip2::write::BzEncoder;
use flate2::write::ZlibEncoder;

use crate::fixtures::JULIAN_2023_04_01;

/// Size of the Level II message header.
pub const LEVEL2_HEADER_SIZE: usize = 16;

/// Bytes the communications manager puts before the messages of a record.
pub const CTM_HEADER_SIZE: usize = 12;

/// Gate values used by every generated moment block.
///
/// With scale 2 and offset 66 they decode to: below threshold, range
/// folded, 5.0 and 10.0.
pub const MOMENT_GATES: [u8; 4] = [0, 1, 76, 86];

/// Coded angle units per degree (65536 / 360).
pub const ANGLE_SCALE: f32 = 65536.0 / 360.0;

/// Level II message header.
pub fn level2_header(
    message_type: u8,
    size_halfwords: u16,
    number_of_segments: u16,
    segment_number: u16,
    milliseconds: u32,
) -> Vec<u8> {
    let mut out = Vec::with_capacity(LEVEL2_HEADER_SIZE);
    out.extend_from_slice(&size_halfwords.to_be_bytes());
    out.push(0); // Redundant channel
    out.push(message_type);
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&JULIAN_2023_04_01.to_be_bytes());
    out.extend_from_slice(&milliseconds.to_be_bytes());
    out.extend_from_slice(&number_of_segments.to_be_bytes());
    out.extend_from_slice(&segment_number.to_be_bytes());
    out
}

/// Single-segment Level II message. Odd payloads get a pad byte.
pub fn level2_message(message_type: u8, payload: &[u8]) -> Vec<u8> {
    let padded = payload.len() + payload.len() % 2;
    let size = ((padded + LEVEL2_HEADER_SIZE) / 2) as u16;
    let mut out = level2_header(message_type, size, 1, 1, 0);
    out.extend_from_slice(payload);
    out.resize(LEVEL2_HEADER_SIZE + padded, 0);
    out
}

/// Split `payload` into segments of at most `chunk` bytes, each with its
/// own header. `chunk` is rounded down to a whole number of halfwords.
pub fn level2_segments(message_type: u8, payload: &[u8], chunk: usize) -> Vec<Vec<u8>> {
    let chunk = (chunk & !1).max(2);
    let mut padded = payload.to_vec();
    padded.resize(payload.len() + payload.len() % 2, 0);

    let total = padded.len().div_ceil(chunk) as u16;
    padded
        .chunks(chunk)
        .enumerate()
        .map(|(i, part)| {
            let size = ((part.len() + LEVEL2_HEADER_SIZE) / 2) as u16;
            let mut out = level2_header(message_type, size, total, i as u16 + 1, 0);
            out.extend_from_slice(part);
            out
        })
        .collect()
}

/// RDA status payload (message type 2) reporting `vcp_number`.
pub fn rda_status_payload(vcp_number: u16) -> Vec<u8> {
    let mut out = vec![0u8; 120];
    out[0..2].copy_from_slice(&2u16.to_be_bytes()); // Operate
    out[14..16].copy_from_slice(&vcp_number.to_be_bytes());
    out
}

/// Volume coverage pattern payload (message type 5).
///
/// Each cut is a coded elevation angle and a waveform code.
pub fn vcp_payload(pattern_number: u16, cuts: &[(u16, u8)]) -> Vec<u8> {
    const HEADER_SIZE: usize = 22;
    const CUT_SIZE: usize = 46;

    let mut out = Vec::with_capacity(HEADER_SIZE + CUT_SIZE * cuts.len());
    let size = ((HEADER_SIZE + CUT_SIZE * cuts.len()) / 2) as u16;
    out.extend_from_slice(&size.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes());
    out.extend_from_slice(&pattern_number.to_be_bytes());
    out.extend_from_slice(&(cuts.len() as u16).to_be_bytes());
    out.extend_from_slice(&[1, 0, 2, 2]);
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&[0; 2]);
    for &(angle, waveform) in cuts {
        let mut cut = vec![0u8; CUT_SIZE];
        cut[0..2].copy_from_slice(&angle.to_be_bytes());
        cut[3] = waveform;
        out.extend_from_slice(&cut);
    }
    out
}

/// Clutter filter map payload (message type 15) with the same zones at
/// every azimuth segment.
pub fn clutter_filter_map_payload(elevation_segments: u16, zones_per_azimuth: u16) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&JULIAN_2023_04_01.to_be_bytes());
    out.extend_from_slice(&720u16.to_be_bytes());
    out.extend_from_slice(&elevation_segments.to_be_bytes());
    for _ in 0..elevation_segments {
        for _ in 0..360 {
            out.extend_from_slice(&zones_per_azimuth.to_be_bytes());
            for zone in 0..zones_per_azimuth {
                out.extend_from_slice(&(zone % 3).to_be_bytes());
                out.extend_from_slice(&(511 - zone).to_be_bytes());
            }
        }
    }
    out
}

/// One radial of base data to generate.
#[derive(Debug, Clone)]
pub struct RadialSpec {
    pub icao: &'static str,
    /// One-based elevation number.
    pub elevation_number: u8,
    /// One-based azimuth number.
    pub azimuth_number: u16,
    pub azimuth_angle: f32,
    pub elevation_angle: f32,
    pub milliseconds: u32,
    /// Moment block names, e.g. `*b"REF"`.
    pub moments: Vec<[u8; 3]>,
}

impl Default for RadialSpec {
    fn default() -> Self {
        Self {
            icao: crate::fixtures::KLSX,
            elevation_number: 1,
            azimuth_number: 1,
            azimuth_angle: 0.5,
            elevation_angle: 0.5,
            milliseconds: 0,
            moments: vec![*b"REF"],
        }
    }
}

fn moment_block(name: &[u8; 3]) -> Vec<u8> {
    let mut out = vec![b'D'];
    out.extend_from_slice(name);
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&(MOMENT_GATES.len() as u16).to_be_bytes());
    out.extend_from_slice(&2125u16.to_be_bytes());
    out.extend_from_slice(&250u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&16i16.to_be_bytes());
    out.push(0);
    out.push(8);
    out.extend_from_slice(&2.0f32.to_be_bytes());
    out.extend_from_slice(&66.0f32.to_be_bytes());
    out.extend_from_slice(&MOMENT_GATES);
    out
}

/// Digital radar data payload (message type 31).
pub fn radial_payload(spec: &RadialSpec) -> Vec<u8> {
    let mut header = Vec::new();
    header.extend_from_slice(spec.icao.as_bytes());
    header.extend_from_slice(&spec.milliseconds.to_be_bytes());
    header.extend_from_slice(&JULIAN_2023_04_01.to_be_bytes());
    header.extend_from_slice(&spec.azimuth_number.to_be_bytes());
    header.extend_from_slice(&spec.azimuth_angle.to_be_bytes());
    header.push(0); // Compression indicator
    header.push(0);
    header.extend_from_slice(&0u16.to_be_bytes());
    header.extend_from_slice(&[1, 0, spec.elevation_number, 1]);
    header.extend_from_slice(&spec.elevation_angle.to_be_bytes());
    header.extend_from_slice(&[0, 0]);

    let mut blocks: Vec<Vec<u8>> = Vec::new();
    let mut volume = b"RVOL".to_vec();
    volume.extend_from_slice(&[0; 40]);
    blocks.push(volume);
    let mut elevation = b"RELV".to_vec();
    elevation.extend_from_slice(&[0; 8]);
    blocks.push(elevation);
    let mut radial = b"RRAD".to_vec();
    radial.extend_from_slice(&[0; 24]);
    blocks.push(radial);
    blocks.extend(spec.moments.iter().map(moment_block));

    header.extend_from_slice(&(blocks.len() as u16).to_be_bytes());

    let mut offset = header.len() + 4 * blocks.len();
    let mut out = header;
    let mut body = Vec::new();
    for block in &blocks {
        out.extend_from_slice(&(offset as u32).to_be_bytes());
        offset += block.len();
        body.extend_from_slice(block);
    }
    out.extend_from_slice(&body);
    out
}

/// Digital radar data message for `spec`.
pub fn radial_message(spec: &RadialSpec) -> Vec<u8> {
    level2_message(31, &radial_payload(spec))
}

/// Uncompressed LDM record: the communications prefix then the messages,
/// each followed by `padding` zero bytes.
pub fn ldm_record(messages: &[Vec<u8>], padding: usize) -> Vec<u8> {
    let mut out = vec![0u8; CTM_HEADER_SIZE];
    for message in messages {
        out.extend_from_slice(message);
        out.resize(out.len() + padding, 0);
    }
    out
}

/// bzip2-compress a record and prefix it with its control word.
pub fn compress_record(record: &[u8]) -> Vec<u8> {
    let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::fast());
    encoder.write_all(record).expect("bzip2 write");
    let compressed = encoder.finish().expect("bzip2 finish");
    frame_record(&compressed)
}

/// Prefix raw bytes with a control word giving their length.
pub fn frame_record(bytes: &[u8]) -> Vec<u8> {
    let mut out = (bytes.len() as i32).to_be_bytes().to_vec();
    out.extend_from_slice(bytes);
    out
}

/// Archive II volume: the volume header record followed by framed records.
pub fn ar2v_volume(icao: &str, julian_date: u32, milliseconds: u32, records: &[Vec<u8>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(b"AR2V0006.");
    out.extend_from_slice(b"001");
    out.extend_from_slice(&julian_date.to_be_bytes());
    out.extend_from_slice(&milliseconds.to_be_bytes());
    out.extend_from_slice(icao.as_bytes());
    for record in records {
        out.extend_from_slice(record);
    }
    out
}

/// Run-length encoded radial data packet (code 0xAF1F). Every radial
/// carries the same `(run, level)` pairs.
pub fn rle_radial_packet(number_of_radials: u16, runs: &[(u8, u8)]) -> Vec<u8> {
    let mut rle: Vec<u8> = runs.iter().map(|&(run, level)| (run << 4) | (level & 0x0f)).collect();
    let bins: u16 = runs.iter().map(|&(run, _)| u16::from(run)).sum();
    if rle.len() % 2 == 1 {
        rle.push(0);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&0xAF1Fu16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&bins.max(1).to_be_bytes());
    out.extend_from_slice(&256i16.to_be_bytes());
    out.extend_from_slice(&280i16.to_be_bytes());
    out.extend_from_slice(&999u16.to_be_bytes());
    out.extend_from_slice(&number_of_radials.to_be_bytes());
    for r in 0..number_of_radials {
        out.extend_from_slice(&((rle.len() / 2) as u16).to_be_bytes());
        out.extend_from_slice(&(r * 10).to_be_bytes());
        out.extend_from_slice(&10u16.to_be_bytes());
        out.extend_from_slice(&rle);
    }
    out
}

/// Digital radial data array packet (code 16). Every radial carries `levels`.
pub fn digital_radial_packet(number_of_radials: u16, levels: &[u8]) -> Vec<u8> {
    let mut data = levels.to_vec();
    if data.len() % 2 == 1 {
        data.push(0);
    }

    let mut out = Vec::new();
    out.extend_from_slice(&16u16.to_be_bytes());
    out.extend_from_slice(&0i16.to_be_bytes());
    out.extend_from_slice(&(levels.len() as i16).to_be_bytes());
    out.extend_from_slice(&0i16.to_be_bytes());
    out.extend_from_slice(&0i16.to_be_bytes());
    out.extend_from_slice(&1000u16.to_be_bytes());
    out.extend_from_slice(&number_of_radials.to_be_bytes());
    for r in 0..number_of_radials {
        out.extend_from_slice(&(data.len() as u16).to_be_bytes());
        out.extend_from_slice(&(r * 5).to_be_bytes());
        out.extend_from_slice(&5u16.to_be_bytes());
        out.extend_from_slice(&data);
    }
    out
}

/// Product symbology block holding one layer of `packets`.
pub fn symbology_block(packets: &[Vec<u8>]) -> Vec<u8> {
    let layer: Vec<u8> = packets.concat();
    let length = 10 + 6 + layer.len();

    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&(-1i16).to_be_bytes());
    out.extend_from_slice(&1i16.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&1u16.to_be_bytes());
    out.extend_from_slice(&(-1i16).to_be_bytes());
    out.extend_from_slice(&(layer.len() as u32).to_be_bytes());
    out.extend_from_slice(&layer);
    out
}

/// Level III graphic product: message header, description block and a
/// symbology block of `packets`. With `compress` set the symbology is
/// bzip2-compressed and flagged in the description block; `product_code`
/// must then be one of the compressible products (e.g. 94).
pub fn level3_product(product_code: i16, packets: &[Vec<u8>], compress: bool) -> Vec<u8> {
    let symbology = symbology_block(packets);
    let body = if compress {
        let mut encoder = BzEncoder::new(Vec::new(), bzip2::Compression::fast());
        encoder.write_all(&symbology).expect("bzip2 write");
        encoder.finish().expect("bzip2 finish")
    } else {
        symbology
    };

    let mut description = vec![0u8; 102];
    description[0..2].copy_from_slice(&(-1i16).to_be_bytes());
    description[2..6].copy_from_slice(&38_699i32.to_be_bytes());
    description[6..10].copy_from_slice(&(-90_683i32).to_be_bytes());
    description[10..12].copy_from_slice(&608i16.to_be_bytes());
    description[12..14].copy_from_slice(&product_code.to_be_bytes());
    description[14..16].copy_from_slice(&2u16.to_be_bytes());
    description[16..18].copy_from_slice(&212u16.to_be_bytes());
    description[22..24].copy_from_slice(&JULIAN_2023_04_01.to_be_bytes());
    description[24..28].copy_from_slice(&86_399u32.to_be_bytes());
    description[28..30].copy_from_slice(&JULIAN_2023_04_01.to_be_bytes());
    description[30..34].copy_from_slice(&86_399u32.to_be_bytes());
    description[38..40].copy_from_slice(&1u16.to_be_bytes());
    if compress {
        description[82..84].copy_from_slice(&1u16.to_be_bytes());
    }
    // Symbology starts right after the description block
    description[90..94].copy_from_slice(&60u32.to_be_bytes());

    let length = 18 + description.len() + body.len();
    let mut out = Vec::with_capacity(length);
    out.extend_from_slice(&product_code.to_be_bytes());
    out.extend_from_slice(&JULIAN_2023_04_01.to_be_bytes());
    out.extend_from_slice(&86_399u32.to_be_bytes());
    out.extend_from_slice(&(length as u32).to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&3u16.to_be_bytes());
    out.extend_from_slice(&description);
    out.extend_from_slice(&body);
    out
}

/// WMO abbreviated heading and AWIPS identifier lines.
pub fn wmo_heading(icao: &str, awips: &str) -> Vec<u8> {
    format!("SDUS53 {} 012359\r\r\n{}\r\r\n", icao, awips).into_bytes()
}

/// Level III product as stored uncompressed: heading then product.
pub fn level3_file(icao: &str, awips: &str, product: &[u8]) -> Vec<u8> {
    let mut out = wmo_heading(icao, awips);
    out.extend_from_slice(product);
    out
}

/// Level III product in transmission form: the outer heading, then a zlib
/// stream holding the CCB, the inner heading and the product.
pub fn level3_transmission(icao: &str, awips: &str, product: &[u8]) -> Vec<u8> {
    let mut inner = Vec::new();
    inner.extend_from_slice(&(0x4000u16 | 12).to_be_bytes());
    inner.extend_from_slice(&[2, 0, b'4', b'U']);
    inner.extend_from_slice(icao.as_bytes());
    inner.extend_from_slice(&[3, 1]);
    inner.extend_from_slice(&0u16.to_be_bytes());
    inner.extend_from_slice(&[23, 4, 1, 23, 59, 0]);
    inner.extend_from_slice(&wmo_heading(icao, awips));
    inner.extend_from_slice(product);

    let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(&inner).expect("zlib write");

    let mut out = wmo_heading(icao, awips);
    out.extend_from_slice(&encoder.finish().expect("zlib finish"));
    out
}
