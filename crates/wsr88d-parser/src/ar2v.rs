//! Archive II (AR2V) volume files.
//!
//! A volume starts with a 24-byte volume header record followed by LDM
//! records. Each record is a signed big-endian control word giving the
//! compressed length, then that many bytes of bzip2 data. Decompressed
//! records carry a 12-byte communications prefix and a run of Level II
//! messages separated by zero padding.

use std::collections::{BTreeMap, HashMap};
use std::io::Read;
use std::sync::Arc;

use bzip2::read::BzDecoder;
use chrono::{DateTime, Utc};
use nexrad_common::julian_to_datetime;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::codec::FieldReader;
use crate::error::{DecodeError, DecodeResult};
use crate::level2::{
    ClutterFilterBypassMap, ClutterFilterMap, DataBlockType, DigitalRadarData, Level2Message,
    Level2MessageData, Level2MessageFactory, RdaStatusData, VolumeCoveragePatternData, WaveformType,
};

/// Bytes inserted by the communications manager at the start of each record.
const CTM_HEADER_SIZE: usize = 12;

/// Coded elevation units per degree.
const ELEVATION_SCALE: f32 = 8.0 / 0.043945;

/// Radials of one elevation cut keyed by zero-based azimuth index.
pub type ElevationScan = BTreeMap<u16, Arc<DigitalRadarData>>;

/// Volume Header Record at the start of every Archive II file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeHeader {
    /// "AR2V00xx" plus a trailing '.'.
    pub tape_filename: String,
    pub extension_number: String,
    pub julian_date: u32,
    pub milliseconds: u32,
    pub icao: String,
}

impl VolumeHeader {
    pub const SIZE: usize = 24;

    pub fn parse(reader: &mut FieldReader<'_>) -> DecodeResult<Self> {
        let header = Self {
            tape_filename: reader.read_string(9)?,
            extension_number: reader.read_string(3)?,
            julian_date: reader.read_u32()?,
            milliseconds: reader.read_u32()?,
            icao: reader.read_string(4)?,
        };

        debug!(
            filename = %header.tape_filename,
            extension = %header.extension_number,
            date = header.julian_date,
            time = header.milliseconds,
            icao = %header.icao,
            "Read volume header"
        );

        Ok(header)
    }
}

/// Result of looking up the elevation scan nearest a requested angle.
#[derive(Debug, Clone)]
pub struct ElevationScanSelection {
    pub scan: Arc<ElevationScan>,
    /// Angle of the selected cut in degrees.
    pub elevation_cut: f32,
    /// Every indexed cut for the moment, ascending, in degrees.
    pub elevation_cuts: Vec<f32>,
}

/// A decoded Archive II volume.
#[derive(Debug, Clone, Default)]
pub struct Ar2vFile {
    header: Option<VolumeHeader>,
    vcp: Option<Arc<VolumeCoveragePatternData>>,
    rda_status: Option<RdaStatusData>,
    clutter_filter_map: Option<ClutterFilterMap>,
    clutter_filter_bypass_map: Option<ClutterFilterBypassMap>,
    radar_data: BTreeMap<u16, Arc<ElevationScan>>,
    index: HashMap<DataBlockType, BTreeMap<u16, Arc<ElevationScan>>>,
    record_count: usize,
    skipped_records: usize,
}

impl Ar2vFile {
    /// Decode a volume from its uncompressed file bytes.
    ///
    /// Only a truncated volume header is fatal. Corrupt records and invalid
    /// messages are logged and skipped.
    pub fn load(data: &[u8]) -> DecodeResult<Self> {
        debug!(size = data.len(), "Loading Archive II volume");

        let mut reader = FieldReader::new(data);
        let header = VolumeHeader::parse(&mut reader).map_err(|e| {
            warn!("Could not read Volume Header Record");
            e
        })?;

        let mut file = Self {
            header: Some(header),
            ..Self::default()
        };

        let records = split_ldm_records(&mut reader);
        file.record_count = records.len();

        let decoded: Vec<Option<Vec<Level2Message>>> = if records.is_empty() {
            // Uncompressed volume: the rest of the file is a single record
            vec![Some(parse_ldm_record(reader.rest()))]
        } else {
            records
                .par_iter()
                .enumerate()
                .map(|(i, record)| match decompress_record(record) {
                    Ok(bytes) => Some(parse_ldm_record(&bytes)),
                    Err(e) => {
                        warn!(record = i, error = %e, "Error decompressing record");
                        None
                    }
                })
                .collect()
        };

        let mut radar_data: BTreeMap<u16, ElevationScan> = BTreeMap::new();
        for messages in decoded {
            let Some(messages) = messages else {
                file.skipped_records += 1;
                continue;
            };
            for message in messages {
                file.handle_message(message, &mut radar_data);
            }
        }

        file.radar_data = radar_data
            .into_iter()
            .map(|(elevation, scan)| (elevation, Arc::new(scan)))
            .collect();
        file.index_file();

        debug!(
            records = file.record_count,
            skipped = file.skipped_records,
            elevations = file.radar_data.len(),
            "Loaded Archive II volume"
        );

        Ok(file)
    }

    fn handle_message(&mut self, message: Level2Message, radar_data: &mut BTreeMap<u16, ElevationScan>) {
        match message.data {
            Level2MessageData::VolumeCoveragePattern(vcp) => self.vcp = Some(vcp),
            Level2MessageData::DigitalRadarData(radial) => {
                let elevation = u16::from(radial.elevation_number) - 1;
                let azimuth = radial.azimuth_number - 1;
                radar_data.entry(elevation).or_default().insert(azimuth, radial);
            }
            Level2MessageData::RdaStatus(status) => self.rda_status = Some(status),
            Level2MessageData::ClutterFilterMap(map) => self.clutter_filter_map = Some(map),
            Level2MessageData::ClutterFilterBypassMap(map) => {
                self.clutter_filter_bypass_map = Some(map)
            }
            Level2MessageData::Opaque { .. } => {}
        }
    }

    fn index_file(&mut self) {
        debug!("Indexing file");

        for (&elevation, scan) in &self.radar_data {
            let Some(radial0) = scan.values().next() else {
                warn!(elevation, "Empty radial data");
                continue;
            };

            let (elevation_angle, waveform) = match &self.vcp {
                Some(vcp) => (
                    vcp.elevation_angle_raw(elevation as usize)
                        .unwrap_or_else(|| radial0.elevation_angle_raw()),
                    vcp.waveform_type(elevation as usize),
                ),
                None => (radial0.elevation_angle_raw(), WaveformType::Unknown),
            };

            for moment in DataBlockType::MOMENTS {
                // Surveillance cuts give the better reflectivity picture
                if moment == DataBlockType::MomentRef
                    && waveform == WaveformType::ContiguousDopplerWithAmbiguityResolution
                {
                    continue;
                }

                if radial0.moment(moment).is_some() {
                    self.index
                        .entry(moment)
                        .or_default()
                        .insert(elevation_angle, Arc::clone(scan));
                }
            }
        }
    }

    pub fn header(&self) -> Option<&VolumeHeader> {
        self.header.as_ref()
    }

    pub fn icao(&self) -> Option<&str> {
        self.header.as_ref().map(|h| h.icao.as_str())
    }

    /// Time stamped in the volume header, if it has a representable date.
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.header
            .as_ref()
            .and_then(|h| julian_to_datetime(h.julian_date, h.milliseconds))
    }

    /// Time of the radial with the greatest azimuth index within the
    /// greatest elevation index.
    ///
    /// This is the last radial in elevation-major order, not necessarily
    /// the chronologically latest one.
    pub fn end_time(&self) -> Option<DateTime<Utc>> {
        self.radar_data
            .values()
            .next_back()
            .and_then(|scan| scan.values().next_back())
            .and_then(|radial| radial.time())
    }

    pub fn vcp_data(&self) -> Option<&Arc<VolumeCoveragePatternData>> {
        self.vcp.as_ref()
    }

    pub fn rda_status(&self) -> Option<&RdaStatusData> {
        self.rda_status.as_ref()
    }

    pub fn clutter_filter_map(&self) -> Option<&ClutterFilterMap> {
        self.clutter_filter_map.as_ref()
    }

    pub fn clutter_filter_bypass_map(&self) -> Option<&ClutterFilterBypassMap> {
        self.clutter_filter_bypass_map.as_ref()
    }

    /// Elevation scans keyed by zero-based elevation index.
    pub fn radar_data(&self) -> &BTreeMap<u16, Arc<ElevationScan>> {
        &self.radar_data
    }

    /// Number of LDM records found, including ones that failed to decompress.
    pub fn record_count(&self) -> usize {
        self.record_count
    }

    pub fn skipped_records(&self) -> usize {
        self.skipped_records
    }

    /// Find the scan for `moment` whose cut is nearest `elevation` degrees.
    pub fn elevation_scan(&self, moment: DataBlockType, elevation: f32) -> Option<ElevationScanSelection> {
        debug!(elevation, "Getting elevation scan");

        let scans = self.index.get(&moment)?;
        let coded = (elevation * ELEVATION_SCALE).round() as u16;

        let (&first, _) = scans.iter().next()?;
        let (&last, _) = scans.iter().next_back()?;

        let lower = scans.range(..=coded).next_back().map(|(&k, _)| k).unwrap_or(first);
        let upper = scans.range(coded..).next().map(|(&k, _)| k).unwrap_or(last);

        let lower_delta = (i32::from(coded) - i32::from(lower)).abs();
        let upper_delta = (i32::from(coded) - i32::from(upper)).abs();
        let selected = if lower_delta < upper_delta { lower } else { upper };

        Some(ElevationScanSelection {
            scan: Arc::clone(scans.get(&selected)?),
            elevation_cut: f32::from(selected) / ELEVATION_SCALE,
            elevation_cuts: scans.keys().map(|&k| f32::from(k) / ELEVATION_SCALE).collect(),
        })
    }
}

/// Split the remainder of a volume into compressed LDM records.
///
/// A zero control word ends the compressed section; the reader is left
/// positioned on it.
fn split_ldm_records<'a>(reader: &mut FieldReader<'a>) -> Vec<&'a [u8]> {
    let mut records = Vec::new();

    while reader.remaining() >= 4 {
        let start = reader.position();
        let Ok(control_word) = reader.read_i32() else {
            break;
        };
        let record_size = control_word.unsigned_abs() as usize;

        trace!(size = record_size, "LDM record found");

        if record_size == 0 {
            reader.seek_clamped(start);
            break;
        }

        let available = record_size.min(reader.remaining());
        if available < record_size {
            warn!(size = record_size, available, "Truncated LDM record");
        }
        match reader.read_bytes(available) {
            Ok(bytes) => records.push(bytes),
            Err(_) => break,
        }
    }

    debug!(count = records.len(), "Found LDM records");
    records
}

fn decompress_record(record: &[u8]) -> DecodeResult<Vec<u8>> {
    let mut out = Vec::new();
    BzDecoder::new(record)
        .read_to_end(&mut out)
        .map_err(|e| DecodeError::Decompression(e.to_string()))?;
    trace!(size = out.len(), "Decompressed record");
    Ok(out)
}

/// Extract every valid message from one decompressed LDM record.
///
/// Each record gets its own reassembly context. A bad header abandons the
/// rest of the record.
pub fn parse_ldm_record(record: &[u8]) -> Vec<Level2Message> {
    let mut reader = FieldReader::new(record);
    let mut factory = Level2MessageFactory::new();
    let mut messages = Vec::new();

    if reader.skip(CTM_HEADER_SIZE).is_err() {
        return messages;
    }

    loop {
        let padding_start = reader.position();
        while reader.peek_u16() == Some(0) {
            reader.seek_clamped(reader.position() + 2);
        }
        if reader.remaining() < 2 {
            break;
        }
        if reader.position() != padding_start {
            trace!(offset = reader.position() - padding_start, "Next message offset");
        }

        let info = factory.create(&mut reader);
        if !info.header_valid() {
            break;
        }
        if let Some(message) = info.message {
            messages.push(message);
        }
    }

    messages
}
