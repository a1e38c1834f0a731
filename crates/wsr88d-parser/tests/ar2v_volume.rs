//! Archive II volume loading: record framing, corrupt record recovery,
//! elevation indexing and volume times.

mod common;

use test_utils::{
    ar2v_volume, assert_approx_eq, clutter_filter_map_payload, compress_record, frame_record,
    ldm_record, level2_message, radial_message, require_test_file, utc, vcp_payload, RadialSpec,
    KLSX,
};
use wsr88d_parser::level2::message_type;
use wsr88d_parser::{load_file, Ar2vFile, DataBlockType};

fn radial(elevation_number: u8, azimuth_number: u16, milliseconds: u32, moments: &[&[u8; 3]]) -> Vec<u8> {
    radial_message(&RadialSpec {
        elevation_number,
        azimuth_number,
        azimuth_angle: f32::from(azimuth_number) - 0.5,
        milliseconds,
        moments: moments.iter().map(|m| **m).collect(),
        ..RadialSpec::default()
    })
}

/// Three cuts: 0.5 degree surveillance, 0.5 degree Doppler (CDW) and
/// 1.5 degree batch.
fn sample_volume() -> Vec<u8> {
    let vcp = level2_message(
        message_type::VOLUME_COVERAGE_PATTERN,
        &vcp_payload(212, &[(91, 1), (91, 2), (273, 4)]),
    );

    let first = ldm_record(
        &[
            vcp,
            radial(1, 1, 10_000, &[b"REF"]),
            radial(1, 2, 11_000, &[b"REF"]),
            radial(1, 3, 50_000, &[b"REF"]),
        ],
        0,
    );
    let second = ldm_record(
        &[
            radial(2, 1, 20_000, &[b"REF", b"VEL"]),
            radial(2, 2, 21_000, &[b"REF", b"VEL"]),
        ],
        4,
    );
    // Elevation 3 was stamped before the end of elevation 1
    let third = ldm_record(
        &[
            radial(3, 1, 500, &[b"REF"]),
            radial(3, 2, 1_000, &[b"REF"]),
        ],
        0,
    );

    ar2v_volume(
        KLSX,
        19449,
        0,
        &[compress_record(&first), compress_record(&second), compress_record(&third)],
    )
}

// ============================================================================
// Loading
// ============================================================================

#[test]
fn test_load_volume() {
    let file = Ar2vFile::load(&sample_volume()).unwrap();

    assert_eq!(file.icao(), Some(KLSX));
    assert_eq!(file.record_count(), 3);
    assert_eq!(file.skipped_records(), 0);
    assert_eq!(file.start_time(), Some(utc(2023, 4, 1, 0, 0, 0)));
    assert_eq!(file.vcp_data().map(|v| v.pattern_number), Some(212));

    let elevations: Vec<u16> = file.radar_data().keys().copied().collect();
    assert_eq!(elevations, vec![0, 1, 2]);
    assert_eq!(file.radar_data()[&0].len(), 3);
    assert_eq!(file.radar_data()[&1].len(), 2);
    assert!(file.radar_data()[&0].contains_key(&2));
}

#[test]
fn test_corrupt_record_skipped() {
    let good = ldm_record(&[radial(1, 1, 0, &[b"REF"])], 0);
    let later = ldm_record(&[radial(1, 2, 0, &[b"REF"])], 0);
    let volume = ar2v_volume(
        KLSX,
        19449,
        0,
        &[
            compress_record(&good),
            frame_record(b"BZh9 definitely not a bzip2 stream"),
            compress_record(&later),
        ],
    );

    let file = Ar2vFile::load(&volume).unwrap();
    assert_eq!(file.record_count(), 3);
    assert_eq!(file.skipped_records(), 1);
    assert_eq!(file.radar_data()[&0].len(), 2);
}

#[test]
fn test_bad_header_abandons_rest_of_record_only() {
    let mut broken = ldm_record(&[radial(1, 1, 0, &[b"REF"])], 0);
    // Declared size 3 halfwords is below the header size
    broken.extend_from_slice(&[0, 3, 0, 31]);
    broken.extend_from_slice(&[0; 12]);
    broken.extend_from_slice(&radial(1, 2, 0, &[b"REF"]));

    let other = ldm_record(&[radial(1, 3, 0, &[b"REF"])], 0);
    let volume = ar2v_volume(KLSX, 19449, 0, &[compress_record(&broken), compress_record(&other)]);

    let file = Ar2vFile::load(&volume).unwrap();
    let scan = &file.radar_data()[&0];
    assert!(scan.contains_key(&0));
    assert!(!scan.contains_key(&1));
    assert!(scan.contains_key(&2));
}

#[test]
fn test_last_radial_wins() {
    let mut replacement = RadialSpec {
        azimuth_number: 1,
        azimuth_angle: 123.0,
        ..RadialSpec::default()
    };
    let first = ldm_record(&[radial(1, 1, 0, &[b"REF"])], 0);
    replacement.milliseconds = 5_000;
    let second = ldm_record(&[radial_message(&replacement)], 0);

    let volume = ar2v_volume(KLSX, 19449, 0, &[compress_record(&first), compress_record(&second)]);
    let file = Ar2vFile::load(&volume).unwrap();

    let scan = &file.radar_data()[&0];
    assert_eq!(scan.len(), 1);
    assert_eq!(scan[&0].azimuth_angle, 123.0);
}

#[test]
fn test_uncompressed_volume() {
    let record = ldm_record(&[radial(1, 1, 0, &[b"REF"]), radial(1, 2, 0, &[b"REF"])], 2);
    let mut volume = ar2v_volume(KLSX, 19449, 0, &[]);
    volume.extend_from_slice(&record);

    let file = Ar2vFile::load(&volume).unwrap();
    assert_eq!(file.record_count(), 0);
    assert_eq!(file.radar_data()[&0].len(), 2);
}

#[test]
fn test_truncated_volume_header_is_fatal() {
    let volume = ar2v_volume(KLSX, 19449, 0, &[]);
    assert!(Ar2vFile::load(&volume[..20]).is_err());
}

#[test]
fn test_invalid_clutter_map_not_retained() {
    let record = ldm_record(
        &[
            level2_message(message_type::CLUTTER_FILTER_MAP, &clutter_filter_map_payload(6, 1)),
            radial(1, 1, 0, &[b"REF"]),
        ],
        0,
    );
    let volume = ar2v_volume(KLSX, 19449, 0, &[compress_record(&record)]);

    let file = Ar2vFile::load(&volume).unwrap();
    assert!(file.clutter_filter_map().is_none());
    assert_eq!(file.radar_data()[&0].len(), 1);
}

// ============================================================================
// Volume times
// ============================================================================

#[test]
fn test_end_time_is_last_radial_of_last_elevation() {
    let file = Ar2vFile::load(&sample_volume()).unwrap();

    // Elevation 1 holds a later radial (00:00:50), but the end time comes
    // from the last azimuth of the last elevation.
    assert_eq!(file.end_time(), Some(utc(2023, 4, 1, 0, 0, 1)));

    let latest = file
        .radar_data()
        .values()
        .flat_map(|scan| scan.values())
        .filter_map(|radial| radial.time())
        .max();
    assert_eq!(latest, Some(utc(2023, 4, 1, 0, 0, 50)));
}

#[test]
fn test_unrepresentable_volume_date() {
    let record = ldm_record(&[radial(1, 1, 1_000, &[b"REF"])], 0);
    let data = ar2v_volume(KLSX, u32::MAX, u32::MAX, &[compress_record(&record)]);

    let file = Ar2vFile::load(&data).unwrap();
    assert_eq!(file.icao(), Some(KLSX));
    assert_eq!(file.start_time(), None);
    assert_eq!(file.end_time(), Some(utc(2023, 4, 1, 0, 0, 1)));
}

// ============================================================================
// Elevation index
// ============================================================================

#[test]
fn test_reflectivity_skips_doppler_cut() {
    let file = Ar2vFile::load(&sample_volume()).unwrap();

    let selection = file.elevation_scan(DataBlockType::MomentRef, 0.5).unwrap();
    assert_eq!(selection.scan.len(), 3);
    assert_eq!(selection.elevation_cuts.len(), 2);
    assert_approx_eq!(selection.elevation_cut, 0.5, 0.01);
    assert_approx_eq!(selection.elevation_cuts[1], 1.5, 0.01);

    let velocity = file.elevation_scan(DataBlockType::MomentVel, 0.5).unwrap();
    assert_eq!(velocity.scan.len(), 2);
    assert_eq!(velocity.elevation_cuts.len(), 1);
}

#[test]
fn test_nearest_elevation_selected() {
    let file = Ar2vFile::load(&sample_volume()).unwrap();

    let cut = |angle: f32| {
        file.elevation_scan(DataBlockType::MomentRef, angle)
            .map(|s| s.elevation_cut)
            .unwrap()
    };

    assert_approx_eq!(cut(0.9), 0.5, 0.01);
    assert_approx_eq!(cut(1.2), 1.5, 0.01);
    assert_approx_eq!(cut(0.0), 0.5, 0.01);
    assert_approx_eq!(cut(19.5), 1.5, 0.01);
}

#[test]
fn test_missing_moment() {
    let file = Ar2vFile::load(&sample_volume()).unwrap();
    assert!(file.elevation_scan(DataBlockType::MomentCfp, 0.5).is_none());
}

#[test]
fn test_index_without_vcp_uses_radial_angle() {
    let spec = RadialSpec {
        elevation_angle: 2.4,
        ..RadialSpec::default()
    };
    let record = ldm_record(&[radial_message(&spec)], 0);
    let volume = ar2v_volume(KLSX, 19449, 0, &[compress_record(&record)]);

    let file = Ar2vFile::load(&volume).unwrap();
    assert!(file.vcp_data().is_none());
    let selection = file.elevation_scan(DataBlockType::MomentRef, 2.0).unwrap();
    assert_approx_eq!(selection.elevation_cut, 2.4, 0.01);
}

// ============================================================================
// Archived files
// ============================================================================

#[test]
fn test_archived_volume() {
    let path = require_test_file!("KLSX20230401_235959_V06");
    let data = std::fs::read(&path).unwrap();

    let file = load_file(&data).unwrap();
    let volume = file.as_level2().expect("Level II volume");
    assert_eq!(volume.icao(), Some(KLSX));
    assert!(volume.vcp_data().is_some());
    assert!(!volume.radar_data().is_empty());
    assert!(volume.elevation_scan(DataBlockType::MomentRef, 0.5).is_some());
}
