//! Level III product loading from transmission and storage forms.

mod common;

use test_utils::{
    assert_approx_eq, digital_radial_packet, level3_file, level3_product, level3_transmission,
    require_test_file, rle_radial_packet, utc, KLSX,
};
use wsr88d_parser::level3::packets::Packet;
use wsr88d_parser::level3::{create_message, GeneralStatusMessage, Level3File, Level3Message};
use wsr88d_parser::{load_file, FieldReader};

fn graphic(file: &Level3File) -> &wsr88d_parser::level3::GraphicProductMessage {
    match &file.message {
        Level3Message::GraphicProduct(message) => message,
        other => panic!("expected graphic product, got {:?}", other),
    }
}

// ============================================================================
// Graphic products
// ============================================================================

#[test]
fn test_radial_product() {
    let product = level3_product(94, &[rle_radial_packet(4, &[(3, 1), (2, 7)])], false);
    let file = Level3File::load(&level3_file(KLSX, "N0QLSX", &product)).unwrap();

    assert_eq!(file.icao(), KLSX);
    assert_eq!(file.wmo_header.product_category, "N0Q");
    assert!(file.ccb_header.is_none());

    let header = file.message_header();
    assert_eq!(header.message_code, 94);
    assert_eq!(header.length_of_message as usize, product.len());
    assert_eq!(header.time(), Some(utc(2023, 4, 1, 23, 59, 59)));

    let message = graphic(&file);
    let description = &message.description_block;
    assert_eq!(description.product_code, 94);
    assert_approx_eq!(description.latitude(), 38.699, 0.001);
    assert_approx_eq!(description.longitude(), -90.683, 0.001);
    assert!(!description.is_compression_enabled());
    assert!(message.graphic_block.is_none());
    assert!(message.tabular_block.is_none());

    let symbology = message.symbology_block.as_ref().expect("symbology block");
    let packets: Vec<&Packet> = symbology.packets().collect();
    assert_eq!(packets.len(), 1);
    match packets[0] {
        Packet::RadialData(radial) => {
            assert_eq!(radial.number_of_range_bins, 5);
            assert_eq!(radial.radials.len(), 4);
            assert_eq!(radial.radials[0].expand(), vec![1, 1, 1, 7, 7]);
            assert_approx_eq!(radial.radials[3].start_angle_degrees(), 3.0, 0.001);
        }
        other => panic!("unexpected packet {:?}", other),
    }
}

#[test]
fn test_compressed_symbology() {
    let packets = [digital_radial_packet(3, &[0, 10, 20, 30, 40])];
    let product = level3_product(94, &packets, true);
    let file = Level3File::load(&level3_file(KLSX, "N0QLSX", &product)).unwrap();

    let message = graphic(&file);
    assert!(message.description_block.is_compression_enabled());
    let symbology = message.symbology_block.as_ref().expect("symbology block");
    match symbology.packets().next() {
        Some(Packet::DigitalRadialDataArray(packet)) => {
            assert_eq!(packet.radials.len(), 3);
            assert_eq!(packet.radials[2].levels, vec![0, 10, 20, 30, 40]);
        }
        other => panic!("unexpected packet {:?}", other),
    };
}

#[test]
fn test_transmission_form() {
    let product = level3_product(94, &[rle_radial_packet(1, &[(15, 2)])], false);
    let file = Level3File::load(&level3_transmission(KLSX, "N0QLSX", &product)).unwrap();

    let ccb = file.ccb_header.as_ref().expect("CCB header");
    assert_eq!(ccb.message_originator, KLSX);
    assert_eq!(file.inner_header.as_ref().map(|h| h.icao.as_str()), Some(KLSX));
    assert!(graphic(&file).symbology_block.is_some());
}

#[test]
fn test_bad_symbology_keeps_message() {
    let mut product = level3_product(94, &[rle_radial_packet(2, &[(3, 1)])], false);
    // Corrupt the symbology block divider
    product[120] = 0x00;

    let file = Level3File::load(&level3_file(KLSX, "N0QLSX", &product)).unwrap();
    let message = graphic(&file);
    assert_eq!(message.description_block.product_code, 94);
    assert!(message.symbology_block.is_none());
}

#[test]
fn test_unknown_packet_keeps_symbology() {
    let mut unknown = 27u16.to_be_bytes().to_vec();
    unknown.extend_from_slice(&4u16.to_be_bytes());
    unknown.extend_from_slice(&[0xDE, 0xAD, 0xBE, 0xEF]);

    let mut storm_id = 15u16.to_be_bytes().to_vec();
    storm_id.extend_from_slice(&6u16.to_be_bytes());
    storm_id.extend_from_slice(&40i16.to_be_bytes());
    storm_id.extend_from_slice(&(-12i16).to_be_bytes());
    storm_id.extend_from_slice(b"B3");

    let product = level3_product(58, &[unknown, storm_id], false);
    let file = Level3File::load(&level3_file(KLSX, "NSTLSX", &product)).unwrap();

    let symbology = graphic(&file).symbology_block.as_ref().expect("symbology block");
    let packets: Vec<&Packet> = symbology.packets().collect();
    assert_eq!(packets.len(), 1);
    match packets[0] {
        Packet::StormId(packet) => assert_eq!(packet.symbols[0].storm_id, "B3"),
        other => panic!("unexpected packet {:?}", other),
    }
}

#[test]
fn test_truncated_product_is_clamped() {
    let product = level3_product(94, &[rle_radial_packet(2, &[(3, 1)])], false);
    let truncated = &product[..product.len() - 4];

    let file = Level3File::load(&level3_file(KLSX, "N0QLSX", truncated)).unwrap();
    assert!(graphic(&file).symbology_block.is_none());
}

// ============================================================================
// Message factory
// ============================================================================

#[test]
fn test_unknown_message_code_skipped() {
    let mut product = level3_product(94, &[rle_radial_packet(1, &[(1, 1)])], false);
    product[0..2].copy_from_slice(&5i16.to_be_bytes());
    let declared = product.len();
    product.extend_from_slice(b"next");

    let mut reader = FieldReader::new(&product);
    assert!(create_message(&mut reader).is_err());
    assert_eq!(reader.position(), declared);
}

#[test]
fn test_general_status_message() {
    let mut body = vec![0u8; GeneralStatusMessage::SIZE];
    body[0..2].copy_from_slice(&(-1i16).to_be_bytes());
    body[8..10].copy_from_slice(&35u16.to_be_bytes());

    let mut bytes = Vec::new();
    bytes.extend_from_slice(&2i16.to_be_bytes());
    bytes.extend_from_slice(&19449u16.to_be_bytes());
    bytes.extend_from_slice(&3600u32.to_be_bytes());
    bytes.extend_from_slice(&((18 + body.len()) as u32).to_be_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0, 0, 1]);
    bytes.extend_from_slice(&body);

    let mut reader = FieldReader::new(&bytes);
    let message = create_message(&mut reader).unwrap();
    assert!(reader.is_at_end());
    assert!(message.description_block().is_none());
    match message {
        Level3Message::GeneralStatus(status) => {
            assert_eq!(status.volume_coverage_pattern, 35);
            assert!(status.elevations.is_empty());
        }
        other => panic!("unexpected message {:?}", other),
    }
}

#[test]
fn test_radar_coded_message() {
    let mut product = level3_product(74, &[], false);
    product.truncate(18 + 102);
    product.extend_from_slice(b"KLSX ROBUS KLSX\nRCM TEXT");
    let length = product.len() as u32;
    product[8..12].copy_from_slice(&length.to_be_bytes());

    let file = Level3File::load(&level3_file(KLSX, "RCMLSX", &product)).unwrap();
    match &file.message {
        Level3Message::RadarCoded(message) => {
            assert_eq!(message.pup_site_identifier, "KLSX");
            assert_eq!(message.product_category, "ROBUS");
            assert_eq!(message.rda_site_identifier, "KLSX");
            assert_eq!(message.text, "\nRCM TEXT");
        }
        other => panic!("unexpected message {:?}", other),
    }
    assert_eq!(file.message.description_block().map(|d| d.product_code), Some(74));
}

// ============================================================================
// File factory
// ============================================================================

#[test]
fn test_load_file_detects_level3() {
    let product = level3_product(94, &[rle_radial_packet(1, &[(1, 1)])], false);
    let file = load_file(&level3_file(KLSX, "N0QLSX", &product)).unwrap();
    assert!(file.as_level2().is_none());
    assert_eq!(file.as_level3().map(|f| f.message_header().message_code), Some(94));
}

#[test]
fn test_archived_product() {
    let path = require_test_file!("LSX_N0Q_2023_04_01_23_59_59");
    let data = std::fs::read(&path).unwrap();

    let file = load_file(&data).unwrap();
    let product = file.as_level3().expect("Level III product");
    assert_eq!(product.message_header().message_code, 94);
    assert_eq!(product.message.description_block().map(|d| d.product_code), Some(94));
}
