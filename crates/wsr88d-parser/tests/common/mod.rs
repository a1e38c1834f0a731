//! Common test utilities for wsr88d-parser tests

/// Decode a single Level II message from `bytes` with a fresh factory.
#[allow(dead_code)]
pub fn decode_one(bytes: &[u8]) -> wsr88d_parser::level2::MessageInfo {
    let mut reader = wsr88d_parser::FieldReader::new(bytes);
    wsr88d_parser::Level2MessageFactory::new().create(&mut reader)
}
