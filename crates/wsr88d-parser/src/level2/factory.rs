//! Level II message factory with segmented-message reassembly.
//!
//! Single-segment messages are decoded straight from the input. Segmented
//! messages are accumulated into a reassembly buffer until the final
//! segment arrives, then decoded from the buffer as one payload.

use tracing::{debug, trace, warn};

use crate::codec::FieldReader;
use crate::level2::{decoder_for, DecodeFn, Level2Message, MessageHeader};

/// Minimum number of segments the buffer grows by when an estimate proves short.
const MIN_GROWTH_SEGMENTS: usize = 100;

/// Where the factory is in reassembling a segmented message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReassemblyState {
    AwaitingFirstSegment,
    Accumulating,
    Complete,
    Failed,
}

/// Growable buffer for one logical segmented message.
#[derive(Debug)]
struct ReassemblyBuffer {
    data: Vec<u8>,
    message_type: u8,
    /// Upper bound on the bytes the input can still supply.
    limit: usize,
}

impl ReassemblyBuffer {
    /// Size the buffer from the first segment. The estimate assumes every
    /// segment carries the same payload as the first, capped by `limit`.
    /// Returns `None` if the allocation fails.
    fn new(message_type: u8, payload_size: usize, total_segments: u16, limit: usize) -> Option<Self> {
        let estimate = payload_size.saturating_mul(total_segments as usize).min(limit);
        let mut data = Vec::new();
        data.try_reserve(estimate).ok()?;
        Some(Self {
            data,
            message_type,
            limit,
        })
    }

    fn append(&mut self, bytes: &[u8], segment: u16, total_segments: u16) -> bool {
        if self.data.capacity() - self.data.len() < bytes.len() {
            debug!("Bad size estimate, increasing size");
            let remaining_segments =
                (total_segments.saturating_sub(segment) as usize + 1).max(MIN_GROWTH_SEGMENTS);
            let growth = remaining_segments
                .saturating_mul(bytes.len())
                .min(self.limit.saturating_sub(self.data.len()))
                .max(bytes.len());
            if self.data.try_reserve(growth).is_err() {
                return false;
            }
        }
        self.data.extend_from_slice(bytes);
        true
    }

    fn len(&self) -> usize {
        self.data.len()
    }
}

/// Outcome of extracting one message from the input.
#[derive(Debug, Default)]
pub struct MessageInfo {
    /// Parsed header, or `None` if the header itself was invalid.
    pub header: Option<MessageHeader>,
    /// Decoded message, present only when the whole message was valid.
    pub message: Option<Level2Message>,
}

impl MessageInfo {
    pub fn header_valid(&self) -> bool {
        self.header.is_some()
    }

    pub fn message_valid(&self) -> bool {
        self.message.is_some()
    }

    fn invalid(header: MessageHeader) -> Self {
        Self {
            header: Some(header),
            message: None,
        }
    }
}

/// Extracts Level II messages from a byte stream, reassembling segments.
#[derive(Debug)]
pub struct Level2MessageFactory {
    state: ReassemblyState,
    buffer: Option<ReassemblyBuffer>,
}

impl Default for Level2MessageFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl Level2MessageFactory {
    pub fn new() -> Self {
        Self {
            state: ReassemblyState::AwaitingFirstSegment,
            buffer: None,
        }
    }

    pub fn state(&self) -> ReassemblyState {
        self.state
    }

    /// Bytes accumulated for the message currently being reassembled.
    pub fn buffered_size(&self) -> usize {
        self.buffer.as_ref().map(ReassemblyBuffer::len).unwrap_or(0)
    }

    /// Read one message or segment from `reader`.
    ///
    /// The reader is always left at the end of the message's declared size
    /// (or at the end of the input) so the caller can continue with the
    /// next message.
    pub fn create(&mut self, reader: &mut FieldReader<'_>) -> MessageInfo {
        let header = match MessageHeader::parse(reader) {
            Ok(header) => header,
            Err(_) => return MessageInfo::default(),
        };

        let payload_size = header.payload_size();

        let Some(decode) = decoder_for(header.message_type) else {
            warn!(message_type = header.message_type, "Unknown message type");
            reader.seek_clamped(reader.position() + payload_size);
            return MessageInfo::invalid(header);
        };

        if header.number_of_segments <= 1 {
            trace!(message_type = header.message_type, "Found message");

            let mut payload = match reader.sub_reader(payload_size) {
                Ok(payload) => payload,
                Err(e) => {
                    warn!(error = %e, "End of data reached reading message");
                    reader.seek_clamped(reader.len());
                    return MessageInfo::invalid(header);
                }
            };

            return match decode(&header, &mut payload) {
                Ok(data) => MessageInfo {
                    header: Some(header.clone()),
                    message: Some(Level2Message { header, data }),
                },
                Err(e) => {
                    debug!(message_type = header.message_type, error = %e, "Invalid message");
                    MessageInfo::invalid(header)
                }
            };
        }

        self.accumulate(header, reader, decode)
    }

    fn accumulate(
        &mut self,
        mut header: MessageHeader,
        reader: &mut FieldReader<'_>,
        decode: DecodeFn,
    ) -> MessageInfo {
        let segment = header.segment_number;
        let total_segments = header.number_of_segments;
        let payload_size = header.payload_size();

        trace!(
            message_type = header.message_type,
            segment,
            total_segments,
            "Found message segment"
        );

        if segment == 1 {
            match ReassemblyBuffer::new(
                header.message_type,
                payload_size,
                total_segments,
                reader.remaining(),
            ) {
                Some(buffer) => {
                    self.buffer = Some(buffer);
                    self.state = ReassemblyState::Accumulating;
                }
                None => {
                    warn!(segment, total_segments, "Could not allocate reassembly buffer");
                    reader.seek_clamped(reader.position() + payload_size);
                    self.buffer = None;
                    self.state = ReassemblyState::Failed;
                    return MessageInfo::invalid(header);
                }
            }
        }

        let bytes = match reader.read_bytes(payload_size) {
            Ok(bytes) => bytes,
            Err(_) => {
                warn!("End of data reached trying to buffer message");
                reader.seek_clamped(reader.len());
                self.buffer = None;
                self.state = ReassemblyState::Failed;
                return MessageInfo::invalid(header);
            }
        };

        let continues_message = self
            .buffer
            .as_ref()
            .is_some_and(|b| b.message_type == header.message_type);
        if !continues_message {
            warn!(segment, "Message segment without a first segment");
            self.buffer = None;
            self.state = ReassemblyState::Failed;
            return MessageInfo::invalid(header);
        }

        let appended = self
            .buffer
            .as_mut()
            .is_some_and(|buffer| buffer.append(bytes, segment, total_segments));
        if !appended {
            warn!(segment, "Could not grow reassembly buffer");
            self.buffer = None;
            self.state = ReassemblyState::Failed;
            return MessageInfo::invalid(header);
        }

        if segment < total_segments {
            return MessageInfo::invalid(header);
        }

        let Some(buffer) = self.buffer.take() else {
            return MessageInfo::invalid(header);
        };
        header.set_payload_size(buffer.len());

        let mut payload = FieldReader::new(&buffer.data);
        match decode(&header, &mut payload) {
            Ok(data) => {
                self.state = ReassemblyState::Complete;
                MessageInfo {
                    header: Some(header.clone()),
                    message: Some(Level2Message { header, data }),
                }
            }
            Err(e) => {
                debug!(message_type = header.message_type, error = %e, "Invalid reassembled message");
                self.state = ReassemblyState::Failed;
                MessageInfo::invalid(header)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level2::Level2MessageData;

    fn header(size_halfwords: u16, msg_type: u8, segs: u16, seg: u16) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&size_halfwords.to_be_bytes());
        out.push(0);
        out.push(msg_type);
        out.extend_from_slice(&7u16.to_be_bytes());
        out.extend_from_slice(&19449u16.to_be_bytes());
        out.extend_from_slice(&0u32.to_be_bytes());
        out.extend_from_slice(&segs.to_be_bytes());
        out.extend_from_slice(&seg.to_be_bytes());
        out
    }

    fn message(msg_type: u8, payload: &[u8]) -> Vec<u8> {
        let mut out = header(((payload.len() + 16) / 2) as u16, msg_type, 1, 1);
        out.extend_from_slice(payload);
        out
    }

    #[test]
    fn test_unknown_type_skipped() {
        let mut bytes = message(99, &[0xAB; 20]);
        bytes.extend_from_slice(&message(3, &[1, 2, 3, 4]));

        let mut reader = FieldReader::new(&bytes);
        let mut factory = Level2MessageFactory::new();

        let first = factory.create(&mut reader);
        assert!(first.header_valid());
        assert!(!first.message_valid());
        assert_eq!(reader.position(), 36);

        let second = factory.create(&mut reader);
        let msg = second.message.unwrap();
        match msg.data {
            Level2MessageData::Opaque {
                message_type,
                payload,
            } => {
                assert_eq!(message_type, 3);
                assert_eq!(payload[..], [1, 2, 3, 4]);
            }
            other => panic!("unexpected message {:?}", other),
        }
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_invalid_header() {
        let bytes = [0u8; 16];
        let mut reader = FieldReader::new(&bytes);
        let info = Level2MessageFactory::new().create(&mut reader);
        assert!(!info.header_valid());
    }

    #[test]
    fn test_eof_mid_segment_fails() {
        let mut bytes = header(16, 18, 3, 1);
        bytes.extend_from_slice(&[0u8; 16]);
        bytes.extend_from_slice(&header(16, 18, 3, 2));
        bytes.extend_from_slice(&[0u8; 5]);

        let mut reader = FieldReader::new(&bytes);
        let mut factory = Level2MessageFactory::new();

        assert!(!factory.create(&mut reader).message_valid());
        assert_eq!(factory.state(), ReassemblyState::Accumulating);
        assert_eq!(factory.buffered_size(), 16);

        assert!(!factory.create(&mut reader).message_valid());
        assert_eq!(factory.state(), ReassemblyState::Failed);
        assert_eq!(factory.buffered_size(), 0);
    }

    #[test]
    fn test_segments_reassembled() {
        let mut bytes = Vec::new();
        for seg in 1..=3u16 {
            bytes.extend_from_slice(&header(12, 18, 3, seg));
            bytes.extend_from_slice(&[seg as u8; 8]);
        }

        let mut reader = FieldReader::new(&bytes);
        let mut factory = Level2MessageFactory::new();

        assert!(factory.create(&mut reader).header_valid());
        assert!(factory.create(&mut reader).header_valid());
        let info = factory.create(&mut reader);
        assert_eq!(factory.state(), ReassemblyState::Complete);

        let msg = info.message.unwrap();
        assert_eq!(msg.header.payload_size(), 24);
        match msg.data {
            Level2MessageData::Opaque { payload, .. } => {
                assert_eq!(&payload[..8], &[1; 8]);
                assert_eq!(&payload[16..], &[3; 8]);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_buffer_grows_past_estimate() {
        let mut buffer = ReassemblyBuffer::new(18, 4, 2, 1024).unwrap();
        assert!(buffer.append(&[0; 4], 1, 2));
        assert!(buffer.append(&[0; 4], 2, 2));
        assert!(buffer.append(&[0; 4], 3, 2));
        assert_eq!(buffer.len(), 12);
        assert!(buffer.data.capacity() >= 12);
    }

    #[test]
    fn test_buffer_estimate_capped_by_input() {
        // 65535 segments of 131050 bytes would need about 8.6 GB
        let buffer = ReassemblyBuffer::new(18, 131_050, u16::MAX, 64).unwrap();
        assert!(buffer.data.capacity() < 1024);
    }

    #[test]
    fn test_oversized_segment_count_fails_cleanly() {
        let bytes = header(65533, 18, u16::MAX, 1);

        let mut reader = FieldReader::new(&bytes);
        let mut factory = Level2MessageFactory::new();

        let info = factory.create(&mut reader);
        assert!(info.header_valid());
        assert!(!info.message_valid());
        assert_eq!(factory.state(), ReassemblyState::Failed);
        assert_eq!(factory.buffered_size(), 0);
        assert!(reader.is_at_end());
    }

    #[test]
    fn test_large_first_segment_with_short_input() {
        let mut bytes = header(65533, 18, u16::MAX, 1);
        bytes.extend_from_slice(&[0u8; 100]);

        let mut reader = FieldReader::new(&bytes);
        let mut factory = Level2MessageFactory::new();

        assert!(!factory.create(&mut reader).message_valid());
        assert_eq!(factory.state(), ReassemblyState::Failed);
    }
}
