//! Frame encoding and decoding
//!
//! Frame format:
//! - START (1 byte): 0xA5 synchronization byte
//! - LENGTH (1 byte): payload length (0-32)
//! - TYPE (1 byte): message type identifier
//! - PAYLOAD (0-32 bytes): type-specific data
//! - CRC8 (1 byte): CRC-8 (poly 0x07, init 0) over LENGTH, TYPE and PAYLOAD

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xA5;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 32;

/// START, LENGTH, TYPE
const HEADER_SIZE: usize = 3;

/// Header plus the trailing CRC
const FRAME_OVERHEAD: usize = HEADER_SIZE + 1;

/// Maximum complete frame size
pub const MAX_FRAME_SIZE: usize = FRAME_OVERHEAD + MAX_PAYLOAD_SIZE;

const CRC8_POLY: u8 = 0x07;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// CRC mismatch
    InvalidCrc,
    /// Unknown message type or malformed payload
    InvalidFrame,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// CRC-8/SMBUS over `data`, continuing from `crc`
pub fn crc8(mut crc: u8, data: &[u8]) -> u8 {
    for &byte in data {
        crc ^= byte;
        for _ in 0..8 {
            crc = if crc & 0x80 != 0 {
                (crc << 1) ^ CRC8_POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Message type identifier
    pub msg_type: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Frame carrying a copy of `payload`
    pub fn new(msg_type: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self { msg_type, payload })
    }

    /// Create a frame with no payload
    pub fn empty(msg_type: u8) -> Self {
        Self {
            msg_type,
            payload: Vec::new(),
        }
    }

    /// Bytes this frame occupies on the wire
    pub fn encoded_len(&self) -> usize {
        FRAME_OVERHEAD + self.payload.len()
    }

    fn crc(&self) -> u8 {
        crc8(crc8(0, &[self.payload.len() as u8, self.msg_type]), &self.payload)
    }

    /// Encode this frame into the front of `buffer`
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let len = self.encoded_len();
        let out = buffer.get_mut(..len).ok_or(FrameError::BufferTooSmall)?;

        let (header, rest) = out.split_at_mut(HEADER_SIZE);
        header.copy_from_slice(&[FRAME_START, self.payload.len() as u8, self.msg_type]);
        let (body, trailer) = rest.split_at_mut(self.payload.len());
        body.copy_from_slice(&self.payload);
        trailer[0] = self.crc();

        Ok(len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut out = Vec::new();
        out.resize(self.encoded_len(), 0)
            .map_err(|_| FrameError::BufferTooSmall)?;
        self.encode(&mut out)?;
        Ok(out)
    }
}

/// Byte-at-a-time frame parser
///
/// Holds at most one partial frame. `received` counts the bytes taken
/// since the START byte; zero means the parser is hunting for START. The
/// CRC runs over LENGTH, TYPE and payload as they arrive.
#[derive(Debug, Clone)]
pub struct FrameParser {
    received: usize,
    length: u8,
    msg_type: u8,
    crc: u8,
    payload: [u8; MAX_PAYLOAD_SIZE],
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Parser hunting for a START byte
    pub const fn new() -> Self {
        Self {
            received: 0,
            length: 0,
            msg_type: 0,
            crc: 0,
            payload: [0; MAX_PAYLOAD_SIZE],
        }
    }

    fn reset(&mut self) {
        self.received = 0;
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    /// The parser resynchronizes on its own after an error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        let index = self.received;
        if index == 0 {
            if byte == FRAME_START {
                self.received = 1;
                self.crc = 0;
            }
            return Ok(None);
        }

        match index {
            1 if usize::from(byte) > MAX_PAYLOAD_SIZE => {
                self.reset();
                return Err(FrameError::PayloadTooLarge);
            }
            1 => self.length = byte,
            2 => self.msg_type = byte,
            _ => {
                let offset = index - HEADER_SIZE;
                if offset == usize::from(self.length) {
                    return self.finish(byte).map(Some);
                }
                self.payload[offset] = byte;
            }
        }

        self.received += 1;
        self.crc = crc8(self.crc, &[byte]);
        Ok(None)
    }

    fn finish(&mut self, crc: u8) -> Result<Frame, FrameError> {
        self.reset();
        if crc != self.crc {
            return Err(FrameError::InvalidCrc);
        }
        Frame::new(self.msg_type, &self.payload[..usize::from(self.length)])
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame or error, if any. Bytes after it
    /// are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        bytes
            .iter()
            .find_map(|&byte| self.feed(byte).transpose())
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_crc8_check_value() {
        // CRC-8/SMBUS check value for "123456789"
        assert_eq!(crc8(0, b"123456789"), 0xF4);
    }

    #[test]
    fn test_encode_empty_payload() {
        let frame = Frame::empty(0x1F);
        let mut buffer = [0u8; 8];

        assert_eq!(frame.encode(&mut buffer), Ok(4));
        assert_eq!(&buffer[..4], &[FRAME_START, 0, 0x1F, crc8(0, &[0, 0x1F])]);
    }

    #[test]
    fn test_encode_buffer_too_small() {
        let frame = Frame::new(0x10, &[1, 2, 3]).unwrap();
        let mut buffer = [0u8; 6];
        assert_eq!(frame.encode(&mut buffer), Err(FrameError::BufferTooSmall));
    }

    #[test]
    fn test_parse_encoded_frame() {
        let original = Frame::new(0x10, &[3, 0xB8, 0x0B, 0, 0, 18, 0]).unwrap();
        let encoded = original.encode_to_vec().unwrap();
        assert_eq!(encoded.len(), original.encoded_len());

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Ok(Some(original)));
    }

    #[test]
    fn test_full_payload_frame() {
        let payload: [u8; MAX_PAYLOAD_SIZE] = core::array::from_fn(|i| i as u8);
        let original = Frame::new(0x10, &payload).unwrap();
        let encoded = original.encode_to_vec().unwrap();
        assert_eq!(encoded.len(), MAX_FRAME_SIZE);

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Ok(Some(original)));
    }

    #[test]
    fn test_corrupted_payload_rejected() {
        let mut encoded = Frame::new(0x02, &[36, 0]).unwrap().encode_to_vec().unwrap();
        encoded[3] ^= 0x01;

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Err(FrameError::InvalidCrc));
    }

    #[test]
    fn test_corrupted_type_rejected() {
        let mut encoded = Frame::new(0x02, &[36, 0]).unwrap().encode_to_vec().unwrap();
        encoded[2] = 0x03;

        let mut parser = FrameParser::new();
        assert_eq!(parser.feed_bytes(&encoded), Err(FrameError::InvalidCrc));
    }

    #[test]
    fn test_resync_after_garbage() {
        let encoded = Frame::empty(0x03).encode_to_vec().unwrap();

        let mut data = Vec::<u8, 16>::new();
        data.extend_from_slice(&[0x00, 0xFF, 0x12]).unwrap();
        data.extend_from_slice(&encoded).unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&data).unwrap().unwrap();
        assert_eq!(parsed.msg_type, 0x03);
    }

    #[test]
    fn test_back_to_back_frames() {
        let first = Frame::new(0x02, &[36, 0]).unwrap().encode_to_vec().unwrap();
        let second = Frame::empty(0x03).encode_to_vec().unwrap();

        let mut data = Vec::<u8, 16>::new();
        data.extend_from_slice(&first).unwrap();
        data.extend_from_slice(&second).unwrap();

        let mut parser = FrameParser::new();
        let parsed = parser.feed_bytes(&data).unwrap().unwrap();
        assert_eq!(parsed.msg_type, 0x02);
        let parsed = parser.feed_bytes(&data[first.len()..]).unwrap().unwrap();
        assert_eq!(parsed.msg_type, 0x03);
    }

    #[test]
    fn test_oversized_length_rejected() {
        let mut parser = FrameParser::new();
        assert_eq!(parser.feed(FRAME_START), Ok(None));
        assert_eq!(parser.feed(MAX_PAYLOAD_SIZE as u8 + 1), Err(FrameError::PayloadTooLarge));

        // Next frame still parses
        let encoded = Frame::empty(0x03).encode_to_vec().unwrap();
        assert!(parser.feed_bytes(&encoded).unwrap().is_some());
    }

    #[test]
    fn test_payload_too_large() {
        let payload = [0u8; MAX_PAYLOAD_SIZE + 1];
        assert_eq!(Frame::new(0x10, &payload), Err(FrameError::PayloadTooLarge));
    }

    proptest! {
        #[test]
        fn test_parser_survives_noise(noise in prop::collection::vec(any::<u8>(), 0..128)) {
            let mut parser = FrameParser::new();
            for byte in noise {
                let _ = parser.feed(byte);
            }
            // Once back to hunting, a clean frame always parses
            parser.reset();
            let encoded = Frame::new(0x02, &[10, 0]).unwrap().encode_to_vec().unwrap();
            prop_assert_eq!(parser.feed_bytes(&encoded).unwrap().map(|f| f.msg_type), Some(0x02));
        }
    }
}
