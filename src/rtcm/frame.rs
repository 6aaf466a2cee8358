//! RTCM 3 transport layer
use crate::{
    rtcm::{
        Error,
        bits::{BitReader, BitWriter},
        crc::{CRC_LEN, add_crc, check_crc},
    },
    utils::to_hex,
};

/// Transport layer preamble
pub const PREAMBLE: u8 = 0xD3;

/// Preamble + reserved bits + length
pub const HEADER_LEN: usize = 3;

/// Largest payload the 10-bit length field can describe
pub const MAX_PAYLOAD_LEN: usize = 1023;

/// Complete, CRC sealed, RTCM 3 frame
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Frame(Vec<u8>);

impl Frame {
    /// Validates the first frame contained in `bytes`.
    /// Bytes past the end of the frame are ignored.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() < HEADER_LEN + CRC_LEN {
            return Err(Error::Truncated);
        }
        if bytes[0] != PREAMBLE {
            return Err(Error::BadPreamble);
        }
        let size = payload_len(bytes);
        let total = HEADER_LEN + size + CRC_LEN;
        if bytes.len() < total {
            return Err(Error::Truncated);
        }
        if !check_crc(&bytes[..total]) {
            return Err(Error::CrcMismatch);
        }
        Ok(Self(bytes[..total].to_vec()))
    }

    /// Payload (message content) bytes
    pub fn payload(&self) -> &[u8] {
        &self.0[HEADER_LEN..self.0.len() - CRC_LEN]
    }

    /// Payload length, as encoded in the header
    pub fn payload_len(&self) -> usize {
        payload_len(&self.0)
    }

    /// Total length in bytes (header + payload + CRC)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.payload_len() == 0
    }

    /// Message number (first Data Field of every message)
    pub fn message_number(&self) -> u16 {
        let mut reader = BitReader::new(self.payload());
        reader.get_unsigned(12).map(|n| n as u16).unwrap_or(0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl AsRef<[u8]> for Frame {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Frame> for Vec<u8> {
    fn from(frame: Frame) -> Self {
        frame.0
    }
}

impl std::fmt::Display for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", to_hex(&self.0))
    }
}

fn payload_len(bytes: &[u8]) -> usize {
    (((bytes[1] & 0x03) as usize) << 8) | bytes[2] as usize
}

/// Wraps a message payload into a transport frame:
/// zero padding to the next byte boundary, preamble, 6 reserved bits,
/// 10-bit length, payload and CRC-24Q.
pub fn build_message(payload: BitWriter) -> Result<Frame, Error> {
    let size = payload.byte_len();
    if size > MAX_PAYLOAD_LEN {
        return Err(Error::PayloadTooLarge(size));
    }

    let mut bytes = Vec::with_capacity(HEADER_LEN + size + CRC_LEN);
    bytes.push(PREAMBLE);
    bytes.push(((size >> 8) & 0x03) as u8);
    bytes.push((size & 0xFF) as u8);
    bytes.extend_from_slice(&payload.into_bytes());

    add_crc(&mut bytes);
    Ok(Frame(bytes))
}

/// Picks valid frames out of an arbitrary byte stream.
/// Bytes that do not belong to a CRC valid frame are dropped.
#[derive(Debug, Default)]
pub struct FrameSplitter {
    buffer: Vec<u8>,
    /// Number of bytes dropped so far
    pub dropped: usize,
}

impl FrameSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stacks new bytes
    pub fn extend(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Number of bytes waiting for more content
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    fn drop_bytes(&mut self, count: usize) {
        self.buffer.drain(..count);
        self.dropped += count;
    }
}

impl Iterator for FrameSplitter {
    type Item = Frame;

    fn next(&mut self) -> Option<Frame> {
        loop {
            match self.buffer.iter().position(|b| *b == PREAMBLE) {
                Some(offset) => self.drop_bytes(offset),
                None => {
                    let len = self.buffer.len();
                    self.drop_bytes(len);
                    return None;
                },
            }

            if self.buffer.len() < HEADER_LEN {
                return None;
            }

            if self.buffer[1] & 0xFC != 0 {
                // reserved bits must be zero: not a frame start
                self.drop_bytes(1);
                continue;
            }

            let total = HEADER_LEN + payload_len(&self.buffer) + CRC_LEN;
            if self.buffer.len() < total {
                return None;
            }

            if check_crc(&self.buffer[..total]) {
                let frame = Frame(self.buffer[..total].to_vec());
                self.buffer.drain(..total);
                return Some(frame);
            }

            self.drop_bytes(1);
        }
    }
}
