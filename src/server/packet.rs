//! Internal framing between producers, the caster and its clients:
//! "GS" followed by the body length on 4 decimal digits, then the body.
use crate::server::Error;

/// Header length (bytes)
pub const HEADER_LEN: usize = 6;

/// Largest body a [Packet] may carry (bytes)
pub const MAX_BODY_LEN: usize = 1029;

const MAGIC: &[u8; 2] = b"GS";

/// One framed message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet(Vec<u8>);

impl Packet {
    /// Frames `body`. Bodies longer than [MAX_BODY_LEN] are truncated.
    pub fn encode(body: &[u8]) -> Self {
        let len = body.len().min(MAX_BODY_LEN);
        let mut bytes = Vec::with_capacity(HEADER_LEN + len);
        bytes.extend_from_slice(&Self::header(len));
        bytes.extend_from_slice(&body[..len]);
        Self(bytes)
    }

    /// Header announcing a body of `len` bytes (clamped)
    pub fn header(len: usize) -> [u8; HEADER_LEN] {
        let digits = format!("{:04}", len.min(MAX_BODY_LEN));
        let mut header = [0; HEADER_LEN];
        header[..2].copy_from_slice(MAGIC);
        header[2..].copy_from_slice(digits.as_bytes());
        header
    }

    /// Decodes a header and returns the announced body length.
    /// Fails on a bad magic, non decimal digits, or a length that is
    /// either null or above [MAX_BODY_LEN].
    pub fn decode_header(header: &[u8]) -> Result<usize, Error> {
        if header.len() < HEADER_LEN || !header.starts_with(MAGIC) {
            return Err(Error::Header);
        }

        let digits = &header[2..HEADER_LEN];
        if !digits.iter().all(|b| b.is_ascii_digit()) {
            return Err(Error::Header);
        }

        let len = digits
            .iter()
            .fold(0usize, |acc, b| acc * 10 + (b - b'0') as usize);

        if len == 0 || len > MAX_BODY_LEN {
            Err(Error::Header)
        } else {
            Ok(len)
        }
    }

    /// Header and body
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn body(&self) -> &[u8] {
        &self.0[HEADER_LEN..]
    }

    pub fn body_len(&self) -> usize {
        self.0.len() - HEADER_LEN
    }
}
