//! Bit field codec.
//!
//! Data Fields are packed most significant bit first, one after the other,
//! with no alignment. The width and signedness of each field is decided by
//! the message builder.
use crate::rtcm::Error;

/// Largest magnitude a signed field of `width` bits may carry.
/// The most negative two's complement value is left out: RTCM
/// reserves it as the "invalid" sentinel of most signed fields.
fn signed_limit(width: usize) -> i64 {
    if width >= 64 {
        i64::MAX
    } else {
        (1i64 << (width - 1)) - 1
    }
}

fn unsigned_limit(width: usize) -> u64 {
    if width >= 64 {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Growing sequence of bits, owned by the builder of one message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BitWriter {
    bytes: Vec<u8>,
    len: usize,
}

impl BitWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(bits: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bits.div_ceil(8)),
            len: 0,
        }
    }

    /// Number of bits written so far
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn push_bit(&mut self, bit: bool) {
        let offset = self.len % 8;
        if offset == 0 {
            self.bytes.push(0);
        }
        if bit {
            if let Some(last) = self.bytes.last_mut() {
                *last |= 0x80 >> offset;
            }
        }
        self.len += 1;
    }

    fn push_raw(&mut self, width: usize, value: u64) {
        for i in (0..width).rev() {
            let bit = if i < 64 { (value >> i) & 1 == 1 } else { false };
            self.push_bit(bit);
        }
    }

    /// Appends an unsigned field. Values beyond the field capacity saturate.
    pub fn put_unsigned(&mut self, width: usize, value: u64) {
        self.push_raw(width, value.min(unsigned_limit(width)));
    }

    /// Appends a two's complement field. Values beyond the field capacity saturate.
    pub fn put_signed(&mut self, width: usize, value: i64) {
        if width == 0 {
            return;
        }
        let limit = signed_limit(width);
        let value = value.clamp(-limit, limit);
        self.push_raw(width, (value as u64) & unsigned_limit(width));
    }

    /// Appends a sign-magnitude field (GLONASS "intS" fields).
    /// The magnitude saturates to `width - 1` bits.
    pub fn put_sign_magnitude(&mut self, width: usize, value: i64) {
        if width == 0 {
            return;
        }
        let magnitude = value.unsigned_abs().min(unsigned_limit(width - 1));
        self.push_bit(value < 0);
        self.push_raw(width - 1, magnitude);
    }

    /// Appends the most negative two's complement value of this width,
    /// which RTCM uses to flag an invalid or missing measurement.
    pub fn put_invalid(&mut self, width: usize) {
        if width == 0 {
            return;
        }
        self.push_bit(true);
        self.push_raw(width - 1, 0);
    }

    pub fn put_bool(&mut self, value: bool) {
        self.push_bit(value);
    }

    /// Appends `round((value - bias) / scale)` as a two's complement field
    pub fn put_scaled_real(&mut self, width: usize, value: f64, scale: f64, bias: f64) {
        self.put_signed(width, ((value - bias) / scale).round() as i64);
    }

    /// Appends `round(value / scale)` as an unsigned field
    pub fn put_scaled_unsigned(&mut self, width: usize, value: f64, scale: f64) {
        self.put_unsigned(width, (value / scale).round().max(0.0) as u64);
    }

    /// Appends `round(value / scale)` as a sign-magnitude field
    pub fn put_scaled_sign_magnitude(&mut self, width: usize, value: f64, scale: f64) {
        self.put_sign_magnitude(width, (value / scale).round() as i64);
    }

    /// Appends each byte as an 8-bit field
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        for byte in bytes {
            self.push_raw(8, *byte as u64);
        }
    }

    /// Appends all bits of another writer
    pub fn append(&mut self, other: &BitWriter) {
        for i in 0..other.len {
            let byte = other.bytes[i / 8];
            self.push_bit(byte & (0x80 >> (i % 8)) != 0);
        }
    }

    /// Number of bytes once padded to the next byte boundary
    pub fn byte_len(&self) -> usize {
        self.len.div_ceil(8)
    }

    /// Pads with zero bits up to the next byte boundary and returns the bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

/// Reads Data Fields back, in the order they were written.
#[derive(Debug, Clone)]
pub struct BitReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BitReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Current bit position
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Number of bits left
    pub fn remaining(&self) -> usize {
        (self.data.len() * 8).saturating_sub(self.pos)
    }

    pub fn skip(&mut self, width: usize) -> Result<(), Error> {
        if self.remaining() < width {
            return Err(Error::Truncated);
        }
        self.pos += width;
        Ok(())
    }

    pub fn get_unsigned(&mut self, width: usize) -> Result<u64, Error> {
        if width > 64 || self.remaining() < width {
            return Err(Error::Truncated);
        }
        let mut value = 0u64;
        for _ in 0..width {
            let byte = self.data[self.pos / 8];
            let bit = (byte >> (7 - (self.pos % 8))) & 1;
            value = (value << 1) | bit as u64;
            self.pos += 1;
        }
        Ok(value)
    }

    pub fn get_signed(&mut self, width: usize) -> Result<i64, Error> {
        let raw = self.get_unsigned(width)?;
        if width == 0 || width >= 64 {
            return Ok(raw as i64);
        }
        if raw & (1u64 << (width - 1)) != 0 {
            Ok(raw as i64 - (1i64 << width))
        } else {
            Ok(raw as i64)
        }
    }

    pub fn get_sign_magnitude(&mut self, width: usize) -> Result<i64, Error> {
        if width == 0 {
            return Ok(0);
        }
        let negative = self.get_bool()?;
        let magnitude = self.get_unsigned(width - 1)? as i64;
        Ok(if negative { -magnitude } else { magnitude })
    }

    pub fn get_bool(&mut self) -> Result<bool, Error> {
        Ok(self.get_unsigned(1)? == 1)
    }

    pub fn get_scaled_real(&mut self, width: usize, scale: f64) -> Result<f64, Error> {
        Ok(self.get_signed(width)? as f64 * scale)
    }

    pub fn get_scaled_unsigned(&mut self, width: usize, scale: f64) -> Result<f64, Error> {
        Ok(self.get_unsigned(width)? as f64 * scale)
    }

    pub fn get_scaled_sign_magnitude(&mut self, width: usize, scale: f64) -> Result<f64, Error> {
        Ok(self.get_sign_magnitude(width)? as f64 * scale)
    }

    pub fn get_bytes(&mut self, count: usize) -> Result<Vec<u8>, Error> {
        (0..count)
            .map(|_| self.get_unsigned(8).map(|byte| byte as u8))
            .collect()
    }
}
