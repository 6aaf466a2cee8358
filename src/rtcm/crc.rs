//! CRC-24Q (Qualcomm), as mandated by the RTCM 3 transport layer.
//! Polynomial 0x1864CFB, zero initial value, no final XOR.

pub const CRC24Q_POLY: u32 = 0x0186_4CFB;

/// CRC length in bytes
pub const CRC_LEN: usize = 3;

const fn make_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = (i as u32) << 16;
        let mut j = 0;
        while j < 8 {
            crc <<= 1;
            if crc & 0x0100_0000 != 0 {
                crc ^= CRC24Q_POLY;
            }
            j += 1;
        }
        table[i] = crc & 0x00FF_FFFF;
        i += 1;
    }
    table
}

static TABLE: [u32; 256] = make_table();

/// Computes the CRC-24Q of given bytes
pub fn crc24q(data: &[u8]) -> u32 {
    data.iter().fold(0, |crc, byte| {
        ((crc << 8) & 0x00FF_FFFF) ^ TABLE[(((crc >> 16) as u8) ^ byte) as usize]
    })
}

/// Appends the 24-bit big endian CRC of `frame` to itself
pub fn add_crc(frame: &mut Vec<u8>) {
    let crc = crc24q(frame);
    frame.extend_from_slice(&[(crc >> 16) as u8, (crc >> 8) as u8, crc as u8]);
}

/// Verifies a complete transport frame: preamble and length header,
/// payload, then the CRC over both. The payload size is taken
/// from the length field, trailing bytes are ignored.
pub fn check_crc(frame: &[u8]) -> bool {
    if frame.len() < 3 + CRC_LEN {
        return false;
    }

    let size = (((frame[1] & 0x03) as usize) << 8) | frame[2] as usize;
    let end = 3 + size;

    if frame.len() < end + CRC_LEN {
        return false;
    }

    let expected = ((frame[end] as u32) << 16) | ((frame[end + 1] as u32) << 8) | frame[end + 2] as u32;

    crc24q(&frame[..end]) == expected
}
