//! RTCM 3 message codec.
//!
//! Builders turn receiver observations, broadcast ephemerides and station
//! metadata into CRC-sealed transport [frame::Frame]s. Readers go the other
//! way for 1005, 1019, 1020 and 1045.
use thiserror::Error;

use gnss::prelude::Constellation;

pub mod bits;
pub mod crc;
pub mod ephemeris;
pub mod frame;
pub mod legacy;
pub mod lock;
pub mod msm;
pub mod navigation;
pub mod observation;
pub mod registry;
pub mod ssr;
pub mod station;

pub(crate) mod fields;

/// Speed of light in vacuum (m/s)
pub const SPEED_OF_LIGHT_M_S: f64 = 299_792_458.0;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    #[error("no satellite to encode")]
    NoSatellites,
    #[error("{field}: {value} does not fit in {bits} bits")]
    FieldOverflow {
        field: &'static str,
        value: i64,
        bits: u32,
    },
    #[error("payload of {0} bytes exceeds the 1023 bytes limit")]
    PayloadTooLarge(usize),
    #[error("{0} satellite/signal cells exceed the MSM cell mask capacity")]
    TooManyCells(usize),
    #[error("missing {0} ephemeris")]
    MissingEphemeris(&'static str),
    #[error("ephemeris and observation describe different satellites")]
    EphemerisMismatch,
    #[error("{0} is not supported by this message")]
    UnsupportedConstellation(Constellation),
    #[error("text too long")]
    TextTooLong,
    #[error("missing {0}")]
    MissingInput(&'static str),
    #[error("invalid preamble")]
    BadPreamble,
    #[error("truncated frame")]
    Truncated,
    #[error("crc mismatch")]
    CrcMismatch,
    #[error("expecting message {expected}, got {found}")]
    UnexpectedMessage { expected: u16, found: u16 },
    #[error("invalid hex string")]
    InvalidHex,
}

/// Verifies that an integer parameter fits in its Data Field
pub(crate) fn check_unsigned(field: &'static str, value: u64, bits: u32) -> Result<(), Error> {
    if bits < 64 && value >= (1u64 << bits) {
        Err(Error::FieldOverflow {
            field,
            value: value.min(i64::MAX as u64) as i64,
            bits,
        })
    } else {
        Ok(())
    }
}

/// Verifies a GLONASS frequency channel number, encoded as k+7 on 5 bits
pub(crate) fn check_glonass_channel(k: i8) -> Result<i8, Error> {
    if (-7..=6).contains(&k) {
        Ok(k)
    } else {
        Err(Error::FieldOverflow {
            field: "GLONASS frequency channel",
            value: k as i64,
            bits: 5,
        })
    }
}
