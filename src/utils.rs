use gnss::prelude::Constellation;

use itertools::Itertools;

use hifitime::prelude::Epoch;

use crate::rtcm::Error;

/// Formats bytes as upper case hexadecimal
pub fn to_hex(bytes: &[u8]) -> String {
    format!("{:02X}", bytes.iter().format(""))
}

/// Parses an hexadecimal string, white spaces are tolerated
pub fn from_hex(s: &str) -> Result<Vec<u8>, Error> {
    let digits = s
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_digit(16).map(|d| d as u8).ok_or(Error::InvalidHex))
        .collect::<Result<Vec<u8>, Error>>()?;

    if digits.len() % 2 != 0 {
        return Err(Error::InvalidHex);
    }

    Ok(digits
        .chunks(2)
        .map(|pair| (pair[0] << 4) | pair[1])
        .collect())
}

/// First MSM message number (MSM1 minus one) of this [Constellation]
pub fn msm_base_number(constellation: Constellation) -> Option<u16> {
    match constellation {
        Constellation::GPS => Some(1070),
        Constellation::Glonass => Some(1080),
        Constellation::Galileo => Some(1090),
        _ => None,
    }
}

/// IGS SSR message number offset of this [Constellation]
pub fn igs_ssr_offset(constellation: Constellation) -> Option<u8> {
    match constellation {
        Constellation::GPS => Some(20),
        Constellation::Glonass => Some(40),
        Constellation::Galileo => Some(60),
        Constellation::QZSS => Some(80),
        Constellation::BeiDou => Some(100),
        c if c.is_sbas() => Some(120),
        _ => None,
    }
}

/// Modified Julian Day and second of day, in UTC
pub fn utc_mjd(t: Epoch) -> (u32, u32) {
    let (y, m, d, hh, mm, ss, _) = t.to_gregorian_utc();
    let midnight = Epoch::from_gregorian_utc_at_midnight(y, m, d);
    let mjd = midnight.to_mjd_utc_days().round().max(0.0) as u32;
    (mjd, hh as u32 * 3600 + mm as u32 * 60 + ss as u32)
}

/// GLONASS day of week (0 = Sunday) and time of day in milliseconds.
/// GLONASS time is UTC(SU) + 3h.
pub fn glonass_day_time_ms(t: Epoch) -> (u8, u32) {
    let mjd = t.to_mjd_utc_days() + 3.0 / 24.0;
    let mut day = mjd.floor();
    let mut ms = ((mjd - day) * 86_400_000.0).round();
    if ms >= 86_400_000.0 {
        ms -= 86_400_000.0;
        day += 1.0;
    }
    // MJD 0 was a Wednesday
    let dow = ((day as i64 + 3).rem_euclid(7)) as u8;
    (dow, ms as u32)
}
