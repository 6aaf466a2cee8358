//! Station description messages: 1005, 1006 (antenna reference point),
//! 1008 (antenna descriptor) and 1029 (text).
use hifitime::prelude::Epoch;

use crate::{
    rtcm::{
        Error,
        bits::{BitReader, BitWriter},
        check_unsigned,
        ephemeris::{ConstellationTime, GpsEphemeris},
        frame::{Frame, build_message},
    },
    utils::utc_mjd,
};

/// Antenna Reference Point of a reference station (1005, 1006)
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct StationArp {
    pub station_id: u16,
    /// ITRF realization year (DF021)
    pub itrf_year: u8,
    pub gps: bool,
    pub glonass: bool,
    pub galileo: bool,
    /// Non physical (computed) reference station (DF141)
    pub non_physical: bool,
    /// ECEF coordinates (m)
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,
    /// All raw data observations are measured at the same instant (DF142)
    pub single_oscillator: bool,
    /// Quarter cycle indicator (DF364)
    pub quarter_cycle: u8,
    /// Antenna height above marker (m), 1006 only
    pub antenna_height_m: f64,
}

/// Antenna descriptor and serial number (1008)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct AntennaDescriptor {
    pub station_id: u16,
    pub descriptor: String,
    pub setup_id: u8,
    pub serial_number: String,
}

fn arp_content(msg: u16, arp: &StationArp) -> Result<BitWriter, Error> {
    check_unsigned("station ID", arp.station_id as u64, 12)?;
    check_unsigned("ITRF year", arp.itrf_year as u64, 6)?;
    check_unsigned("quarter cycle indicator", arp.quarter_cycle as u64, 2)?;

    let mut w = BitWriter::with_capacity(168);
    w.put_unsigned(12, msg as u64);
    w.put_unsigned(12, arp.station_id as u64);
    w.put_unsigned(6, arp.itrf_year as u64);
    w.put_bool(arp.gps);
    w.put_bool(arp.glonass);
    w.put_bool(arp.galileo);
    w.put_bool(arp.non_physical);
    w.put_scaled_real(38, arp.x_m, 0.0001, 0.0);
    w.put_bool(arp.single_oscillator);
    w.put_bool(false); // reserved
    w.put_scaled_real(38, arp.y_m, 0.0001, 0.0);
    w.put_unsigned(2, arp.quarter_cycle as u64);
    w.put_scaled_real(38, arp.z_m, 0.0001, 0.0);
    Ok(w)
}

/// Builds a 1005 (station ARP, no antenna height)
pub fn build_1005(arp: &StationArp) -> Result<Frame, Error> {
    build_message(arp_content(1005, arp)?)
}

/// Builds a 1006 (station ARP with antenna height)
pub fn build_1006(arp: &StationArp) -> Result<Frame, Error> {
    let mut w = arp_content(1006, arp)?;
    w.put_scaled_unsigned(16, arp.antenna_height_m, 0.0001);
    build_message(w)
}

/// Builds a 1008 (antenna descriptor and serial number)
pub fn build_1008(antenna: &AntennaDescriptor) -> Result<Frame, Error> {
    check_unsigned("station ID", antenna.station_id as u64, 12)?;

    let descriptor = antenna.descriptor.as_bytes();
    let serial = antenna.serial_number.as_bytes();
    if descriptor.len() > 31 || serial.len() > 31 {
        return Err(Error::TextTooLong);
    }

    let mut w = BitWriter::with_capacity(48 + 8 * (descriptor.len() + serial.len()));
    w.put_unsigned(12, 1008);
    w.put_unsigned(12, antenna.station_id as u64);
    w.put_unsigned(8, descriptor.len() as u64);
    w.put_bytes(descriptor);
    w.put_unsigned(8, antenna.setup_id as u64);
    w.put_unsigned(8, serial.len() as u64);
    w.put_bytes(serial);
    build_message(w)
}

/// Builds a 1029 (Unicode text) stamped with the UTC time of the
/// observation, resolved from the GPS week of the ephemeris.
pub fn build_1029(
    station_id: u16,
    ephemeris: &GpsEphemeris,
    obs_time: f64,
    text: &str,
) -> Result<Frame, Error> {
    build_1029_at(station_id, ephemeris.observation_epoch(obs_time), text)
}

/// Builds a 1029 (Unicode text) stamped with `t`
pub fn build_1029_at(station_id: u16, t: Epoch, text: &str) -> Result<Frame, Error> {
    check_unsigned("station ID", station_id as u64, 12)?;

    let chars = text.chars().count();
    let bytes = text.as_bytes();
    if chars > 127 || bytes.len() > 255 {
        return Err(Error::TextTooLong);
    }

    let (mjd, seconds_of_day) = utc_mjd(t);
    check_unsigned("MJD", mjd as u64, 16)?;

    let mut w = BitWriter::with_capacity(72 + 8 * bytes.len());
    w.put_unsigned(12, 1029);
    w.put_unsigned(12, station_id as u64);
    w.put_unsigned(16, mjd as u64);
    w.put_unsigned(17, seconds_of_day as u64);
    w.put_unsigned(7, chars as u64);
    w.put_unsigned(8, bytes.len() as u64);
    w.put_bytes(bytes);
    build_message(w)
}

/// Decodes a 1005 or 1006 frame into `arp`.
/// `arp` is left untouched when decoding fails.
pub fn read_1005(frame: &[u8], arp: &mut StationArp) -> Result<(), Error> {
    let frame = Frame::from_bytes(frame)?;
    let mut r = BitReader::new(frame.payload());

    let msg = r.get_unsigned(12)? as u16;
    if msg != 1005 && msg != 1006 {
        return Err(Error::UnexpectedMessage {
            expected: 1005,
            found: msg,
        });
    }

    let mut decoded = StationArp {
        station_id: r.get_unsigned(12)? as u16,
        itrf_year: r.get_unsigned(6)? as u8,
        gps: r.get_bool()?,
        glonass: r.get_bool()?,
        galileo: r.get_bool()?,
        non_physical: r.get_bool()?,
        x_m: r.get_scaled_real(38, 0.0001)?,
        ..Default::default()
    };

    decoded.single_oscillator = r.get_bool()?;
    r.skip(1)?;
    decoded.y_m = r.get_scaled_real(38, 0.0001)?;
    decoded.quarter_cycle = r.get_unsigned(2)? as u8;
    decoded.z_m = r.get_scaled_real(38, 0.0001)?;

    if msg == 1006 {
        decoded.antenna_height_m = r.get_scaled_unsigned(16, 0.0001)?;
    }

    *arp = decoded;
    Ok(())
}
