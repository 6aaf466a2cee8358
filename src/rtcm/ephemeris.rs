//! Broadcast ephemerides, as decoded by the navigation message decoders.
//!
//! Angles are expressed in semi-circles and angular rates in semi-circles
//! per second, as broadcast. Clock terms are in seconds (s, s/s, s/s²).
use hifitime::prelude::{Duration, Epoch, TimeScale};

use gnss::prelude::Constellation;

/// Converts an observation time of week into an absolute [Epoch],
/// using the reference week carried by the ephemeris.
pub trait ConstellationTime {
    fn constellation(&self) -> Constellation;

    /// `obs_time` is the receiver time of week, in seconds
    fn observation_epoch(&self, obs_time: f64) -> Epoch;
}

fn nanoseconds(obs_time: f64) -> u64 {
    (obs_time.max(0.0) * 1.0E9).round() as u64
}

/// GPS LNAV ephemeris
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GpsEphemeris {
    pub prn: u8,
    /// Full GPS week number
    pub week: u32,
    /// SV accuracy (URA index)
    pub ura: u8,
    /// Code on L2
    pub code_on_l2: u8,
    pub idot: f64,
    pub iode: u16,
    /// Clock reference time (s)
    pub toc: u32,
    pub af2: f64,
    pub af1: f64,
    pub af0: f64,
    pub iodc: u16,
    pub crs: f64,
    pub delta_n: f64,
    pub m0: f64,
    pub cuc: f64,
    pub e: f64,
    pub cus: f64,
    pub sqrt_a: f64,
    /// Ephemeris reference time (s)
    pub toe: u32,
    pub cic: f64,
    pub omega0: f64,
    pub cis: f64,
    pub i0: f64,
    pub crc: f64,
    pub omega: f64,
    pub omega_dot: f64,
    pub tgd: f64,
    pub health: u8,
    /// L2 P data flag
    pub l2p_data_flag: bool,
    pub fit_interval: bool,
}

impl ConstellationTime for GpsEphemeris {
    fn constellation(&self) -> Constellation {
        Constellation::GPS
    }

    fn observation_epoch(&self, obs_time: f64) -> Epoch {
        Epoch::from_time_of_week(self.week, nanoseconds(obs_time), TimeScale::GPST)
    }
}

/// GPS CNAV ephemeris (L2C, L5)
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GpsCnavEphemeris {
    pub prn: u8,
    pub week: u32,
    /// Ephemeris reference time (s)
    pub toe: u32,
    /// Clock reference time (s)
    pub toc: u32,
    /// Elevation dependent accuracy index
    pub ura_ed: i8,
    pub health: bool,
}

impl ConstellationTime for GpsCnavEphemeris {
    fn constellation(&self) -> Constellation {
        Constellation::GPS
    }

    fn observation_epoch(&self, obs_time: f64) -> Epoch {
        Epoch::from_time_of_week(self.week, nanoseconds(obs_time), TimeScale::GPST)
    }
}

/// Galileo F/NAV ephemeris
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GalileoEphemeris {
    pub prn: u8,
    /// Galileo week number
    pub week: u32,
    pub iod_nav: u16,
    /// Signal in space accuracy index
    pub sisa: u8,
    pub idot: f64,
    /// Clock reference time (s)
    pub toc: u32,
    pub af2: f64,
    pub af1: f64,
    pub af0: f64,
    pub crs: f64,
    pub delta_n: f64,
    pub m0: f64,
    pub cuc: f64,
    pub e: f64,
    pub cus: f64,
    pub sqrt_a: f64,
    /// Ephemeris reference time (s)
    pub toe: u32,
    pub cic: f64,
    pub omega0: f64,
    pub cis: f64,
    pub i0: f64,
    pub crc: f64,
    pub omega: f64,
    pub omega_dot: f64,
    /// E1/E5a broadcast group delay (s)
    pub bgd_e1_e5a: f64,
    /// E5a signal health status
    pub e5a_health: u8,
    /// E5a data validity status
    pub e5a_data_validity: bool,
}

impl ConstellationTime for GalileoEphemeris {
    fn constellation(&self) -> Constellation {
        Constellation::Galileo
    }

    fn observation_epoch(&self, obs_time: f64) -> Epoch {
        Epoch::from_time_of_week(self.week, nanoseconds(obs_time), TimeScale::GST)
    }
}

/// GLONASS GNAV immediate data. Positions in km, velocities in km/s,
/// accelerations in km/s².
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GlonassEphemeris {
    /// Orbital slot
    pub slot: u8,
    /// Frequency channel number (-7..=6)
    pub frequency_channel: i8,
    /// Almanac health (Cn)
    pub almanac_health: bool,
    pub almanac_health_available: bool,
    pub p1: u8,
    /// Time of frame start, seconds of GLONASS day (multiple of 30)
    pub tk: u32,
    /// Most significant bit of Bn
    pub bn_msb: bool,
    pub p2: bool,
    /// Ephemeris reference time, seconds of GLONASS day (multiple of 900)
    pub tb: u32,
    pub x: f64,
    pub vx: f64,
    pub ax: f64,
    pub y: f64,
    pub vy: f64,
    pub ay: f64,
    pub z: f64,
    pub vz: f64,
    pub az: f64,
    pub p3: bool,
    /// Relative frequency bias
    pub gamma_n: f64,
    pub p: u8,
    /// Health flag of the third string
    pub ln3: bool,
    /// Satellite clock offset (s)
    pub tau_n: f64,
    /// L1/L2 time difference (s)
    pub delta_tau_n: f64,
    /// Age of data (days)
    pub en: u8,
    pub p4: bool,
    /// User range accuracy index
    pub ft: u8,
    /// Day number within the four year interval (1..=1461)
    pub nt: u16,
    /// Satellite type (M)
    pub m: u8,
    /// Four year interval number, starting in 1996
    pub n4: u8,
    /// Health flag of the fifth string
    pub ln5: bool,
}

impl GlonassEphemeris {
    /// Start of day NT of interval N4, in UTC
    pub fn reference_day(&self) -> Epoch {
        let year = 1996 + 4 * (self.n4.max(1) as i32 - 1);
        Epoch::from_gregorian_utc_at_midnight(year, 1, 1)
            + Duration::from_days(self.nt.max(1) as f64 - 1.0)
            - Duration::from_hours(3.0)
    }
}

impl ConstellationTime for GlonassEphemeris {
    fn constellation(&self) -> Constellation {
        Constellation::Glonass
    }

    /// GLONASS navigation data carries no week number: the GPS week is
    /// resolved from the ephemeris day, picking the candidate closest to it.
    fn observation_epoch(&self, obs_time: f64) -> Epoch {
        let day = self.reference_day();
        let (week, _) = day.to_time_scale(TimeScale::GPST).to_time_of_week();
        let half_week = Duration::from_days(3.5);

        let candidate = Epoch::from_time_of_week(week, nanoseconds(obs_time), TimeScale::GPST);

        if candidate - day > half_week {
            Epoch::from_time_of_week(week.saturating_sub(1), nanoseconds(obs_time), TimeScale::GPST)
        } else if day - candidate > half_week {
            Epoch::from_time_of_week(week + 1, nanoseconds(obs_time), TimeScale::GPST)
        } else {
            candidate
        }
    }
}

/// GLONASS time model (fifth string)
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct GlonassUtcModel {
    /// Additional data (NA, τc, N4, τGPS) is valid
    pub valid: bool,
    /// Almanac calendar day number
    pub na: u16,
    /// GLONASS to UTC(SU) correction (s)
    pub tau_c: f64,
    /// GPS to GLONASS time correction, fractional part (s)
    pub tau_gps: f64,
}

/// Ephemerides available to one message build
#[derive(Debug, Default, Copy, Clone)]
pub struct Ephemerides<'a> {
    pub gps: Option<&'a GpsEphemeris>,
    pub gps_cnav: Option<&'a GpsCnavEphemeris>,
    pub galileo: Option<&'a GalileoEphemeris>,
    pub glonass: Option<&'a GlonassEphemeris>,
}
