//! Legacy RTK observation messages: 1001 to 1004 (GPS)
//! and 1009 to 1012 (GLONASS).
use gnss::prelude::Constellation;

use crate::{
    rtcm::{
        Error,
        bits::BitWriter,
        check_glonass_channel,
        ephemeris::{ConstellationTime, Ephemerides},
        fields::{
            PRUNIT_GLO, PRUNIT_GPS, cp_pr, legacy_cnr, put_signed_or_invalid,
            smoothing_interval_code,
        },
        frame::{Frame, build_message},
        lock::{LockTimeTable, lock_time_indicator},
        observation::{Observation, ObservationSettings, Observations, Signal, select},
    },
    utils::glonass_day_time_ms,
};

/// Content of a legacy observation message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RtkContent {
    /// L1-only observables (1001, 1009)
    L1,
    /// Extended L1-only observables (1002, 1010)
    ExtendedL1,
    /// L1 and L2 observables (1003, 1011)
    L1L2,
    /// Extended L1 and L2 observables (1004, 1012)
    ExtendedL1L2,
}

impl RtkContent {
    pub fn has_l2(&self) -> bool {
        matches!(self, Self::L1L2 | Self::ExtendedL1L2)
    }

    pub fn is_extended(&self) -> bool {
        matches!(self, Self::ExtendedL1 | Self::ExtendedL1L2)
    }

    /// Message number for this [Constellation]
    pub fn message_number(&self, constellation: Constellation) -> Result<u16, Error> {
        let offset = match self {
            Self::L1 => 1,
            Self::ExtendedL1 => 2,
            Self::L1L2 => 3,
            Self::ExtendedL1L2 => 4,
        };
        match constellation {
            Constellation::GPS => Ok(1000 + offset),
            Constellation::Glonass => Ok(1008 + offset),
            other => Err(Error::UnsupportedConstellation(other)),
        }
    }
}

/// Per constellation layout of the satellite block
struct Layout {
    l1: Signal,
    l2: Signal,
    prunit: f64,
    /// DF011 / DF041
    pr_bits: usize,
    /// DF014 / DF044
    amb_bits: usize,
}

const GPS_LAYOUT: Layout = Layout {
    l1: Signal::GpsL1CA,
    l2: Signal::GpsL2C,
    prunit: PRUNIT_GPS,
    pr_bits: 24,
    amb_bits: 8,
};

const GLONASS_LAYOUT: Layout = Layout {
    l1: Signal::GlonassL1CA,
    l2: Signal::GlonassL2CA,
    prunit: PRUNIT_GLO,
    pr_bits: 25,
    amb_bits: 7,
};

/// Builds one of 1001-1004 (GPS) or 1009-1012 (GLONASS).
///
/// Every satellite tracked on L1 is reported, sorted by ascending PRN.
/// Missing measurements are flagged with the invalid sentinel of their
/// Data Field. GPS requires the LNAV ephemeris (time reference),
/// GLONASS requires the GLONASS ephemeris.
pub fn build_rtk_observables(
    lock: &mut LockTimeTable,
    content: RtkContent,
    constellation: Constellation,
    ephemerides: &Ephemerides,
    obs_time: f64,
    observations: &Observations,
    settings: &ObservationSettings,
) -> Result<Frame, Error> {
    let msg = content.message_number(constellation)?;
    settings.validate()?;

    let layout = if constellation == Constellation::Glonass {
        &GLONASS_LAYOUT
    } else {
        &GPS_LAYOUT
    };

    let l1 = select(observations, |obs| {
        obs.sv.constellation == constellation && obs.signal == layout.l1
    });

    let l2 = if content.has_l2() {
        select(observations, |obs| {
            obs.sv.constellation == constellation && obs.signal == layout.l2
        })
    } else {
        Vec::new()
    };

    if l1.is_empty() {
        return Err(Error::NoSatellites);
    }
    if l1.len() > 31 {
        return Err(Error::FieldOverflow {
            field: "satellite count",
            value: l1.len() as i64,
            bits: 5,
        });
    }

    let mut w = BitWriter::with_capacity(64 + l1.len() * 125);
    w.put_unsigned(12, msg as u64);
    w.put_unsigned(12, settings.station_id as u64);

    if constellation == Constellation::Glonass {
        let eph = ephemerides.glonass.ok_or(Error::MissingEphemeris("GLONASS"))?;
        let (_, tod_ms) = glonass_day_time_ms(eph.observation_epoch(obs_time));
        w.put_unsigned(27, tod_ms as u64);
    } else {
        w.put_unsigned(30, gps_tow_ms(obs_time));
    }

    w.put_bool(settings.more_messages);
    w.put_unsigned(5, l1.len() as u64);
    w.put_bool(settings.divergence_free);
    w.put_unsigned(3, smoothing_interval_code(settings.smoothing_interval_s) as u64);

    for obs in l1 {
        let l2 = l2.iter().find(|l2| l2.sv == obs.sv).copied();

        if constellation == Constellation::Glonass {
            let eph = ephemerides.glonass.ok_or(Error::MissingEphemeris("GLONASS"))?;
            let k = glonass_channel(obs, ephemerides)?;

            let l1_lock = lock.lock_time(eph, obs_time, obs);
            let l2_lock = l2.map(|l2| lock.lock_time(eph, obs_time, l2));

            write_satellite(&mut w, layout, content, obs, l2, k, l1_lock, l2_lock);
        } else {
            let eph = ephemerides.gps.ok_or(Error::MissingEphemeris("GPS"))?;
            let l1_lock = lock.lock_time(eph, obs_time, obs);
            let l2_lock = match (l2, ephemerides.gps_cnav) {
                (Some(l2), Some(cnav)) => Some(lock.lock_time(cnav, obs_time, l2)),
                (Some(l2), None) => Some(lock.lock_time(eph, obs_time, l2)),
                (None, _) => None,
            };

            write_satellite(&mut w, layout, content, obs, l2, 0, l1_lock, l2_lock);
        }
    }

    build_message(w)
}

/// GPS epoch time (DF004): milliseconds of week
pub(crate) fn gps_tow_ms(obs_time: f64) -> u64 {
    ((obs_time * 1000.0).round() as i64).rem_euclid(604_800_000) as u64
}

/// GLONASS frequency channel of this satellite: from the tracking
/// channel, or from the ephemeris broadcast by the same slot.
pub(crate) fn glonass_channel(obs: &Observation, ephemerides: &Ephemerides) -> Result<i8, Error> {
    if let Some(k) = obs.glonass_channel {
        return check_glonass_channel(k);
    }
    match ephemerides.glonass {
        Some(eph) if eph.slot == obs.sv.prn => check_glonass_channel(eph.frequency_channel),
        _ => Err(Error::EphemerisMismatch),
    }
}

#[allow(clippy::too_many_arguments)]
fn write_satellite(
    w: &mut BitWriter,
    layout: &Layout,
    content: RtkContent,
    l1: &Observation,
    l2: Option<&Observation>,
    k: i8,
    l1_lock: u32,
    l2_lock: Option<u32>,
) {
    let glonass = l1.sv.constellation == Constellation::Glonass;
    let lambda1 = l1.signal.wavelength_m(k);

    // L1 pseudo range, split into ambiguity and modulo part
    let (amb, pr1) = if l1.valid_pseudorange && l1.pseudorange_m > 0.0 {
        let amb = (l1.pseudorange_m / layout.prunit).floor();
        let pr1 = ((l1.pseudorange_m - amb * layout.prunit) / 0.02).round();
        (amb as u64, Some(pr1 as u64))
    } else {
        (0, None)
    };

    // pseudo range as received by the decoder
    let pr1c = pr1.map(|pr1| pr1 as f64 * 0.02 + amb as f64 * layout.prunit);

    let ppr1 = match pr1c {
        Some(pr1c) if l1.valid_phase => {
            let ppr = cp_pr(l1.carrier_phase_cycles, pr1c / lambda1);
            Some((ppr * lambda1 / 0.0005).round() as i64)
        },
        _ => None,
    };

    w.put_unsigned(6, l1.sv.prn as u64);
    w.put_unsigned(1, 0); // C/A code
    if glonass {
        w.put_unsigned(5, (k + 7) as u64);
    }
    w.put_unsigned(layout.pr_bits, pr1.unwrap_or(0));
    put_signed_or_invalid(w, 20, ppr1);
    w.put_unsigned(7, lock_time_indicator(l1_lock) as u64);

    if content.is_extended() {
        w.put_unsigned(layout.amb_bits, amb);
        w.put_unsigned(8, legacy_cnr(l1.cn0_dbhz));
    }

    if !content.has_l2() {
        return;
    }

    let (pr21, ppr2) = match (l2, pr1c) {
        (Some(l2), Some(pr1c)) => {
            let lambda2 = l2.signal.wavelength_m(k);
            let pr21 = if l2.valid_pseudorange && (l2.pseudorange_m - pr1c).abs() <= 163.82 {
                Some(((l2.pseudorange_m - pr1c) / 0.02).round() as i64)
            } else {
                None
            };
            let ppr2 = if l2.valid_phase {
                let ppr = cp_pr(l2.carrier_phase_cycles, pr1c / lambda2);
                Some((ppr * lambda2 / 0.0005).round() as i64)
            } else {
                None
            };
            (pr21, ppr2)
        },
        _ => (None, None),
    };

    w.put_unsigned(2, 0); // C/A or L2C code
    put_signed_or_invalid(w, 14, pr21);
    put_signed_or_invalid(w, 20, ppr2);
    w.put_unsigned(7, lock_time_indicator(l2_lock.unwrap_or(0)) as u64);

    if content.is_extended() {
        w.put_unsigned(8, l2.map(|l2| legacy_cnr(l2.cn0_dbhz)).unwrap_or(0));
    }
}
