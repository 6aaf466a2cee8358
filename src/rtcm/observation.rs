//! Receiver observations, as produced by the tracking channels.
use std::collections::HashMap;

use itertools::Itertools;

use gnss::prelude::{Constellation, SV};

use crate::rtcm::{Error, SPEED_OF_LIGHT_M_S, check_unsigned, lock::LockBand};

/// Constellations in the order their MSM are emitted for one epoch
pub const MSM_CONSTELLATIONS: [Constellation; 3] = [
    Constellation::GPS,
    Constellation::Glonass,
    Constellation::Galileo,
];

/// Tracked signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Signal {
    /// GPS L1 C/A
    GpsL1CA,
    /// GPS L2C (M)
    GpsL2C,
    /// GPS L5 (I+Q)
    GpsL5,
    /// Galileo E1 (B+C)
    GalileoE1,
    /// Galileo E5a (I+Q)
    GalileoE5a,
    /// Galileo E5b (I+Q)
    GalileoE5b,
    /// GLONASS L1 C/A
    GlonassL1CA,
    /// GLONASS L2 C/A
    GlonassL2CA,
}

impl Signal {
    pub fn constellation(&self) -> Constellation {
        match self {
            Self::GpsL1CA | Self::GpsL2C | Self::GpsL5 => Constellation::GPS,
            Self::GalileoE1 | Self::GalileoE5a | Self::GalileoE5b => Constellation::Galileo,
            Self::GlonassL1CA | Self::GlonassL2CA => Constellation::Glonass,
        }
    }

    /// Two letter code used by the tracking channels
    pub fn code(&self) -> &'static str {
        match self {
            Self::GpsL1CA => "1C",
            Self::GpsL2C => "2S",
            Self::GpsL5 => "L5",
            Self::GalileoE1 => "1B",
            Self::GalileoE5a => "5X",
            Self::GalileoE5b => "7X",
            Self::GlonassL1CA => "1G",
            Self::GlonassL2CA => "2G",
        }
    }

    /// Identifies a signal from its [Constellation] and channel code
    pub fn from_code(constellation: Constellation, code: &str) -> Option<Self> {
        match (constellation, code) {
            (Constellation::GPS, "1C") => Some(Self::GpsL1CA),
            (Constellation::GPS, "2S") => Some(Self::GpsL2C),
            (Constellation::GPS, "L5") => Some(Self::GpsL5),
            (Constellation::Galileo, "1B") => Some(Self::GalileoE1),
            (Constellation::Galileo, "5X") => Some(Self::GalileoE5a),
            (Constellation::Galileo, "7X") => Some(Self::GalileoE5b),
            (Constellation::Glonass, "1G") => Some(Self::GlonassL1CA),
            (Constellation::Glonass, "2G") => Some(Self::GlonassL2CA),
            _ => None,
        }
    }

    /// MSM signal ID (DF395 bit position, 1 being the MSB).
    ///
    /// Galileo E1, tracked as "1B" (data), is reported as ID 2 (E1 C, pilot)
    /// and never as ID 4 (E1 B). Both components share the same carrier, so
    /// pseudo range and phase are identical at our resolution, and ID 2 is the
    /// E1 cell that RTK decoders expect.
    pub fn msm_signal_id(&self) -> u8 {
        match self {
            Self::GpsL1CA => 2,
            Self::GpsL2C => 15,
            Self::GpsL5 => 24,
            Self::GalileoE1 => 2,
            Self::GalileoE5a => 24,
            Self::GalileoE5b => 16,
            Self::GlonassL1CA => 2,
            Self::GlonassL2CA => 8,
        }
    }

    /// Lock time table this signal is tracked in
    pub fn lock_band(&self) -> LockBand {
        match self {
            Self::GpsL1CA => LockBand::GpsL1,
            Self::GpsL2C => LockBand::GpsL2,
            Self::GpsL5 => LockBand::GpsL5,
            Self::GalileoE1 => LockBand::GalileoE1,
            Self::GalileoE5a => LockBand::GalileoE5a,
            Self::GalileoE5b => LockBand::GalileoE5b,
            Self::GlonassL1CA => LockBand::GlonassL1,
            Self::GlonassL2CA => LockBand::GlonassL2,
        }
    }

    /// Carrier frequency in Hz. GLONASS FDMA signals depend
    /// on the frequency channel number `k`.
    pub fn carrier_frequency_hz(&self, k: i8) -> f64 {
        match self {
            Self::GpsL1CA | Self::GalileoE1 => 1575.42E6,
            Self::GpsL2C => 1227.60E6,
            Self::GpsL5 | Self::GalileoE5a => 1176.45E6,
            Self::GalileoE5b => 1207.14E6,
            Self::GlonassL1CA => 1602.0E6 + k as f64 * 0.5625E6,
            Self::GlonassL2CA => 1246.0E6 + k as f64 * 0.4375E6,
        }
    }

    pub fn wavelength_m(&self, k: i8) -> f64 {
        SPEED_OF_LIGHT_M_S / self.carrier_frequency_hz(k)
    }
}

/// One satellite / signal measurement of the current epoch
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    /// Tracked [SV]
    pub sv: SV,

    /// Tracked [Signal]
    pub signal: Signal,

    /// Pseudo range (m)
    pub pseudorange_m: f64,

    /// Accumulated carrier phase (cycles)
    pub carrier_phase_cycles: f64,

    /// Doppler shift (Hz)
    pub doppler_hz: f64,

    /// Carrier to noise density ratio (dB.Hz)
    pub cn0_dbhz: f64,

    pub valid_pseudorange: bool,

    pub valid_phase: bool,

    /// Channel (re)acquired lock since previous epoch
    pub fresh_lock: bool,

    /// GLONASS frequency channel number (-7..=6), when known
    pub glonass_channel: Option<i8>,
}

impl Observation {
    /// Creates an empty (invalid) [Observation]
    pub fn new(sv: SV, signal: Signal) -> Self {
        Self {
            sv,
            signal,
            pseudorange_m: 0.0,
            carrier_phase_cycles: 0.0,
            doppler_hz: 0.0,
            cn0_dbhz: 0.0,
            valid_pseudorange: false,
            valid_phase: false,
            fresh_lock: false,
            glonass_channel: None,
        }
    }

    /// Copies and defines pseudo range
    pub fn with_pseudorange(&self, pseudorange_m: f64) -> Self {
        let mut s = *self;
        s.pseudorange_m = pseudorange_m;
        s.valid_pseudorange = true;
        s
    }

    /// Copies and defines carrier phase
    pub fn with_carrier_phase(&self, cycles: f64) -> Self {
        let mut s = *self;
        s.carrier_phase_cycles = cycles;
        s.valid_phase = true;
        s
    }

    pub fn with_doppler(&self, doppler_hz: f64) -> Self {
        let mut s = *self;
        s.doppler_hz = doppler_hz;
        s
    }

    pub fn with_cn0(&self, cn0_dbhz: f64) -> Self {
        let mut s = *self;
        s.cn0_dbhz = cn0_dbhz;
        s
    }

    pub fn with_glonass_channel(&self, k: i8) -> Self {
        let mut s = *self;
        s.glonass_channel = Some(k);
        s
    }

    pub fn with_fresh_lock(&self) -> Self {
        let mut s = *self;
        s.fresh_lock = true;
        s
    }

    pub fn wavelength_m(&self) -> f64 {
        self.signal.wavelength_m(self.glonass_channel.unwrap_or(0))
    }
}

/// One epoch of observations, indexed by channel ID
pub type Observations = HashMap<i32, Observation>;

/// Selects observations of interest, one per satellite and signal,
/// sorted by ascending PRN then by signal ID. When two channels track the
/// same signal, the lowest channel ID wins.
pub(crate) fn select<F>(observations: &Observations, filter: F) -> Vec<&Observation>
where
    F: Fn(&Observation) -> bool,
{
    observations
        .iter()
        .sorted_by_key(|(channel, _)| **channel)
        .map(|(_, obs)| obs)
        .filter(|obs| filter(obs))
        .unique_by(|obs| (obs.sv, obs.signal))
        .sorted_by_key(|obs| (obs.sv.prn, obs.signal.msm_signal_id()))
        .collect()
}

/// Message flags shared by all observation messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ObservationSettings {
    /// Reference station ID (12 bits)
    pub station_id: u16,

    /// Smoothing interval (s). Negative means unlimited.
    pub smoothing_interval_s: i32,

    /// Divergence free smoothing indicator
    pub divergence_free: bool,

    /// More observation messages follow for this epoch
    pub more_messages: bool,

    /// Clock steering indicator (MSM, 2 bits)
    pub clock_steering: u8,

    /// External clock indicator (MSM, 2 bits)
    pub external_clock: u8,
}

impl ObservationSettings {
    pub(crate) fn validate(&self) -> Result<(), Error> {
        check_unsigned("station ID", self.station_id as u64, 12)?;
        check_unsigned("clock steering", self.clock_steering as u64, 2)?;
        check_unsigned("external clock", self.external_clock as u64, 2)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn signal_codes() {
        for signal in [
            Signal::GpsL1CA,
            Signal::GpsL2C,
            Signal::GpsL5,
            Signal::GalileoE1,
            Signal::GalileoE5a,
            Signal::GalileoE5b,
            Signal::GlonassL1CA,
            Signal::GlonassL2CA,
        ] {
            assert_eq!(
                Signal::from_code(signal.constellation(), signal.code()),
                Some(signal)
            );
        }
        assert_eq!(Signal::from_code(Constellation::GPS, "1B"), None);
    }

    #[test]
    fn msm_signal_ids() {
        assert_eq!(Signal::GpsL1CA.msm_signal_id(), 2);
        assert_eq!(Signal::GpsL2C.msm_signal_id(), 15);
        // E1 B data is reported on the E1 C cell
        let e1 = Signal::from_code(Constellation::Galileo, "1B").unwrap();
        assert_eq!(e1.msm_signal_id(), 2);
        assert_eq!(Signal::GalileoE5a.msm_signal_id(), 24);
    }

    #[test]
    fn glonass_fdma() {
        let l1 = Signal::GlonassL1CA;
        assert_eq!(l1.carrier_frequency_hz(0), 1602.0E6);
        assert_eq!(l1.carrier_frequency_hz(-7), 1598.0625E6);
        assert_eq!(Signal::GlonassL2CA.carrier_frequency_hz(6), 1248.625E6);
    }

    #[test]
    fn selection_is_sorted_and_unique() {
        let mut observations = Observations::new();
        for (channel, prn) in [(0, 21), (1, 5), (2, 2), (3, 5)] {
            let sv = SV::new(Constellation::GPS, prn);
            observations.insert(
                channel,
                Observation::new(sv, Signal::GpsL1CA).with_pseudorange(channel as f64),
            );
        }
        observations.insert(
            4,
            Observation::new(SV::new(Constellation::GPS, 2), Signal::GpsL2C),
        );
        observations.insert(
            5,
            Observation::new(SV::new(Constellation::Galileo, 1), Signal::GalileoE1),
        );

        let selected = select(&observations, |obs| obs.sv.constellation == Constellation::GPS);
        let keys: Vec<(u8, Signal)> = selected.iter().map(|obs| (obs.sv.prn, obs.signal)).collect();
        assert_eq!(
            keys,
            vec![
                (2, Signal::GpsL1CA),
                (2, Signal::GpsL2C),
                (5, Signal::GpsL1CA),
                (21, Signal::GpsL1CA),
            ]
        );
        // lowest channel wins
        assert_eq!(selected[2].pseudorange_m, 1.0);
    }

    #[test]
    fn settings_validation() {
        let mut settings = ObservationSettings::default();
        assert!(settings.validate().is_ok());
        settings.station_id = 4096;
        assert!(settings.validate().is_err());
        settings.station_id = 4095;
        settings.clock_steering = 4;
        assert!(settings.validate().is_err());
    }
}
