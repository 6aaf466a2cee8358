//! Multiple Signal Messages (MSM1 to MSM7) for GPS, GLONASS and Galileo.
//!
//! One message describes one constellation. Satellites and signals present
//! are flagged in the satellite and signal masks, the cell mask then tells
//! which satellite/signal pairs were actually observed. Satellite data and
//! signal (cell) data follow, each field written for all satellites (cells)
//! before the next field starts.
use itertools::Itertools;

use gnss::prelude::Constellation;

use crate::{
    rtcm::{
        Error,
        bits::BitWriter,
        check_glonass_channel,
        ephemeris::{ConstellationTime, Ephemerides},
        fields::{
            RANGE_MS, cp_pr, msm_cnr, msm_cnr_hr, put_signed_or_invalid, smoothing_interval_code,
        },
        frame::{Frame, build_message},
        legacy::gps_tow_ms,
        lock::{LockTimeTable, msm_extended_lock_time_indicator, msm_lock_time_indicator},
        observation::{
            MSM_CONSTELLATIONS, Observation, ObservationSettings, Observations, Signal, select,
        },
    },
    utils::{glonass_day_time_ms, msm_base_number},
};

/// Largest cell mask (DF396)
const MAX_CELLS: usize = 64;

/// MSM flavours
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MsmKind {
    /// Compact pseudo ranges
    Msm1,
    /// Compact phase ranges
    Msm2,
    /// Compact pseudo ranges and phase ranges
    Msm3,
    /// Full pseudo ranges and phase ranges, plus CNR
    Msm4,
    /// MSM4 plus phase range rates
    Msm5,
    /// Full pseudo ranges and phase ranges, plus CNR, high resolution
    Msm6,
    /// MSM6 plus phase range rates
    Msm7,
}

impl MsmKind {
    pub fn number(&self) -> u16 {
        *self as u16 + 1
    }

    /// Message number of this kind for this [Constellation]
    pub fn message_number(&self, constellation: Constellation) -> Result<u16, Error> {
        msm_base_number(constellation)
            .map(|base| base + self.number())
            .ok_or(Error::UnsupportedConstellation(constellation))
    }

    fn has_pseudorange(&self) -> bool {
        *self != Self::Msm2
    }

    fn has_phase(&self) -> bool {
        *self != Self::Msm1
    }

    /// Integer milliseconds in satellite data
    fn has_full_range(&self) -> bool {
        *self >= Self::Msm4
    }

    fn has_cnr(&self) -> bool {
        *self >= Self::Msm4
    }

    fn has_rates(&self) -> bool {
        matches!(self, Self::Msm5 | Self::Msm7)
    }

    fn high_resolution(&self) -> bool {
        *self >= Self::Msm6
    }
}

/// Satellite data of one satellite
#[derive(Debug, Default)]
struct SatelliteData {
    /// Rough range, in 1/1024 ms
    rough_range: Option<u64>,
    /// Extended satellite information
    info: u8,
    /// Rough phase range rate (m/s)
    rough_rate: Option<i64>,
}

impl SatelliteData {
    fn rough_range_m(&self) -> Option<f64> {
        self.rough_range
            .map(|units| units as f64 / 1024.0 * RANGE_MS)
    }
}

/// Signal data of one cell, relative to the satellite data
#[derive(Debug, Default)]
struct CellData {
    /// Fine pseudo range (ms)
    pseudorange_ms: Option<f64>,
    /// Fine phase range (ms)
    phase_ms: Option<f64>,
    lock_s: u32,
    cn0_dbhz: f64,
    /// Fine phase range rate (m/s)
    rate_m_s: Option<f64>,
}

fn lock_time(
    lock: &mut LockTimeTable,
    ephemerides: &Ephemerides,
    obs_time: f64,
    obs: &Observation,
) -> Result<u32, Error> {
    let clock: &dyn ConstellationTime = match obs.sv.constellation {
        Constellation::Glonass => ephemerides
            .glonass
            .ok_or(Error::MissingEphemeris("GLONASS"))?,
        Constellation::Galileo => ephemerides
            .galileo
            .ok_or(Error::MissingEphemeris("Galileo"))?,
        _ => match (obs.signal, ephemerides.gps_cnav) {
            (Signal::GpsL2C | Signal::GpsL5, Some(cnav)) => cnav,
            _ => ephemerides.gps.ok_or(Error::MissingEphemeris("GPS"))?,
        },
    };
    Ok(lock.lock_time(clock, obs_time, obs))
}

/// GLONASS frequency channel of this satellite, if known
fn glonass_channel(obs: &[&Observation], ephemerides: &Ephemerides) -> Option<i8> {
    obs.iter().find_map(|obs| obs.glonass_channel).or_else(|| {
        let prn = obs.first()?.sv.prn;
        ephemerides
            .glonass
            .filter(|eph| eph.slot == prn)
            .map(|eph| eph.frequency_channel)
    })
}

fn satellite_data(
    constellation: Constellation,
    cells: &[&Observation],
    k: Option<i8>,
) -> SatelliteData {
    let info = match constellation {
        Constellation::Glonass => k.map(|k| (k + 7) as u8).unwrap_or(15),
        _ => 0,
    };

    let reference = cells
        .iter()
        .find(|obs| obs.valid_pseudorange && obs.pseudorange_m > 0.0);

    let Some(reference) = reference else {
        return SatelliteData {
            info,
            ..Default::default()
        };
    };

    let units = (reference.pseudorange_m / RANGE_MS * 1024.0).round() as u64;
    let rough_range = if units >> 10 < 255 { Some(units) } else { None };

    let rough_rate = match (constellation, k) {
        (Constellation::Glonass, None) => None,
        _ => {
            let lambda = reference.signal.wavelength_m(k.unwrap_or(0));
            let rate = (-reference.doppler_hz * lambda).round() as i64;
            if rate.abs() < 8192 { Some(rate) } else { None }
        },
    };

    SatelliteData {
        rough_range,
        info,
        rough_rate,
    }
}

fn cell_data(
    obs: &Observation,
    satellite: &SatelliteData,
    k: Option<i8>,
    lock_s: u32,
) -> CellData {
    let mut cell = CellData {
        lock_s,
        cn0_dbhz: obs.cn0_dbhz,
        ..Default::default()
    };

    let Some(rough_m) = satellite.rough_range_m() else {
        return cell;
    };

    if obs.valid_pseudorange && obs.pseudorange_m > 0.0 {
        cell.pseudorange_ms = Some((obs.pseudorange_m - rough_m) / RANGE_MS);
    }

    let lambda = match (obs.sv.constellation, k) {
        (Constellation::Glonass, None) => return cell,
        _ => obs.signal.wavelength_m(k.unwrap_or(0)),
    };

    if obs.valid_phase {
        let cycles = cp_pr(obs.carrier_phase_cycles, rough_m / lambda);
        cell.phase_ms = Some(cycles * lambda / RANGE_MS);
    }

    if let Some(rough_rate) = satellite.rough_rate {
        cell.rate_m_s = Some(-obs.doppler_hz * lambda - rough_rate as f64);
    }

    cell
}

/// Scales a fine measurement to its Data Field resolution
fn fine(value: Option<f64>, resolution: f64) -> Option<i64> {
    value.map(|value| (value / resolution).round() as i64)
}

/// Builds an MSM of the requested kind for one constellation.
/// Observations of other constellations are ignored.
pub fn build_msm(
    lock: &mut LockTimeTable,
    kind: MsmKind,
    constellation: Constellation,
    ephemerides: &Ephemerides,
    obs_time: f64,
    observations: &Observations,
    settings: &ObservationSettings,
) -> Result<Frame, Error> {
    let msg = kind.message_number(constellation)?;
    settings.validate()?;

    let selected = select(observations, |obs| {
        obs.sv.constellation == constellation && obs.signal.constellation() == constellation
    });

    if selected.is_empty() {
        return Err(Error::NoSatellites);
    }

    if let Some(obs) = selected.iter().find(|obs| obs.sv.prn == 0 || obs.sv.prn > 64) {
        return Err(Error::FieldOverflow {
            field: "satellite mask",
            value: obs.sv.prn as i64,
            bits: 64,
        });
    }

    let satellites: Vec<u8> = selected.iter().map(|obs| obs.sv.prn).dedup().collect();
    let signals: Vec<u8> = selected
        .iter()
        .map(|obs| obs.signal.msm_signal_id())
        .sorted()
        .dedup()
        .collect();

    let ncell = satellites.len() * signals.len();
    if ncell > MAX_CELLS {
        return Err(Error::TooManyCells(ncell));
    }

    let mut w = BitWriter::with_capacity(169 + ncell * 80);
    w.put_unsigned(12, msg as u64);
    w.put_unsigned(12, settings.station_id as u64);

    if constellation == Constellation::Glonass {
        let eph = ephemerides.glonass.ok_or(Error::MissingEphemeris("GLONASS"))?;
        let (dow, tod_ms) = glonass_day_time_ms(eph.observation_epoch(obs_time));
        w.put_unsigned(3, dow as u64);
        w.put_unsigned(27, tod_ms as u64);
    } else {
        w.put_unsigned(30, gps_tow_ms(obs_time));
    }

    w.put_bool(settings.more_messages);
    w.put_unsigned(3, 0); // IODS
    w.put_unsigned(7, 0); // reserved
    w.put_unsigned(2, settings.clock_steering as u64);
    w.put_unsigned(2, settings.external_clock as u64);
    w.put_bool(settings.divergence_free);
    w.put_unsigned(3, smoothing_interval_code(settings.smoothing_interval_s) as u64);

    let satellite_mask = satellites
        .iter()
        .fold(0u64, |mask, prn| mask | (1u64 << (64 - *prn as u32)));
    let signal_mask = signals
        .iter()
        .fold(0u64, |mask, id| mask | (1u64 << (32 - *id as u32)));

    w.put_unsigned(64, satellite_mask);
    w.put_unsigned(32, signal_mask);

    let mut sat_data = Vec::with_capacity(satellites.len());
    let mut cells = Vec::with_capacity(ncell);

    for prn in satellites.iter() {
        let observed: Vec<&Observation> = selected
            .iter()
            .filter(|obs| obs.sv.prn == *prn)
            .copied()
            .collect();

        let k = match constellation {
            Constellation::Glonass => glonass_channel(&observed, ephemerides)
                .map(check_glonass_channel)
                .transpose()?,
            _ => None,
        };
        let data = satellite_data(constellation, &observed, k);

        for id in signals.iter() {
            match observed.iter().find(|obs| obs.signal.msm_signal_id() == *id) {
                Some(obs) => {
                    let lock_s = lock_time(lock, ephemerides, obs_time, obs)?;
                    w.put_bool(true);
                    cells.push(cell_data(obs, &data, k, lock_s));
                },
                None => w.put_bool(false),
            }
        }

        sat_data.push(data);
    }

    write_satellite_data(&mut w, kind, &sat_data);
    write_signal_data(&mut w, kind, &cells);

    build_message(w)
}

fn write_satellite_data(w: &mut BitWriter, kind: MsmKind, satellites: &[SatelliteData]) {
    if kind.has_full_range() {
        for sat in satellites.iter() {
            w.put_unsigned(8, sat.rough_range.map(|units| units >> 10).unwrap_or(255));
        }
    }
    if kind.has_rates() {
        for sat in satellites.iter() {
            w.put_unsigned(4, sat.info as u64);
        }
    }
    for sat in satellites.iter() {
        w.put_unsigned(10, sat.rough_range.map(|units| units & 0x3FF).unwrap_or(0));
    }
    if kind.has_rates() {
        for sat in satellites.iter() {
            put_signed_or_invalid(w, 14, sat.rough_rate);
        }
    }
}

fn write_signal_data(w: &mut BitWriter, kind: MsmKind, cells: &[CellData]) {
    let (pr_bits, pr_res, cp_bits, cp_res) = if kind.high_resolution() {
        (20, 2.0_f64.powi(-29), 24, 2.0_f64.powi(-31))
    } else {
        (15, 2.0_f64.powi(-24), 22, 2.0_f64.powi(-29))
    };

    if kind.has_pseudorange() {
        for cell in cells.iter() {
            put_signed_or_invalid(w, pr_bits, fine(cell.pseudorange_ms, pr_res));
        }
    }

    if kind.has_phase() {
        for cell in cells.iter() {
            put_signed_or_invalid(w, cp_bits, fine(cell.phase_ms, cp_res));
        }
        for cell in cells.iter() {
            if kind.high_resolution() {
                w.put_unsigned(10, msm_extended_lock_time_indicator(cell.lock_s) as u64);
            } else {
                w.put_unsigned(4, msm_lock_time_indicator(cell.lock_s) as u64);
            }
        }
        for _ in cells.iter() {
            w.put_bool(false); // half cycle ambiguity
        }
    }

    if kind.has_cnr() {
        for cell in cells.iter() {
            if kind.high_resolution() {
                w.put_unsigned(10, msm_cnr_hr(cell.cn0_dbhz));
            } else {
                w.put_unsigned(6, msm_cnr(cell.cn0_dbhz));
            }
        }
    }

    if kind.has_rates() {
        for cell in cells.iter() {
            put_signed_or_invalid(w, 15, fine(cell.rate_m_s, 0.0001));
        }
    }
}

/// Builds one MSM per constellation present in `observations`,
/// in GPS, GLONASS, Galileo order. The multiple message bit is set
/// on every message but the last one of the epoch.
pub fn build_msm_epoch(
    lock: &mut LockTimeTable,
    kind: MsmKind,
    ephemerides: &Ephemerides,
    obs_time: f64,
    observations: &Observations,
    settings: &ObservationSettings,
) -> Result<Vec<Frame>, Error> {
    let present: Vec<Constellation> = MSM_CONSTELLATIONS
        .into_iter()
        .filter(|constellation| {
            observations.values().any(|obs| {
                obs.sv.constellation == *constellation
                    && obs.signal.constellation() == *constellation
            })
        })
        .collect();

    if present.is_empty() {
        return Err(Error::NoSatellites);
    }

    let last = present.len() - 1;

    present
        .iter()
        .enumerate()
        .map(|(i, constellation)| {
            let settings = ObservationSettings {
                more_messages: i < last,
                ..*settings
            };
            build_msm(
                lock,
                kind,
                *constellation,
                ephemerides,
                obs_time,
                observations,
                &settings,
            )
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rtcm::{
        bits::BitReader,
        ephemeris::{GalileoEphemeris, GlonassEphemeris, GpsEphemeris},
    };
    use gnss::prelude::SV;
    use rtcm_rs::{Message, MessageFrame};

    fn gps_observation(prn: u8, pr: f64) -> Observation {
        let signal = Signal::GpsL1CA;
        Observation::new(SV::new(Constellation::GPS, prn), signal)
            .with_pseudorange(pr)
            .with_carrier_phase(pr / signal.wavelength_m(0) + 2.5)
            .with_doppler(-1000.0)
            .with_cn0(45.0)
    }

    fn epoch() -> Observations {
        let mut observations = Observations::new();
        observations.insert(7, gps_observation(21, 22_000_000.0));
        observations.insert(3, gps_observation(5, 21_000_000.0));
        observations.insert(9, gps_observation(2, 23_000_000.0));
        observations
    }

    fn gps_eph() -> GpsEphemeris {
        GpsEphemeris {
            week: 2300,
            ..Default::default()
        }
    }

    #[test]
    fn message_numbers() {
        assert_eq!(MsmKind::Msm4.message_number(Constellation::GPS), Ok(1074));
        assert_eq!(MsmKind::Msm7.message_number(Constellation::Glonass), Ok(1087));
        assert_eq!(MsmKind::Msm1.message_number(Constellation::Galileo), Ok(1091));
        assert_eq!(
            MsmKind::Msm4.message_number(Constellation::BeiDou),
            Err(Error::UnsupportedConstellation(Constellation::BeiDou))
        );
    }

    #[test]
    fn msm4_satellites_sorted_by_prn() {
        let eph = gps_eph();
        let ephemerides = Ephemerides {
            gps: Some(&eph),
            ..Default::default()
        };
        let settings = ObservationSettings {
            station_id: 7,
            ..Default::default()
        };

        let frame = build_msm(
            &mut LockTimeTable::new(),
            MsmKind::Msm4,
            Constellation::GPS,
            &ephemerides,
            100.0,
            &epoch(),
            &settings,
        )
        .unwrap();

        assert_eq!(frame.message_number(), 1074);
        assert_eq!(frame.payload_len(), 370usize.div_ceil(8));

        let mut r = BitReader::new(frame.payload());
        r.skip(12).unwrap();
        assert_eq!(r.get_unsigned(12).unwrap(), 7);
        assert_eq!(r.get_unsigned(30).unwrap(), 100_000);
        assert!(!r.get_bool().unwrap());
        r.skip(3 + 7 + 2 + 2 + 1 + 3).unwrap();

        let satellite_mask = r.get_unsigned(64).unwrap();
        assert_eq!(
            satellite_mask,
            (1u64 << 62) | (1u64 << 59) | (1u64 << 43)
        );
        assert_eq!(r.get_unsigned(32).unwrap(), 1u64 << 30);
        assert_eq!(r.get_unsigned(3).unwrap(), 0b111);

        // rough ranges, integer ms, in ascending PRN order
        assert_eq!(r.get_unsigned(8).unwrap(), 76);
        assert_eq!(r.get_unsigned(8).unwrap(), 70);
        assert_eq!(r.get_unsigned(8).unwrap(), 73);
        r.skip(3 * 10).unwrap();

        // fine pseudo ranges are within the rough range resolution
        for _ in 0..3 {
            let fine = r.get_signed(15).unwrap();
            assert!(fine.abs() <= 8192, "fine pseudo range {}", fine);
        }
        // phase ranges
        for _ in 0..3 {
            assert_ne!(r.get_signed(22).unwrap(), -(1 << 21));
        }
        // first epoch: no lock time yet
        for _ in 0..3 {
            assert_eq!(r.get_unsigned(4).unwrap(), 0);
        }
        r.skip(3).unwrap();
        for _ in 0..3 {
            assert_eq!(r.get_unsigned(6).unwrap(), 45);
        }
    }

    #[test]
    fn msm7_rates() {
        let eph = gps_eph();
        let ephemerides = Ephemerides {
            gps: Some(&eph),
            ..Default::default()
        };
        let mut observations = Observations::new();
        observations.insert(0, gps_observation(1, 20_000_000.0));

        let frame = build_msm(
            &mut LockTimeTable::new(),
            MsmKind::Msm7,
            Constellation::GPS,
            &ephemerides,
            0.0,
            &observations,
            &ObservationSettings::default(),
        )
        .unwrap();

        // header, 1 satellite (8+4+10+14), 1 cell (20+24+10+1+10+15)
        assert_eq!(frame.payload_len(), (169 + 1 + 36 + 80usize).div_ceil(8));

        let mut r = BitReader::new(frame.payload());
        r.skip(169 + 1 + 8 + 4 + 10).unwrap();

        // -1000 Hz of doppler on L1 is about 190 m/s
        let rough_rate = r.get_signed(14).unwrap();
        assert_eq!(rough_rate, 190);
        r.skip(20 + 24 + 10 + 1).unwrap();
        assert_eq!(r.get_unsigned(10).unwrap(), 720);
        let fine_rate = r.get_signed(15).unwrap() as f64 * 0.0001;
        let expected = 1000.0 * Signal::GpsL1CA.wavelength_m(0) - rough_rate as f64;
        assert!((fine_rate - expected).abs() < 0.0001);
    }

    #[test]
    fn invalid_pseudorange() {
        let eph = gps_eph();
        let ephemerides = Ephemerides {
            gps: Some(&eph),
            ..Default::default()
        };
        let mut observations = Observations::new();
        observations.insert(
            0,
            Observation::new(SV::new(Constellation::GPS, 1), Signal::GpsL1CA).with_cn0(30.0),
        );

        let frame = build_msm(
            &mut LockTimeTable::new(),
            MsmKind::Msm4,
            Constellation::GPS,
            &ephemerides,
            0.0,
            &observations,
            &ObservationSettings::default(),
        )
        .unwrap();

        let mut r = BitReader::new(frame.payload());
        r.skip(169 + 1).unwrap();
        assert_eq!(r.get_unsigned(8).unwrap(), 255);
        r.skip(10).unwrap();
        assert_eq!(r.get_signed(15).unwrap(), -(1 << 14));
        assert_eq!(r.get_signed(22).unwrap(), -(1 << 21));
    }

    #[test]
    fn too_many_cells() {
        let eph = gps_eph();
        let ephemerides = Ephemerides {
            gps: Some(&eph),
            ..Default::default()
        };
        let mut observations = Observations::new();
        let mut channel = 0;
        for prn in 1..=22 {
            for signal in [Signal::GpsL1CA, Signal::GpsL2C, Signal::GpsL5] {
                let sv = SV::new(Constellation::GPS, prn);
                observations.insert(channel, Observation::new(sv, signal));
                channel += 1;
            }
        }
        assert_eq!(
            build_msm(
                &mut LockTimeTable::new(),
                MsmKind::Msm4,
                Constellation::GPS,
                &ephemerides,
                0.0,
                &observations,
                &ObservationSettings::default(),
            ),
            Err(Error::TooManyCells(66))
        );
    }

    #[test]
    fn glonass_needs_ephemeris() {
        let mut observations = Observations::new();
        let sv = SV::new(Constellation::Glonass, 4);
        observations.insert(0, Observation::new(sv, Signal::GlonassL1CA));

        assert_eq!(
            build_msm(
                &mut LockTimeTable::new(),
                MsmKind::Msm4,
                Constellation::Glonass,
                &Ephemerides::default(),
                0.0,
                &observations,
                &ObservationSettings::default(),
            ),
            Err(Error::MissingEphemeris("GLONASS"))
        );

        let eph = GlonassEphemeris {
            slot: 4,
            frequency_channel: 6,
            n4: 8,
            nt: 10,
            ..Default::default()
        };
        let ephemerides = Ephemerides {
            glonass: Some(&eph),
            ..Default::default()
        };
        let frame = build_msm(
            &mut LockTimeTable::new(),
            MsmKind::Msm5,
            Constellation::Glonass,
            &ephemerides,
            0.0,
            &observations,
            &ObservationSettings::default(),
        )
        .unwrap();
        assert_eq!(frame.message_number(), 1085);

        let mut r = BitReader::new(frame.payload());
        r.skip(169 + 1 + 8).unwrap();
        // frequency channel + 7
        assert_eq!(r.get_unsigned(4).unwrap(), 13);
    }

    #[test]
    fn epoch_sets_multiple_message_bit() {
        let gps = gps_eph();
        let galileo = GalileoEphemeris {
            week: 1250,
            ..Default::default()
        };
        let ephemerides = Ephemerides {
            gps: Some(&gps),
            galileo: Some(&galileo),
            ..Default::default()
        };

        let mut observations = epoch();
        observations.insert(
            20,
            Observation::new(SV::new(Constellation::Galileo, 11), Signal::GalileoE1)
                .with_pseudorange(25_000_000.0),
        );

        let frames = build_msm_epoch(
            &mut LockTimeTable::new(),
            MsmKind::Msm7,
            &ephemerides,
            10.0,
            &observations,
            &ObservationSettings::default(),
        )
        .unwrap();

        let numbers: Vec<u16> = frames.iter().map(|frame| frame.message_number()).collect();
        assert_eq!(numbers, vec![1077, 1097]);

        let more: Vec<bool> = frames
            .iter()
            .map(|frame| {
                let mut r = BitReader::new(frame.payload());
                r.skip(54).unwrap();
                r.get_bool().unwrap()
            })
            .collect();
        assert_eq!(more, vec![true, false]);

        assert_eq!(
            build_msm_epoch(
                &mut LockTimeTable::new(),
                MsmKind::Msm7,
                &ephemerides,
                10.0,
                &Observations::new(),
                &ObservationSettings::default(),
            ),
            Err(Error::NoSatellites)
        );
    }

    #[test]
    fn glonass_channel_out_of_range() {
        let eph = GlonassEphemeris {
            slot: 4,
            frequency_channel: 1,
            n4: 8,
            nt: 10,
            ..Default::default()
        };
        let ephemerides = Ephemerides {
            glonass: Some(&eph),
            ..Default::default()
        };
        let sv = SV::new(Constellation::Glonass, 4);

        for k in [-8, 7, 121, 125] {
            let mut observations = Observations::new();
            observations.insert(
                0,
                Observation::new(sv, Signal::GlonassL1CA)
                    .with_pseudorange(20_000_000.0)
                    .with_glonass_channel(k),
            );
            assert_eq!(
                build_msm(
                    &mut LockTimeTable::new(),
                    MsmKind::Msm5,
                    Constellation::Glonass,
                    &ephemerides,
                    0.0,
                    &observations,
                    &ObservationSettings::default(),
                ),
                Err(Error::FieldOverflow {
                    field: "GLONASS frequency channel",
                    value: k as i64,
                    bits: 5,
                })
            );
        }

        let eph = GlonassEphemeris {
            frequency_channel: 7,
            ..eph
        };
        let ephemerides = Ephemerides {
            glonass: Some(&eph),
            ..Default::default()
        };
        let mut observations = Observations::new();
        observations.insert(0, Observation::new(sv, Signal::GlonassL1CA));
        assert!(matches!(
            build_msm(
                &mut LockTimeTable::new(),
                MsmKind::Msm7,
                Constellation::Glonass,
                &ephemerides,
                0.0,
                &observations,
                &ObservationSettings::default(),
            ),
            Err(Error::FieldOverflow { value: 7, .. })
        ));
    }

    #[test]
    fn decoded_by_rtcm_rs() {
        let eph = gps_eph();
        let ephemerides = Ephemerides {
            gps: Some(&eph),
            ..Default::default()
        };
        let settings = ObservationSettings {
            station_id: 7,
            ..Default::default()
        };

        let frame = build_msm(
            &mut LockTimeTable::new(),
            MsmKind::Msm4,
            Constellation::GPS,
            &ephemerides,
            100.0,
            &epoch(),
            &settings,
        )
        .unwrap();

        let Message::Msg1074(msg) = MessageFrame::new(frame.as_bytes()).unwrap().get_message()
        else {
            panic!("not decoded as a 1074");
        };
        assert_eq!(msg.reference_station_id, 7);
        assert_eq!(msg.gps_epoch_time_ms, 100_000);

        let data = &msg.data_segment;
        let prns: Vec<u8> = data.satellite_data.iter().map(|sat| sat.satellite_id).collect();
        assert_eq!(prns, vec![2, 5, 21]);
        assert_eq!(data.signal_data.len(), 3);

        for ((sat, sig), expected) in data
            .satellite_data
            .iter()
            .zip(data.signal_data.iter())
            .zip([23_000_000.0, 21_000_000.0, 22_000_000.0])
        {
            assert_eq!(sig.satellite_id, sat.satellite_id);
            assert_eq!(sig.signal_id.band(), 1);
            assert_eq!(sig.signal_id.attribute(), 'C');
            assert_eq!(sig.gnss_signal_cnr_dbhz, Some(45));

            let ms = sat.gnss_satellite_rough_range_integer_ms.unwrap() as f64
                + sat.gnss_satellite_rough_range_mod1ms_ms
                + sig.gnss_signal_fine_pseudorange_ms.unwrap();
            assert!((ms * RANGE_MS - expected).abs() < 0.1, "G{:02}", sat.satellite_id);
        }

        let mut observations = Observations::new();
        observations.insert(0, gps_observation(1, 20_000_000.0));
        let frame = build_msm(
            &mut LockTimeTable::new(),
            MsmKind::Msm7,
            Constellation::GPS,
            &ephemerides,
            0.0,
            &observations,
            &ObservationSettings::default(),
        )
        .unwrap();

        let Message::Msg1077(msg) = MessageFrame::new(frame.as_bytes()).unwrap().get_message()
        else {
            panic!("not decoded as a 1077");
        };
        let sat = &msg.data_segment.satellite_data[0];
        let sig = &msg.data_segment.signal_data[0];
        assert_eq!(sat.satellite_id, 1);
        assert_eq!(sat.gnss_satellite_rough_phaserange_rates_m_s, Some(190));
        assert_eq!(sig.gnss_signal_cnr_ext_dbhz, Some(45.0));

        let rate = 190.0 + sig.gnss_signal_fine_phaserange_rate_m_s.unwrap();
        assert!((rate - 1000.0 * Signal::GpsL1CA.wavelength_m(0)).abs() < 0.0001);
    }
}
