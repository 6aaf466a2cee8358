//! IGS State Space Representation messages (4076):
//! IGM01 (orbit), IGM02 (clock), IGM03 (combined orbit and clock)
//! and IGM05 (code biases).
//!
//! One call may produce several messages: satellites are grouped per
//! constellation, and a group is split when it exceeds the satellite
//! count field or the transport payload capacity.
use hifitime::prelude::{Epoch, TimeScale};

use gnss::prelude::{Constellation, SV};

use crate::{
    rtcm::{
        Error,
        bits::BitWriter,
        check_unsigned,
        frame::{Frame, MAX_PAYLOAD_LEN, build_message},
    },
    utils::{glonass_day_time_ms, igs_ssr_offset},
};

/// IGS SSR message number
pub const IGS_SSR_MESSAGE: u16 = 4076;

/// IGS SSR version (IDF001)
const IGS_SSR_VERSION: u64 = 1;

/// Largest satellite count (IDF010)
const MAX_SATELLITES: usize = 63;

/// SSR update intervals (IDF004), in seconds, indexed by code
const UPDATE_INTERVALS: [u32; 16] = [
    1, 2, 5, 10, 15, 30, 60, 120, 240, 300, 600, 900, 1800, 3600, 7200, 10800,
];

/// Constellations, in emission order
const SSR_SYSTEMS: [Constellation; 6] = [
    Constellation::GPS,
    Constellation::Glonass,
    Constellation::Galileo,
    Constellation::QZSS,
    Constellation::BeiDou,
    Constellation::SBAS,
];

/// Update interval code (IDF004) of the largest interval
/// not exceeding `validity_s`.
pub fn ssr_update_interval(validity_s: f64) -> u8 {
    UPDATE_INTERVALS
        .iter()
        .rposition(|interval| *interval as f64 <= validity_s)
        .unwrap_or(0) as u8
}

/// Orbit correction of one satellite (IGM01)
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct OrbitCorrection {
    pub sv: SV,
    /// Issue of data of the broadcast ephemeris
    pub iod: u8,
    pub radial_m: f64,
    pub along_m: f64,
    pub cross_m: f64,
    pub dot_radial_m_s: f64,
    pub dot_along_m_s: f64,
    pub dot_cross_m_s: f64,
}

/// Clock correction of one satellite (IGM02)
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ClockCorrection {
    pub sv: SV,
    pub c0_m: f64,
    pub c1_m_s: f64,
    pub c2_m_s2: f64,
}

/// One code bias
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct CodeBias {
    /// Signal and tracking mode identifier (IDF024)
    pub tracking_mode: u8,
    pub bias_m: f64,
}

/// Code biases of one satellite (IGM05)
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SatelliteCodeBiases {
    pub sv: SV,
    pub biases: Vec<CodeBias>,
}

/// Corrections valid at one SSR epoch
#[derive(Debug, Clone, PartialEq)]
pub struct SsrCorrections {
    pub epoch: Epoch,
    /// Update interval code (IDF004), see [ssr_update_interval]
    pub update_interval: u8,
    /// IOD SSR (IDF007)
    pub iod_ssr: u8,
    /// SSR provider ID (IDF008)
    pub provider_id: u16,
    /// SSR solution ID (IDF009)
    pub solution_id: u8,
    /// Orbit corrections are given in a regional reference frame (IDF006)
    pub regional: bool,
    pub orbits: Vec<OrbitCorrection>,
    pub clocks: Vec<ClockCorrection>,
    pub biases: Vec<SatelliteCodeBiases>,
}

impl SsrCorrections {
    pub fn new(epoch: Epoch) -> Self {
        Self {
            epoch,
            update_interval: 0,
            iod_ssr: 0,
            provider_id: 0,
            solution_id: 0,
            regional: false,
            orbits: Vec::new(),
            clocks: Vec::new(),
            biases: Vec::new(),
        }
    }

    fn validate(&self) -> Result<(), Error> {
        check_unsigned("update interval", self.update_interval as u64, 4)?;
        check_unsigned("IOD SSR", self.iod_ssr as u64, 4)?;
        check_unsigned("solution ID", self.solution_id as u64, 4)?;
        Ok(())
    }

    /// SSR epoch time (IDF003), in seconds of GLONASS day for GLONASS,
    /// seconds of GPS week otherwise.
    fn epoch_time(&self, constellation: Constellation) -> u64 {
        if constellation == Constellation::Glonass {
            let (_, tod_ms) = glonass_day_time_ms(self.epoch);
            (tod_ms / 1000) as u64
        } else {
            let (_, nanos) = self.epoch.to_time_scale(TimeScale::GPST).to_time_of_week();
            nanos / 1_000_000_000
        }
    }
}

/// IGS SSR message subtypes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Subtype {
    Orbit,
    Clock,
    Combined,
    CodeBias,
}

impl Subtype {
    fn number(&self, constellation: Constellation) -> Result<u64, Error> {
        let offset =
            igs_ssr_offset(constellation).ok_or(Error::UnsupportedConstellation(constellation))?;
        let subtype = match self {
            Self::Orbit => 1,
            Self::Clock => 2,
            Self::Combined => 3,
            Self::CodeBias => 5,
        };
        Ok((offset + subtype) as u64)
    }

    fn has_reference_frame(&self) -> bool {
        matches!(self, Self::Orbit | Self::Combined)
    }

    fn header_bits(&self) -> usize {
        if self.has_reference_frame() { 79 } else { 78 }
    }
}

/// Index of the [SSR_SYSTEMS] group this satellite belongs to
fn system_index(sv: SV) -> Result<usize, Error> {
    SSR_SYSTEMS
        .iter()
        .position(|system| {
            *system == sv.constellation
                || (*system == Constellation::SBAS && sv.constellation.is_sbas())
        })
        .ok_or(Error::UnsupportedConstellation(sv.constellation))
}

/// One satellite block, ready to be appended to a message
struct Block {
    sv: SV,
    bits: BitWriter,
}

fn write_header(
    w: &mut BitWriter,
    ssr: &SsrCorrections,
    subtype: Subtype,
    constellation: Constellation,
    more_messages: bool,
    count: usize,
) -> Result<(), Error> {
    w.put_unsigned(12, IGS_SSR_MESSAGE as u64);
    w.put_unsigned(3, IGS_SSR_VERSION);
    w.put_unsigned(8, subtype.number(constellation)?);
    w.put_unsigned(20, ssr.epoch_time(constellation));
    w.put_unsigned(4, ssr.update_interval as u64);
    w.put_bool(more_messages);
    w.put_unsigned(4, ssr.iod_ssr as u64);
    w.put_unsigned(16, ssr.provider_id as u64);
    w.put_unsigned(4, ssr.solution_id as u64);
    if subtype.has_reference_frame() {
        w.put_bool(ssr.regional);
    }
    w.put_unsigned(6, count as u64);
    Ok(())
}

/// Groups satellite blocks per constellation, splits groups that do not
/// fit in one message, then frames every message.
fn build_messages(
    ssr: &SsrCorrections,
    subtype: Subtype,
    blocks: Vec<Block>,
) -> Result<Vec<Frame>, Error> {
    ssr.validate()?;

    if blocks.is_empty() {
        return Err(Error::NoSatellites);
    }

    for block in blocks.iter() {
        if block.sv.prn > 63 {
            return Err(Error::FieldOverflow {
                field: "SSR satellite ID",
                value: block.sv.prn as i64,
                bits: 6,
            });
        }
    }

    let mut keyed = blocks
        .into_iter()
        .map(|block| system_index(block.sv).map(|index| (index, block)))
        .collect::<Result<Vec<_>, Error>>()?;

    keyed.sort_by_key(|(index, block)| (*index, block.sv.prn));

    // (constellation, blocks) of each message
    let max_bits = MAX_PAYLOAD_LEN * 8;
    let mut messages: Vec<(Constellation, Vec<Block>)> = Vec::new();
    let mut current_index = None;
    let mut size = 0;

    for (index, block) in keyed {
        let full = match messages.last() {
            Some((_, blocks)) => {
                blocks.len() == MAX_SATELLITES || size + block.bits.len() > max_bits
            },
            None => true,
        };

        if current_index != Some(index) || full {
            current_index = Some(index);
            size = subtype.header_bits();
            messages.push((block.sv.constellation, Vec::new()));
        }

        size += block.bits.len();
        if let Some((_, blocks)) = messages.last_mut() {
            blocks.push(block);
        }
    }

    let last = messages.len() - 1;

    messages
        .iter()
        .enumerate()
        .map(|(i, (constellation, blocks))| {
            let mut w = BitWriter::with_capacity(max_bits);
            write_header(&mut w, ssr, subtype, *constellation, i < last, blocks.len())?;
            for block in blocks.iter() {
                w.append(&block.bits);
            }
            build_message(w)
        })
        .collect()
}

fn write_orbit(w: &mut BitWriter, orbit: &OrbitCorrection) {
    w.put_unsigned(8, orbit.iod as u64);
    w.put_scaled_real(22, orbit.radial_m, 0.0001, 0.0);
    w.put_scaled_real(20, orbit.along_m, 0.0004, 0.0);
    w.put_scaled_real(20, orbit.cross_m, 0.0004, 0.0);
    w.put_scaled_real(21, orbit.dot_radial_m_s, 0.000_001, 0.0);
    w.put_scaled_real(19, orbit.dot_along_m_s, 0.000_004, 0.0);
    w.put_scaled_real(19, orbit.dot_cross_m_s, 0.000_004, 0.0);
}

fn write_clock(w: &mut BitWriter, clock: &ClockCorrection) {
    w.put_scaled_real(22, clock.c0_m, 0.0001, 0.0);
    w.put_scaled_real(21, clock.c1_m_s, 0.000_001, 0.0);
    w.put_scaled_real(27, clock.c2_m_s2, 0.000_000_02, 0.0);
}

/// Builds IGM01 (orbit corrections) messages
pub fn build_igm01(ssr: &SsrCorrections) -> Result<Vec<Frame>, Error> {
    let blocks = ssr
        .orbits
        .iter()
        .map(|orbit| {
            let mut bits = BitWriter::with_capacity(135);
            bits.put_unsigned(6, orbit.sv.prn as u64);
            write_orbit(&mut bits, orbit);
            Block { sv: orbit.sv, bits }
        })
        .collect();
    build_messages(ssr, Subtype::Orbit, blocks)
}

/// Builds IGM02 (clock corrections) messages
pub fn build_igm02(ssr: &SsrCorrections) -> Result<Vec<Frame>, Error> {
    let blocks = ssr
        .clocks
        .iter()
        .map(|clock| {
            let mut bits = BitWriter::with_capacity(76);
            bits.put_unsigned(6, clock.sv.prn as u64);
            write_clock(&mut bits, clock);
            Block { sv: clock.sv, bits }
        })
        .collect();
    build_messages(ssr, Subtype::Clock, blocks)
}

/// Builds IGM03 (combined orbit and clock corrections) messages,
/// for satellites that have both.
pub fn build_igm03(ssr: &SsrCorrections) -> Result<Vec<Frame>, Error> {
    let blocks = ssr
        .orbits
        .iter()
        .filter_map(|orbit| {
            let clock = ssr.clocks.iter().find(|clock| clock.sv == orbit.sv)?;
            let mut bits = BitWriter::with_capacity(205);
            bits.put_unsigned(6, orbit.sv.prn as u64);
            write_orbit(&mut bits, orbit);
            write_clock(&mut bits, clock);
            Some(Block { sv: orbit.sv, bits })
        })
        .collect();
    build_messages(ssr, Subtype::Combined, blocks)
}

/// Builds IGM05 (code biases) messages
pub fn build_igm05(ssr: &SsrCorrections) -> Result<Vec<Frame>, Error> {
    let blocks = ssr
        .biases
        .iter()
        .map(|sat| -> Result<Block, Error> {
            check_unsigned("code bias count", sat.biases.len() as u64, 5)?;
            let mut bits = BitWriter::with_capacity(11 + 19 * sat.biases.len());
            bits.put_unsigned(6, sat.sv.prn as u64);
            bits.put_unsigned(5, sat.biases.len() as u64);
            for bias in sat.biases.iter() {
                check_unsigned("tracking mode", bias.tracking_mode as u64, 5)?;
                bits.put_unsigned(5, bias.tracking_mode as u64);
                bits.put_scaled_real(14, bias.bias_m, 0.01, 0.0);
            }
            Ok(Block { sv: sat.sv, bits })
        })
        .collect::<Result<Vec<_>, Error>>()?;
    build_messages(ssr, Subtype::CodeBias, blocks)
}
