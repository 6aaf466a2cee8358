//! Lock time bookkeeping.
//!
//! Several Data Fields report for how long a signal has been tracked
//! continuously. The [LockTimeTable] remembers, per satellite and signal,
//! when the signal was last (re)acquired.
use log::trace;

use hifitime::prelude::Epoch;

use crate::rtcm::{ephemeris::ConstellationTime, observation::Observation};

/// Number of satellite slots per [LockBand]
pub const SLOTS: usize = 64;

/// Signal families tracked independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LockBand {
    GpsL1,
    GpsL2,
    GpsL5,
    GalileoE1,
    GalileoE5a,
    GalileoE5b,
    GlonassL1,
    GlonassL2,
}

impl LockBand {
    pub const COUNT: usize = 8;

    fn index(&self) -> usize {
        *self as usize
    }
}

/// Lock time table key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LockSlot {
    pub band: LockBand,
    /// Satellite slot (PRN)
    pub slot: u8,
}

impl LockSlot {
    pub fn new(band: LockBand, slot: u8) -> Self {
        Self { band, slot }
    }

    pub fn from_observation(obs: &Observation) -> Self {
        Self::new(obs.signal.lock_band(), obs.sv.prn)
    }
}

/// Time of last lock acquisition, per [LockSlot].
/// Entries are never removed: a signal that is reacquired
/// is simply stamped again.
#[derive(Debug, Clone)]
pub struct LockTimeTable {
    cells: [[Option<Epoch>; SLOTS]; LockBand::COUNT],
}

impl Default for LockTimeTable {
    fn default() -> Self {
        Self {
            cells: [[None; SLOTS]; LockBand::COUNT],
        }
    }
}

impl LockTimeTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last lock acquisition of this slot, if any
    pub fn last_lock(&self, slot: LockSlot) -> Option<Epoch> {
        self.cells[slot.band.index()]
            .get(slot.slot as usize)
            .copied()
            .flatten()
    }

    /// Updates the table at `t` and returns the elapsed whole seconds
    /// of continuous lock. A slot seen for the first time, or flagged
    /// as freshly locked, is stamped with `t` and reports 0.
    pub fn update(&mut self, slot: LockSlot, t: Epoch, fresh_lock: bool) -> u32 {
        let Some(cell) = self.cells[slot.band.index()].get_mut(slot.slot as usize) else {
            trace!("{:?}: slot {} out of range", slot.band, slot.slot);
            return 0;
        };

        match cell {
            Some(last) if !fresh_lock => {
                let elapsed = (t - *last).to_seconds();
                if elapsed > 0.0 {
                    elapsed.floor().min(u32::MAX as f64) as u32
                } else {
                    0
                }
            },
            _ => {
                *cell = Some(t);
                0
            },
        }
    }

    /// Elapsed seconds of continuous lock for the satellite and signal
    /// of this [Observation], observed at `obs_time`.
    pub fn lock_time<E: ConstellationTime + ?Sized>(
        &mut self,
        ephemeris: &E,
        obs_time: f64,
        obs: &Observation,
    ) -> u32 {
        let t = ephemeris.observation_epoch(obs_time);
        self.update(LockSlot::from_observation(obs), t, obs.fresh_lock)
    }
}

/// Lock time indicator of legacy observation messages
/// (DF013, DF019, DF043, DF049: 7 bits)
pub fn lock_time_indicator(seconds: u32) -> u8 {
    let t = seconds;
    let indicator = if t < 24 {
        t
    } else if t < 72 {
        (t + 24) / 2
    } else if t < 168 {
        (t + 120) / 4
    } else if t < 360 {
        (t + 408) / 8
    } else if t < 744 {
        (t + 1176) / 16
    } else if t < 937 {
        (t + 3096) / 32
    } else {
        127
    };
    indicator as u8
}

/// MSM lock time indicator (DF402: 4 bits)
pub fn msm_lock_time_indicator(seconds: u32) -> u8 {
    let ms = seconds as u64 * 1000;
    if ms < 32 {
        return 0;
    }
    let mut indicator = 1;
    while indicator < 15 && ms >= (32u64 << indicator) {
        indicator += 1;
    }
    indicator
}

/// MSM extended lock time indicator (DF407: 10 bits)
pub fn msm_extended_lock_time_indicator(seconds: u32) -> u16 {
    let ms = seconds as u64 * 1000;
    if ms < 64 {
        return ms as u16;
    }
    for n in 1..=20u64 {
        if ms < (1u64 << (n + 6)) {
            return ((ms >> n) + 32 * n) as u16;
        }
    }
    704
}
