//! Conversions shared by the observation message builders
use crate::rtcm::{SPEED_OF_LIGHT_M_S, bits::BitWriter};

/// GPS pseudo range ambiguity: one light millisecond (m)
pub const PRUNIT_GPS: f64 = 299_792.458;

/// GLONASS pseudo range ambiguity: two light milliseconds (m)
pub const PRUNIT_GLO: f64 = 599_584.916;

/// One light millisecond (m), MSM rough range unit
pub const RANGE_MS: f64 = SPEED_OF_LIGHT_M_S * 0.001;

/// Folds the carrier phase minus pseudo range difference (cycles)
/// into [-1500, 1500) cycles, the span of the phase range Data Fields.
pub fn cp_pr(cp: f64, pr_cycles: f64) -> f64 {
    (cp - pr_cycles + 1500.0).rem_euclid(3000.0) - 1500.0
}

/// Appends a two's complement field, or its invalid sentinel when the
/// value is missing or does not fit.
pub fn put_signed_or_invalid(w: &mut BitWriter, width: usize, value: Option<i64>) {
    let limit = (1i64 << (width - 1)) - 1;
    match value {
        Some(value) if value.abs() <= limit => w.put_signed(width, value),
        _ => w.put_invalid(width),
    }
}

/// Smoothing interval code (DF008, DF037, DF418)
pub fn smoothing_interval_code(seconds: i32) -> u8 {
    match seconds {
        s if s < 0 => 7,
        0 => 0,
        s if s < 30 => 1,
        s if s < 60 => 2,
        s if s < 120 => 3,
        s if s < 240 => 4,
        s if s < 480 => 5,
        _ => 6,
    }
}

/// Legacy CNR (DF015, DF020, DF045, DF050): 0.25 dB-Hz, 0 = not computed
pub fn legacy_cnr(cn0_dbhz: f64) -> u64 {
    (cn0_dbhz / 0.25).round().clamp(0.0, 255.0) as u64
}

/// MSM4/5 CNR (DF403): 1 dB-Hz, 0 = not available
pub fn msm_cnr(cn0_dbhz: f64) -> u64 {
    cn0_dbhz.round().clamp(0.0, 63.0) as u64
}

/// MSM6/7 high resolution CNR (DF408): 2^-4 dB-Hz
pub fn msm_cnr_hr(cn0_dbhz: f64) -> u64 {
    (cn0_dbhz * 16.0).round().clamp(0.0, 1023.0) as u64
}
