//! Broadcast ephemeris messages: 1019 (GPS), 1020 (GLONASS), 1045 (Galileo F/NAV)
use crate::rtcm::{
    Error,
    bits::{BitReader, BitWriter},
    check_glonass_channel, check_unsigned,
    ephemeris::{GalileoEphemeris, GlonassEphemeris, GlonassUtcModel, GpsEphemeris},
    frame::{Frame, build_message},
};

const P2_4: f64 = 16.0;
const P2_5: f64 = 1.0 / 32.0;
const P2_11: f64 = 1.0 / (1u64 << 11) as f64;
const P2_19: f64 = 1.0 / (1u64 << 19) as f64;
const P2_20: f64 = 1.0 / (1u64 << 20) as f64;
const P2_29: f64 = 1.0 / (1u64 << 29) as f64;
const P2_30: f64 = 1.0 / (1u64 << 30) as f64;
const P2_31: f64 = 1.0 / (1u64 << 31) as f64;
const P2_32: f64 = 1.0 / (1u64 << 32) as f64;
const P2_33: f64 = 1.0 / (1u64 << 33) as f64;
const P2_34: f64 = 1.0 / (1u64 << 34) as f64;
const P2_40: f64 = 1.0 / (1u64 << 40) as f64;
const P2_43: f64 = 1.0 / (1u64 << 43) as f64;
const P2_46: f64 = 1.0 / (1u64 << 46) as f64;
const P2_55: f64 = 1.0 / (1u64 << 55) as f64;
const P2_59: f64 = 1.0 / (1u64 << 59) as f64;

fn expect_message(r: &mut BitReader, expected: u16) -> Result<(), Error> {
    let found = r.get_unsigned(12)? as u16;
    if found == expected {
        Ok(())
    } else {
        Err(Error::UnexpectedMessage { expected, found })
    }
}

/// Builds a 1019 (GPS LNAV ephemeris)
pub fn build_1019(eph: &GpsEphemeris) -> Result<Frame, Error> {
    check_unsigned("GPS PRN", eph.prn as u64, 6)?;
    check_unsigned("URA", eph.ura as u64, 4)?;
    check_unsigned("code on L2", eph.code_on_l2 as u64, 2)?;
    check_unsigned("IODE", eph.iode as u64, 8)?;
    check_unsigned("IODC", eph.iodc as u64, 10)?;
    check_unsigned("SV health", eph.health as u64, 6)?;

    let mut w = BitWriter::with_capacity(488);
    w.put_unsigned(12, 1019);
    w.put_unsigned(6, eph.prn as u64);
    w.put_unsigned(10, (eph.week % 1024) as u64);
    w.put_unsigned(4, eph.ura as u64);
    w.put_unsigned(2, eph.code_on_l2 as u64);
    w.put_scaled_real(14, eph.idot, P2_43, 0.0);
    w.put_unsigned(8, eph.iode as u64);
    w.put_scaled_unsigned(16, eph.toc as f64, P2_4);
    w.put_scaled_real(8, eph.af2, P2_55, 0.0);
    w.put_scaled_real(16, eph.af1, P2_43, 0.0);
    w.put_scaled_real(22, eph.af0, P2_31, 0.0);
    w.put_unsigned(10, eph.iodc as u64);
    w.put_scaled_real(16, eph.crs, P2_5, 0.0);
    w.put_scaled_real(16, eph.delta_n, P2_43, 0.0);
    w.put_scaled_real(32, eph.m0, P2_31, 0.0);
    w.put_scaled_real(16, eph.cuc, P2_29, 0.0);
    w.put_scaled_unsigned(32, eph.e, P2_33);
    w.put_scaled_real(16, eph.cus, P2_29, 0.0);
    w.put_scaled_unsigned(32, eph.sqrt_a, P2_19);
    w.put_scaled_unsigned(16, eph.toe as f64, P2_4);
    w.put_scaled_real(16, eph.cic, P2_29, 0.0);
    w.put_scaled_real(32, eph.omega0, P2_31, 0.0);
    w.put_scaled_real(16, eph.cis, P2_29, 0.0);
    w.put_scaled_real(32, eph.i0, P2_31, 0.0);
    w.put_scaled_real(16, eph.crc, P2_5, 0.0);
    w.put_scaled_real(32, eph.omega, P2_31, 0.0);
    w.put_scaled_real(24, eph.omega_dot, P2_43, 0.0);
    w.put_scaled_real(8, eph.tgd, P2_31, 0.0);
    w.put_unsigned(6, eph.health as u64);
    w.put_bool(eph.l2p_data_flag);
    w.put_bool(eph.fit_interval);
    build_message(w)
}

/// Decodes a 1019 frame into `eph`, which is left untouched on failure.
/// The 10-bit week is resolved to the full week closest to the
/// current content of `eph`.
pub fn read_1019(frame: &[u8], eph: &mut GpsEphemeris) -> Result<(), Error> {
    let frame = Frame::from_bytes(frame)?;
    let mut r = BitReader::new(frame.payload());
    expect_message(&mut r, 1019)?;

    let mut decoded = GpsEphemeris {
        prn: r.get_unsigned(6)? as u8,
        week: r.get_unsigned(10)? as u32,
        ura: r.get_unsigned(4)? as u8,
        code_on_l2: r.get_unsigned(2)? as u8,
        idot: r.get_scaled_real(14, P2_43)?,
        iode: r.get_unsigned(8)? as u16,
        toc: r.get_scaled_unsigned(16, P2_4)? as u32,
        af2: r.get_scaled_real(8, P2_55)?,
        af1: r.get_scaled_real(16, P2_43)?,
        af0: r.get_scaled_real(22, P2_31)?,
        iodc: r.get_unsigned(10)? as u16,
        crs: r.get_scaled_real(16, P2_5)?,
        delta_n: r.get_scaled_real(16, P2_43)?,
        m0: r.get_scaled_real(32, P2_31)?,
        cuc: r.get_scaled_real(16, P2_29)?,
        e: r.get_scaled_unsigned(32, P2_33)?,
        cus: r.get_scaled_real(16, P2_29)?,
        sqrt_a: r.get_scaled_unsigned(32, P2_19)?,
        toe: r.get_scaled_unsigned(16, P2_4)? as u32,
        cic: r.get_scaled_real(16, P2_29)?,
        omega0: r.get_scaled_real(32, P2_31)?,
        cis: r.get_scaled_real(16, P2_29)?,
        i0: r.get_scaled_real(32, P2_31)?,
        crc: r.get_scaled_real(16, P2_5)?,
        omega: r.get_scaled_real(32, P2_31)?,
        omega_dot: r.get_scaled_real(24, P2_43)?,
        tgd: r.get_scaled_real(8, P2_31)?,
        health: r.get_unsigned(6)? as u8,
        l2p_data_flag: r.get_bool()?,
        fit_interval: r.get_bool()?,
    };

    decoded.week = resolve_gps_week(decoded.week, eph.week);
    *eph = decoded;
    Ok(())
}

/// Full GPS week closest to `reference`, from its 10-bit representation
fn resolve_gps_week(week_mod_1024: u32, reference: u32) -> u32 {
    if reference < 1024 {
        return week_mod_1024;
    }
    let base = reference - reference % 1024 + week_mod_1024;
    if base > reference + 512 {
        base - 1024
    } else if base + 512 < reference {
        base + 1024
    } else {
        base
    }
}

/// GLONASS tk (DF107): hours, minutes and 30 s flag
fn encode_tk(tk: u32) -> u64 {
    let hours = (tk / 3600) as u64 % 24;
    let minutes = ((tk % 3600) / 60) as u64;
    let half = (tk % 60 >= 30) as u64;
    (hours << 7) | (minutes << 1) | half
}

fn decode_tk(tk: u64) -> u32 {
    let hours = (tk >> 7) as u32;
    let minutes = ((tk >> 1) & 0x3F) as u32;
    hours * 3600 + minutes * 60 + (tk & 1) as u32 * 30
}

/// Builds a 1020 (GLONASS ephemeris). The time model of the fifth string
/// is reported as additional data when `utc.valid` is set.
pub fn build_1020(eph: &GlonassEphemeris, utc: &GlonassUtcModel) -> Result<Frame, Error> {
    check_unsigned("GLONASS slot", eph.slot as u64, 6)?;
    check_glonass_channel(eph.frequency_channel)?;
    check_unsigned("P1", eph.p1 as u64, 2)?;
    check_unsigned("tb", (eph.tb / 900) as u64, 7)?;
    check_unsigned("P", eph.p as u64, 2)?;
    check_unsigned("En", eph.en as u64, 5)?;
    check_unsigned("FT", eph.ft as u64, 4)?;
    check_unsigned("NT", eph.nt as u64, 11)?;
    check_unsigned("M", eph.m as u64, 2)?;
    check_unsigned("NA", utc.na as u64, 11)?;
    check_unsigned("N4", eph.n4 as u64, 5)?;

    let mut w = BitWriter::with_capacity(360);
    w.put_unsigned(12, 1020);
    w.put_unsigned(6, eph.slot as u64);
    w.put_unsigned(5, (eph.frequency_channel + 7) as u64);
    w.put_bool(eph.almanac_health);
    w.put_bool(eph.almanac_health_available);
    w.put_unsigned(2, eph.p1 as u64);
    w.put_unsigned(12, encode_tk(eph.tk));
    w.put_bool(eph.bn_msb);
    w.put_bool(eph.p2);
    w.put_unsigned(7, (eph.tb / 900) as u64);
    for (v, p, a) in [
        (eph.vx, eph.x, eph.ax),
        (eph.vy, eph.y, eph.ay),
        (eph.vz, eph.z, eph.az),
    ] {
        w.put_scaled_sign_magnitude(24, v, P2_20);
        w.put_scaled_sign_magnitude(27, p, P2_11);
        w.put_scaled_sign_magnitude(5, a, P2_30);
    }
    w.put_bool(eph.p3);
    w.put_scaled_sign_magnitude(11, eph.gamma_n, P2_40);
    w.put_unsigned(2, eph.p as u64);
    w.put_bool(eph.ln3);
    w.put_scaled_sign_magnitude(22, eph.tau_n, P2_30);
    w.put_scaled_sign_magnitude(5, eph.delta_tau_n, P2_30);
    w.put_unsigned(5, eph.en as u64);
    w.put_bool(eph.p4);
    w.put_unsigned(4, eph.ft as u64);
    w.put_unsigned(11, eph.nt as u64);
    w.put_unsigned(2, eph.m as u64);
    w.put_bool(utc.valid);
    w.put_unsigned(11, utc.na as u64);
    w.put_scaled_sign_magnitude(32, utc.tau_c, P2_31);
    w.put_unsigned(5, eph.n4 as u64);
    w.put_scaled_sign_magnitude(22, utc.tau_gps, P2_30);
    w.put_bool(eph.ln5);
    w.put_unsigned(7, 0); // reserved
    build_message(w)
}

/// Decodes a 1020 frame into `eph` and `utc`, both left untouched on failure.
pub fn read_1020(
    frame: &[u8],
    eph: &mut GlonassEphemeris,
    utc: &mut GlonassUtcModel,
) -> Result<(), Error> {
    let frame = Frame::from_bytes(frame)?;
    let mut r = BitReader::new(frame.payload());
    expect_message(&mut r, 1020)?;

    let mut decoded = GlonassEphemeris {
        slot: r.get_unsigned(6)? as u8,
        frequency_channel: r.get_unsigned(5)? as i8 - 7,
        almanac_health: r.get_bool()?,
        almanac_health_available: r.get_bool()?,
        p1: r.get_unsigned(2)? as u8,
        tk: decode_tk(r.get_unsigned(12)?),
        bn_msb: r.get_bool()?,
        p2: r.get_bool()?,
        tb: r.get_unsigned(7)? as u32 * 900,
        ..Default::default()
    };

    let mut axes = [(0.0, 0.0, 0.0); 3];
    for axis in axes.iter_mut() {
        axis.0 = r.get_scaled_sign_magnitude(24, P2_20)?;
        axis.1 = r.get_scaled_sign_magnitude(27, P2_11)?;
        axis.2 = r.get_scaled_sign_magnitude(5, P2_30)?;
    }
    (decoded.vx, decoded.x, decoded.ax) = axes[0];
    (decoded.vy, decoded.y, decoded.ay) = axes[1];
    (decoded.vz, decoded.z, decoded.az) = axes[2];

    decoded.p3 = r.get_bool()?;
    decoded.gamma_n = r.get_scaled_sign_magnitude(11, P2_40)?;
    decoded.p = r.get_unsigned(2)? as u8;
    decoded.ln3 = r.get_bool()?;
    decoded.tau_n = r.get_scaled_sign_magnitude(22, P2_30)?;
    decoded.delta_tau_n = r.get_scaled_sign_magnitude(5, P2_30)?;
    decoded.en = r.get_unsigned(5)? as u8;
    decoded.p4 = r.get_bool()?;
    decoded.ft = r.get_unsigned(4)? as u8;
    decoded.nt = r.get_unsigned(11)? as u16;
    decoded.m = r.get_unsigned(2)? as u8;

    let decoded_utc = GlonassUtcModel {
        valid: r.get_bool()?,
        na: r.get_unsigned(11)? as u16,
        tau_c: r.get_scaled_sign_magnitude(32, P2_31)?,
        ..Default::default()
    };
    decoded.n4 = r.get_unsigned(5)? as u8;
    let tau_gps = r.get_scaled_sign_magnitude(22, P2_30)?;
    decoded.ln5 = r.get_bool()?;

    *eph = decoded;
    *utc = GlonassUtcModel {
        tau_gps,
        ..decoded_utc
    };
    Ok(())
}

/// Builds a 1045 (Galileo F/NAV ephemeris)
pub fn build_1045(eph: &GalileoEphemeris) -> Result<Frame, Error> {
    check_unsigned("Galileo PRN", eph.prn as u64, 6)?;
    check_unsigned("IODnav", eph.iod_nav as u64, 10)?;
    check_unsigned("E5a health", eph.e5a_health as u64, 2)?;

    let mut w = BitWriter::with_capacity(496);
    w.put_unsigned(12, 1045);
    w.put_unsigned(6, eph.prn as u64);
    w.put_unsigned(12, (eph.week % 4096) as u64);
    w.put_unsigned(10, eph.iod_nav as u64);
    w.put_unsigned(8, eph.sisa as u64);
    w.put_scaled_real(14, eph.idot, P2_43, 0.0);
    w.put_scaled_unsigned(14, eph.toc as f64, 60.0);
    w.put_scaled_real(6, eph.af2, P2_59, 0.0);
    w.put_scaled_real(21, eph.af1, P2_46, 0.0);
    w.put_scaled_real(31, eph.af0, P2_34, 0.0);
    w.put_scaled_real(16, eph.crs, P2_5, 0.0);
    w.put_scaled_real(16, eph.delta_n, P2_43, 0.0);
    w.put_scaled_real(32, eph.m0, P2_31, 0.0);
    w.put_scaled_real(16, eph.cuc, P2_29, 0.0);
    w.put_scaled_unsigned(32, eph.e, P2_33);
    w.put_scaled_real(16, eph.cus, P2_29, 0.0);
    w.put_scaled_unsigned(32, eph.sqrt_a, P2_19);
    w.put_scaled_unsigned(14, eph.toe as f64, 60.0);
    w.put_scaled_real(16, eph.cic, P2_29, 0.0);
    w.put_scaled_real(32, eph.omega0, P2_31, 0.0);
    w.put_scaled_real(16, eph.cis, P2_29, 0.0);
    w.put_scaled_real(32, eph.i0, P2_31, 0.0);
    w.put_scaled_real(16, eph.crc, P2_5, 0.0);
    w.put_scaled_real(32, eph.omega, P2_31, 0.0);
    w.put_scaled_real(24, eph.omega_dot, P2_43, 0.0);
    w.put_scaled_real(10, eph.bgd_e1_e5a, P2_32, 0.0);
    w.put_unsigned(2, eph.e5a_health as u64);
    w.put_bool(eph.e5a_data_validity);
    w.put_unsigned(7, 0); // reserved
    build_message(w)
}

/// Decodes a 1045 frame into `eph`, which is left untouched on failure.
pub fn read_1045(frame: &[u8], eph: &mut GalileoEphemeris) -> Result<(), Error> {
    let frame = Frame::from_bytes(frame)?;
    let mut r = BitReader::new(frame.payload());
    expect_message(&mut r, 1045)?;

    let decoded = GalileoEphemeris {
        prn: r.get_unsigned(6)? as u8,
        week: r.get_unsigned(12)? as u32,
        iod_nav: r.get_unsigned(10)? as u16,
        sisa: r.get_unsigned(8)? as u8,
        idot: r.get_scaled_real(14, P2_43)?,
        toc: r.get_scaled_unsigned(14, 60.0)? as u32,
        af2: r.get_scaled_real(6, P2_59)?,
        af1: r.get_scaled_real(21, P2_46)?,
        af0: r.get_scaled_real(31, P2_34)?,
        crs: r.get_scaled_real(16, P2_5)?,
        delta_n: r.get_scaled_real(16, P2_43)?,
        m0: r.get_scaled_real(32, P2_31)?,
        cuc: r.get_scaled_real(16, P2_29)?,
        e: r.get_scaled_unsigned(32, P2_33)?,
        cus: r.get_scaled_real(16, P2_29)?,
        sqrt_a: r.get_scaled_unsigned(32, P2_19)?,
        toe: r.get_scaled_unsigned(14, 60.0)? as u32,
        cic: r.get_scaled_real(16, P2_29)?,
        omega0: r.get_scaled_real(32, P2_31)?,
        cis: r.get_scaled_real(16, P2_29)?,
        i0: r.get_scaled_real(32, P2_31)?,
        crc: r.get_scaled_real(16, P2_5)?,
        omega: r.get_scaled_real(32, P2_31)?,
        omega_dot: r.get_scaled_real(24, P2_43)?,
        bgd_e1_e5a: r.get_scaled_real(10, P2_32)?,
        e5a_health: r.get_unsigned(2)? as u8,
        e5a_data_validity: r.get_bool()?,
    };

    *eph = decoded;
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use rand::{Rng, SeedableRng, rngs::StdRng};
    use rtcm_rs::{Message, MessageFrame};

    /// Random multiple of `scale`, representable in a signed field of `bits`
    fn signed(rng: &mut StdRng, bits: u32, scale: f64) -> f64 {
        let limit = (1i64 << (bits - 1)) - 1;
        rng.gen_range(-limit..=limit) as f64 * scale
    }

    fn unsigned(rng: &mut StdRng, bits: u32) -> u64 {
        rng.gen_range(0..1u64 << bits)
    }

    fn random_gps(rng: &mut StdRng) -> GpsEphemeris {
        GpsEphemeris {
            prn: 1 + unsigned(rng, 5) as u8,
            week: 2048 + unsigned(rng, 10) as u32,
            ura: unsigned(rng, 4) as u8,
            code_on_l2: unsigned(rng, 2) as u8,
            idot: signed(rng, 14, P2_43),
            iode: unsigned(rng, 8) as u16,
            toc: unsigned(rng, 15) as u32 * 16,
            af2: signed(rng, 8, P2_55),
            af1: signed(rng, 16, P2_43),
            af0: signed(rng, 22, P2_31),
            iodc: unsigned(rng, 10) as u16,
            crs: signed(rng, 16, P2_5),
            delta_n: signed(rng, 16, P2_43),
            m0: signed(rng, 32, P2_31),
            cuc: signed(rng, 16, P2_29),
            e: unsigned(rng, 32) as f64 * P2_33,
            cus: signed(rng, 16, P2_29),
            sqrt_a: unsigned(rng, 32) as f64 * P2_19,
            toe: unsigned(rng, 15) as u32 * 16,
            cic: signed(rng, 16, P2_29),
            omega0: signed(rng, 32, P2_31),
            cis: signed(rng, 16, P2_29),
            i0: signed(rng, 32, P2_31),
            crc: signed(rng, 16, P2_5),
            omega: signed(rng, 32, P2_31),
            omega_dot: signed(rng, 24, P2_43),
            tgd: signed(rng, 8, P2_31),
            health: unsigned(rng, 6) as u8,
            l2p_data_flag: rng.gen_bool(0.5),
            fit_interval: rng.gen_bool(0.5),
        }
    }

    #[test]
    fn gps_1019_round_trip() {
        let rng = &mut StdRng::seed_from_u64(1019);
        for _ in 0..200 {
            let eph = random_gps(rng);
            let frame = build_1019(&eph).unwrap();
            assert_eq!(frame.payload_len(), 61);

            let mut decoded = GpsEphemeris {
                week: eph.week + 3,
                ..Default::default()
            };
            read_1019(frame.as_bytes(), &mut decoded).unwrap();
            assert_eq!(decoded, eph);
        }
    }

    #[test]
    fn gps_week_rollover() {
        assert_eq!(resolve_gps_week(100, 500), 100);
        assert_eq!(resolve_gps_week(1023, 2048), 2047);
        assert_eq!(resolve_gps_week(0, 2047), 2048);
        assert_eq!(resolve_gps_week(252, 2300), 2300);
    }

    #[test]
    fn readers_do_not_mutate_on_failure() {
        let frame = build_1019(&random_gps(&mut StdRng::seed_from_u64(7))).unwrap();
        let mut bytes = frame.into_bytes();
        bytes[20] ^= 0x10;

        let mut eph = GpsEphemeris::default();
        assert_eq!(read_1019(&bytes, &mut eph), Err(Error::CrcMismatch));
        assert_eq!(eph, GpsEphemeris::default());

        let galileo = build_1045(&GalileoEphemeris::default()).unwrap();
        assert_eq!(
            read_1019(galileo.as_bytes(), &mut eph),
            Err(Error::UnexpectedMessage {
                expected: 1019,
                found: 1045
            })
        );
        assert_eq!(eph, GpsEphemeris::default());
    }

    #[test]
    fn glonass_1020_round_trip() {
        let rng = &mut StdRng::seed_from_u64(1020);
        for _ in 0..200 {
            let eph = GlonassEphemeris {
                slot: 1 + unsigned(rng, 4) as u8,
                frequency_channel: rng.gen_range(-7..=6),
                almanac_health: rng.gen_bool(0.5),
                almanac_health_available: rng.gen_bool(0.5),
                p1: unsigned(rng, 2) as u8,
                tk: rng.gen_range(0..2880) * 30,
                bn_msb: rng.gen_bool(0.5),
                p2: rng.gen_bool(0.5),
                tb: rng.gen_range(0..96) * 900,
                x: signed(rng, 27, P2_11),
                vx: signed(rng, 24, P2_20),
                ax: signed(rng, 5, P2_30),
                y: signed(rng, 27, P2_11),
                vy: signed(rng, 24, P2_20),
                ay: signed(rng, 5, P2_30),
                z: signed(rng, 27, P2_11),
                vz: signed(rng, 24, P2_20),
                az: signed(rng, 5, P2_30),
                p3: rng.gen_bool(0.5),
                gamma_n: signed(rng, 11, P2_40),
                p: unsigned(rng, 2) as u8,
                ln3: rng.gen_bool(0.5),
                tau_n: signed(rng, 22, P2_30),
                delta_tau_n: signed(rng, 5, P2_30),
                en: unsigned(rng, 5) as u8,
                p4: rng.gen_bool(0.5),
                ft: unsigned(rng, 4) as u8,
                nt: rng.gen_range(1..=1461),
                m: unsigned(rng, 2) as u8,
                n4: 1 + unsigned(rng, 4) as u8,
                ln5: rng.gen_bool(0.5),
            };
            let utc = GlonassUtcModel {
                valid: rng.gen_bool(0.5),
                na: rng.gen_range(1..=1461),
                tau_c: signed(rng, 32, P2_31),
                tau_gps: signed(rng, 22, P2_30),
            };

            let frame = build_1020(&eph, &utc).unwrap();
            assert_eq!(frame.payload_len(), 45);

            let mut decoded = GlonassEphemeris::default();
            let mut decoded_utc = GlonassUtcModel::default();
            read_1020(frame.as_bytes(), &mut decoded, &mut decoded_utc).unwrap();
            assert_eq!(decoded, eph);
            assert_eq!(decoded_utc, utc);
        }
    }

    #[test]
    fn glonass_tk() {
        // 23h59m30s
        assert_eq!(encode_tk(86_370), (23 << 7) | (59 << 1) | 1);
        assert_eq!(decode_tk(encode_tk(86_370)), 86_370);
        assert_eq!(decode_tk(encode_tk(3_630)), 3_630);
    }

    #[test]
    fn invalid_glonass_channel() {
        let eph = GlonassEphemeris {
            frequency_channel: 7,
            ..Default::default()
        };
        assert!(matches!(
            build_1020(&eph, &GlonassUtcModel::default()),
            Err(Error::FieldOverflow { .. })
        ));
    }

    #[test]
    fn galileo_1045_round_trip() {
        let rng = &mut StdRng::seed_from_u64(1045);
        for _ in 0..200 {
            let eph = GalileoEphemeris {
                prn: 1 + unsigned(rng, 5) as u8,
                week: unsigned(rng, 12) as u32,
                iod_nav: unsigned(rng, 10) as u16,
                sisa: unsigned(rng, 8) as u8,
                idot: signed(rng, 14, P2_43),
                toc: rng.gen_range(0..10_080) * 60,
                af2: signed(rng, 6, P2_59),
                af1: signed(rng, 21, P2_46),
                af0: signed(rng, 31, P2_34),
                crs: signed(rng, 16, P2_5),
                delta_n: signed(rng, 16, P2_43),
                m0: signed(rng, 32, P2_31),
                cuc: signed(rng, 16, P2_29),
                e: unsigned(rng, 32) as f64 * P2_33,
                cus: signed(rng, 16, P2_29),
                sqrt_a: unsigned(rng, 32) as f64 * P2_19,
                toe: rng.gen_range(0..10_080) * 60,
                cic: signed(rng, 16, P2_29),
                omega0: signed(rng, 32, P2_31),
                cis: signed(rng, 16, P2_29),
                i0: signed(rng, 32, P2_31),
                crc: signed(rng, 16, P2_5),
                omega: signed(rng, 32, P2_31),
                omega_dot: signed(rng, 24, P2_43),
                bgd_e1_e5a: signed(rng, 10, P2_32),
                e5a_health: unsigned(rng, 2) as u8,
                e5a_data_validity: rng.gen_bool(0.5),
            };

            let frame = build_1045(&eph).unwrap();
            assert_eq!(frame.payload_len(), 62);

            let mut decoded = GalileoEphemeris::default();
            read_1045(frame.as_bytes(), &mut decoded).unwrap();
            assert_eq!(decoded, eph);
        }
    }

    #[test]
    fn glonass_tau_c_sign_magnitude() {
        let eph = GlonassEphemeris {
            slot: 9,
            frequency_channel: -2,
            tb: 900,
            nt: 100,
            n4: 8,
            ..Default::default()
        };
        let utc = GlonassUtcModel {
            valid: true,
            na: 100,
            tau_c: -1.0e-8,
            tau_gps: -2.0e-9,
        };

        let frame = build_1020(&eph, &utc).unwrap();

        // DF133: sign bit, then 31 bits of magnitude
        let mut r = BitReader::new(frame.payload());
        r.skip(293).unwrap();
        assert!(r.get_bool().unwrap());
        assert_eq!(r.get_unsigned(31).unwrap(), 21);

        let mut decoded = GlonassEphemeris::default();
        let mut decoded_utc = GlonassUtcModel::default();
        read_1020(frame.as_bytes(), &mut decoded, &mut decoded_utc).unwrap();
        assert!((decoded_utc.tau_c - utc.tau_c).abs() <= P2_31);
        assert!((decoded_utc.tau_gps - utc.tau_gps).abs() <= P2_30);

        let Message::Msg1020(msg) = MessageFrame::new(frame.as_bytes()).unwrap().get_message()
        else {
            panic!("not decoded as a 1020");
        };
        assert!((msg.tau_c_s - utc.tau_c).abs() <= P2_31);
        assert!((msg.glo_m_tau_gps_s - utc.tau_gps).abs() <= P2_30);
    }

    #[test]
    fn decoded_by_rtcm_rs() {
        let rng = &mut StdRng::seed_from_u64(3);

        let gps = random_gps(rng);
        let frame = build_1019(&gps).unwrap();
        let Message::Msg1019(msg) = MessageFrame::new(frame.as_bytes()).unwrap().get_message()
        else {
            panic!("not decoded as a 1019");
        };
        assert_eq!(msg.gps_satellite_id, gps.prn);
        assert_eq!(msg.gps_week_number as u32, gps.week % 1024);
        assert_eq!(msg.iode as u16, gps.iode);
        assert_eq!(msg.toe_s as u32, gps.toe);
        assert!((msg.eccentricity - gps.e).abs() <= P2_33);
        assert!((msg.sqrt_a_sqrt_m - gps.sqrt_a).abs() <= P2_19);

        let glonass = GlonassEphemeris {
            slot: 17,
            frequency_channel: -7,
            tb: 45 * 900,
            x: -12_345.5,
            nt: 321,
            n4: 8,
            ..Default::default()
        };
        let utc = GlonassUtcModel {
            valid: true,
            na: 320,
            tau_c: 3.0e-8,
            tau_gps: -4.0e-9,
        };
        let frame = build_1020(&glonass, &utc).unwrap();
        let Message::Msg1020(msg) = MessageFrame::new(frame.as_bytes()).unwrap().get_message()
        else {
            panic!("not decoded as a 1020");
        };
        assert_eq!(msg.glo_satellite_id, 17);
        assert_eq!(msg.glo_satellite_freq_chan_number, -7);
        assert_eq!(msg.tb_min as u32, 45 * 15);
        assert!((msg.xn_km - glonass.x).abs() <= P2_11);
        assert!((msg.tau_c_s - utc.tau_c).abs() <= P2_31);

        let galileo = GalileoEphemeris {
            prn: 11,
            week: 1250,
            iod_nav: 77,
            toe: 3600,
            toc: 3600,
            sqrt_a: 5440.6,
            ..Default::default()
        };
        let frame = build_1045(&galileo).unwrap();
        let Message::Msg1045(msg) = MessageFrame::new(frame.as_bytes()).unwrap().get_message()
        else {
            panic!("not decoded as a 1045");
        };
        assert_eq!(msg.gal_satellite_id, 11);
        assert_eq!(msg.gal_week_number, 1250);
        assert_eq!(msg.iodnav, 77);
        assert_eq!(msg.toe_s as u32, 3600);
        assert!((msg.sqrt_a_sqrt_m - galileo.sqrt_a).abs() <= P2_19);
    }
}
