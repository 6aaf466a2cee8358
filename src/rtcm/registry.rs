//! Message type registry: every supported message type maps to the
//! function that builds it out of a [Context].
use gnss::prelude::Constellation;

use crate::rtcm::{
    Error,
    ephemeris::{Ephemerides, GlonassUtcModel},
    frame::Frame,
    legacy::{RtkContent, build_rtk_observables},
    lock::LockTimeTable,
    msm::{MsmKind, build_msm, build_msm_epoch},
    navigation::{build_1019, build_1020, build_1045},
    observation::{ObservationSettings, Observations},
    ssr::{IGS_SSR_MESSAGE, SsrCorrections, build_igm01, build_igm02, build_igm03, build_igm05},
    station::{AntennaDescriptor, StationArp, build_1005, build_1006, build_1008, build_1029},
};

/// Supported message types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    /// 1001 to 1004 (GPS), 1009 to 1012 (GLONASS)
    Rtk(RtkContent, Constellation),
    /// 1005
    StationArp,
    /// 1006
    StationArpHeight,
    /// 1008
    AntennaDescriptor,
    /// 1029
    Text,
    /// 1019
    GpsEphemeris,
    /// 1020
    GlonassEphemeris,
    /// 1045
    GalileoEphemeris,
    /// 1071-1077, 1081-1087, 1091-1097
    Msm(MsmKind, Constellation),
    /// One MSM per constellation present in the epoch
    MsmEpoch(MsmKind),
    /// IGS SSR orbit corrections
    Igm01,
    /// IGS SSR clock corrections
    Igm02,
    /// IGS SSR combined orbit and clock corrections
    Igm03,
    /// IGS SSR code biases
    Igm05,
}

/// Message builder
type BuildFn = fn(&MessageType, &mut LockTimeTable, &Context) -> Result<Vec<Frame>, Error>;

const RTK_CONTENTS: [RtkContent; 4] = [
    RtkContent::L1,
    RtkContent::ExtendedL1,
    RtkContent::L1L2,
    RtkContent::ExtendedL1L2,
];

const MSM_KINDS: [MsmKind; 7] = [
    MsmKind::Msm1,
    MsmKind::Msm2,
    MsmKind::Msm3,
    MsmKind::Msm4,
    MsmKind::Msm5,
    MsmKind::Msm6,
    MsmKind::Msm7,
];

impl MessageType {
    /// Identifies a message type from its message number.
    /// IGS SSR messages share number 4076 and cannot be identified this way.
    pub fn from_number(number: u16) -> Option<Self> {
        match number {
            1001..=1004 => Some(Self::Rtk(
                RTK_CONTENTS[(number - 1001) as usize],
                Constellation::GPS,
            )),
            1009..=1012 => Some(Self::Rtk(
                RTK_CONTENTS[(number - 1009) as usize],
                Constellation::Glonass,
            )),
            1005 => Some(Self::StationArp),
            1006 => Some(Self::StationArpHeight),
            1008 => Some(Self::AntennaDescriptor),
            1029 => Some(Self::Text),
            1019 => Some(Self::GpsEphemeris),
            1020 => Some(Self::GlonassEphemeris),
            1045 => Some(Self::GalileoEphemeris),
            1071..=1077 => Some(Self::Msm(
                MSM_KINDS[(number - 1071) as usize],
                Constellation::GPS,
            )),
            1081..=1087 => Some(Self::Msm(
                MSM_KINDS[(number - 1081) as usize],
                Constellation::Glonass,
            )),
            1091..=1097 => Some(Self::Msm(
                MSM_KINDS[(number - 1091) as usize],
                Constellation::Galileo,
            )),
            _ => None,
        }
    }

    /// Message number. [Self::MsmEpoch] reports its GPS number.
    pub fn number(&self) -> u16 {
        match self {
            Self::Rtk(content, constellation) => content.message_number(*constellation).unwrap_or(0),
            Self::StationArp => 1005,
            Self::StationArpHeight => 1006,
            Self::AntennaDescriptor => 1008,
            Self::Text => 1029,
            Self::GpsEphemeris => 1019,
            Self::GlonassEphemeris => 1020,
            Self::GalileoEphemeris => 1045,
            Self::Msm(kind, constellation) => kind.message_number(*constellation).unwrap_or(0),
            Self::MsmEpoch(kind) => 1070 + kind.number(),
            Self::Igm01 | Self::Igm02 | Self::Igm03 | Self::Igm05 => IGS_SSR_MESSAGE,
        }
    }

    fn builder(&self) -> BuildFn {
        match self {
            Self::Rtk(..) => build_rtk,
            Self::StationArp | Self::StationArpHeight => build_arp,
            Self::AntennaDescriptor => build_antenna,
            Self::Text => build_text,
            Self::GpsEphemeris | Self::GlonassEphemeris | Self::GalileoEphemeris => {
                build_ephemeris
            },
            Self::Msm(..) | Self::MsmEpoch(..) => build_msm_frames,
            Self::Igm01 | Self::Igm02 | Self::Igm03 | Self::Igm05 => build_ssr,
        }
    }
}

impl std::fmt::Display for MessageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Igm01 => write!(f, "IGM01"),
            Self::Igm02 => write!(f, "IGM02"),
            Self::Igm03 => write!(f, "IGM03"),
            Self::Igm05 => write!(f, "IGM05"),
            Self::MsmEpoch(kind) => write!(f, "MSM{}", kind.number()),
            _ => write!(f, "{}", self.number()),
        }
    }
}

/// Everything a message may be built from
#[derive(Debug, Default, Clone, Copy)]
pub struct Context<'a> {
    pub ephemerides: Ephemerides<'a>,
    /// Receiver time of week (s)
    pub obs_time: f64,
    pub observations: Option<&'a Observations>,
    pub settings: ObservationSettings,
    pub station: Option<&'a StationArp>,
    pub antenna: Option<&'a AntennaDescriptor>,
    pub text: Option<&'a str>,
    pub glonass_utc: Option<&'a GlonassUtcModel>,
    pub ssr: Option<&'a SsrCorrections>,
}

impl<'a> Context<'a> {
    fn observations(&self) -> Result<&'a Observations, Error> {
        self.observations.ok_or(Error::MissingInput("observations"))
    }
}

fn build_rtk(
    msg: &MessageType,
    lock: &mut LockTimeTable,
    ctx: &Context,
) -> Result<Vec<Frame>, Error> {
    let MessageType::Rtk(content, constellation) = msg else {
        return Err(Error::MissingInput("observation content"));
    };
    let frame = build_rtk_observables(
        lock,
        *content,
        *constellation,
        &ctx.ephemerides,
        ctx.obs_time,
        ctx.observations()?,
        &ctx.settings,
    )?;
    Ok(vec![frame])
}

fn build_arp(msg: &MessageType, _: &mut LockTimeTable, ctx: &Context) -> Result<Vec<Frame>, Error> {
    let station = ctx.station.ok_or(Error::MissingInput("station"))?;
    let frame = if *msg == MessageType::StationArpHeight {
        build_1006(station)?
    } else {
        build_1005(station)?
    };
    Ok(vec![frame])
}

fn build_antenna(_: &MessageType, _: &mut LockTimeTable, ctx: &Context) -> Result<Vec<Frame>, Error> {
    let antenna = ctx.antenna.ok_or(Error::MissingInput("antenna descriptor"))?;
    Ok(vec![build_1008(antenna)?])
}

fn build_text(_: &MessageType, _: &mut LockTimeTable, ctx: &Context) -> Result<Vec<Frame>, Error> {
    let text = ctx.text.ok_or(Error::MissingInput("text"))?;
    let eph = ctx.ephemerides.gps.ok_or(Error::MissingEphemeris("GPS"))?;
    Ok(vec![build_1029(ctx.settings.station_id, eph, ctx.obs_time, text)?])
}

fn build_ephemeris(
    msg: &MessageType,
    _: &mut LockTimeTable,
    ctx: &Context,
) -> Result<Vec<Frame>, Error> {
    let eph = &ctx.ephemerides;
    let frame = match msg {
        MessageType::GlonassEphemeris => {
            let glonass = eph.glonass.ok_or(Error::MissingEphemeris("GLONASS"))?;
            let utc = ctx.glonass_utc.copied().unwrap_or_default();
            build_1020(glonass, &utc)?
        },
        MessageType::GalileoEphemeris => {
            build_1045(eph.galileo.ok_or(Error::MissingEphemeris("Galileo"))?)?
        },
        _ => build_1019(eph.gps.ok_or(Error::MissingEphemeris("GPS"))?)?,
    };
    Ok(vec![frame])
}

fn build_msm_frames(
    msg: &MessageType,
    lock: &mut LockTimeTable,
    ctx: &Context,
) -> Result<Vec<Frame>, Error> {
    let observations = ctx.observations()?;
    match msg {
        MessageType::Msm(kind, constellation) => Ok(vec![build_msm(
            lock,
            *kind,
            *constellation,
            &ctx.ephemerides,
            ctx.obs_time,
            observations,
            &ctx.settings,
        )?]),
        MessageType::MsmEpoch(kind) => build_msm_epoch(
            lock,
            *kind,
            &ctx.ephemerides,
            ctx.obs_time,
            observations,
            &ctx.settings,
        ),
        _ => Err(Error::MissingInput("MSM kind")),
    }
}

fn build_ssr(msg: &MessageType, _: &mut LockTimeTable, ctx: &Context) -> Result<Vec<Frame>, Error> {
    let ssr = ctx.ssr.ok_or(Error::MissingInput("SSR corrections"))?;
    match msg {
        MessageType::Igm01 => build_igm01(ssr),
        MessageType::Igm02 => build_igm02(ssr),
        MessageType::Igm03 => build_igm03(ssr),
        _ => build_igm05(ssr),
    }
}

/// Stateful message encoder: owns the lock time table shared by
/// every observation message it builds.
#[derive(Debug, Default, Clone)]
pub struct Encoder {
    lock: LockTimeTable,
}

impl Encoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lock_table(&self) -> &LockTimeTable {
        &self.lock
    }

    /// Builds one message type. Most types produce a single frame,
    /// [MessageType::MsmEpoch] and the SSR messages may produce several.
    pub fn build(&mut self, msg: MessageType, ctx: &Context) -> Result<Vec<Frame>, Error> {
        (msg.builder())(&msg, &mut self.lock, ctx)
    }
}
