#![doc(
    html_logo_url = "https://raw.githubusercontent.com/nav-solutions/.github/master/logos/logo2.jpg"
)]
#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(clippy::type_complexity)]

/*
 * RTCM-CASTER is part of the nav-solutions framework.
 * Authors: Guillaume W. Bres <guillaume.bressaix@gmail.com> et al,
 * (cf. https://github.com/nav-solutions/rtcm-caster/graphs/contributors)
 * This framework is shipped under Mozilla Public V2 license.
 *
 * Documentation: https://github.com/nav-solutions/rtcm-caster
 */

extern crate gnss_rs as gnss;

pub mod rtcm;
pub mod server;
pub mod utils;

pub mod prelude {
    pub use crate::rtcm::{
        Error as RtcmError,
        bits::{BitReader, BitWriter},
        crc::{add_crc, check_crc, crc24q},
        ephemeris::{
            ConstellationTime, Ephemerides, GalileoEphemeris, GlonassEphemeris,
            GlonassUtcModel, GpsCnavEphemeris, GpsEphemeris,
        },
        frame::{Frame, FrameSplitter, build_message},
        legacy::{RtkContent, build_rtk_observables},
        lock::{
            LockBand, LockSlot, LockTimeTable, lock_time_indicator,
            msm_extended_lock_time_indicator, msm_lock_time_indicator,
        },
        msm::{MsmKind, build_msm, build_msm_epoch},
        navigation::{build_1019, build_1020, build_1045, read_1019, read_1020, read_1045},
        observation::{Observation, ObservationSettings, Observations, Signal},
        registry::{Context, Encoder, MessageType},
        ssr::{
            ClockCorrection, CodeBias, IGS_SSR_MESSAGE, OrbitCorrection, SatelliteCodeBiases,
            SsrCorrections, build_igm01, build_igm02, build_igm03, build_igm05, ssr_update_interval,
        },
        station::{
            AntennaDescriptor, StationArp, build_1005, build_1006, build_1008, build_1029,
            build_1029_at, read_1005,
        },
    };

    pub use crate::server::{
        Error as ServerError, Message, Publisher, Server, Settings as ServerSettings,
        packet::Packet,
    };

    pub use gnss::prelude::{Constellation, SV};
    pub use hifitime::prelude::{Duration, Epoch, TimeScale};
}
