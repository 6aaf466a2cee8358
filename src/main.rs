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

use env_logger::{Builder, Target};

use log::{debug, error, info, warn};

use tokio::{signal, sync::mpsc};

use std::io::Read;

use rtcm_caster::{
    prelude::{
        Context, Duration, Encoder, Epoch, Frame, FrameSplitter, GalileoEphemeris,
        GlonassEphemeris, GlonassUtcModel, GpsEphemeris, MessageType, Publisher, RtcmError,
        Server, StationArp, TimeScale, build_1029_at, read_1005, read_1019, read_1020,
        read_1045,
    },
    utils::to_hex,
};

mod cli;
mod config;
mod input;
mod runtime;

use crate::{
    cli::Cli,
    config::StationConfig,
    input::{Input, Inputs},
    runtime::Runtime,
};

/// Builds one cycle of station messages: antenna reference point,
/// antenna descriptor and text, when available.
fn station_messages(
    encoder: &mut Encoder,
    station: &StationConfig,
    text: Option<&str>,
    t: Epoch,
) -> Vec<Result<Frame, RtcmError>> {
    let arp = station.arp();
    let antenna = station.antenna();

    let ctx = Context {
        station: Some(&arp),
        antenna: antenna.as_ref(),
        ..Default::default()
    };

    let arp_msg = if station.antenna_height_m > 0.0 {
        MessageType::StationArpHeight
    } else {
        MessageType::StationArp
    };

    let mut messages = vec![arp_msg];
    if antenna.is_some() {
        messages.push(MessageType::AntennaDescriptor);
    }

    let mut frames = Vec::with_capacity(3);

    for msg in messages {
        match encoder.build(msg, &ctx) {
            Ok(built) => frames.extend(built.into_iter().map(Ok)),
            Err(e) => frames.push(Err(e)),
        }
    }

    if let Some(text) = text {
        frames.push(build_1029_at(station.station_id, t, text));
    }

    frames
}

/// Logs the content of frames we know how to read
fn describe(frame: &Frame) -> Result<(), RtcmError> {
    match frame.message_number() {
        1005 | 1006 => {
            let mut arp = StationArp::default();
            read_1005(frame.as_bytes(), &mut arp)?;
            info!(
                "station #{} - ARP x={:.4}m y={:.4}m z={:.4}m",
                arp.station_id, arp.x_m, arp.y_m, arp.z_m
            );
        },
        1019 => {
            let mut eph = GpsEphemeris::default();
            read_1019(frame.as_bytes(), &mut eph)?;
            info!("G{:02} - ephemeris week={} toe={}", eph.prn, eph.week, eph.toe);
            debug!("{:?}", eph);
        },
        1020 => {
            let mut eph = GlonassEphemeris::default();
            let mut utc = GlonassUtcModel::default();
            read_1020(frame.as_bytes(), &mut eph, &mut utc)?;
            info!("R{:02} - ephemeris tb={}s", eph.slot, eph.tb);
            debug!("{:?}", eph);
        },
        1045 => {
            let mut eph = GalileoEphemeris::default();
            read_1045(frame.as_bytes(), &mut eph)?;
            info!("E{:02} - ephemeris week={} toe={}", eph.prn, eph.week, eph.toe);
            debug!("{:?}", eph);
        },
        msg => {
            debug!("{} - {} bytes", msg, frame.len());
        },
    }
    Ok(())
}

/// Splits the input files into RTCM frames
fn ingest(mut inputs: Inputs, tx: mpsc::Sender<Frame>) {
    let mut buffer = [0; 4096];
    let mut splitter = FrameSplitter::new();

    loop {
        match inputs.read(&mut buffer) {
            Ok(0) => break,
            Ok(size) => {
                splitter.extend(&buffer[..size]);

                for frame in splitter.by_ref() {
                    if tx.blocking_send(frame).is_err() {
                        return;
                    }
                }
            },
            Err(e) => {
                error!("I/O error: {}", e);
                break;
            },
        }
    }

    if splitter.dropped > 0 {
        warn!("{} bytes did not belong to any valid frame", splitter.dropped);
    }
}

fn publish(rtm: &mut Runtime, publisher: &Publisher, frame: Frame) {
    debug!("publishing {}", to_hex(frame.as_bytes()));
    rtm.published(&frame);

    if let Err(e) = publisher.publish(frame.into_bytes()) {
        error!("failed to publish: {}", e);
    }
}

#[tokio::main]
pub async fn main() {
    let mut builder = Builder::from_default_env();

    builder
        .target(Target::Stdout)
        .format_timestamp_secs()
        .format_module_path(false)
        .init();

    let cfg_precision = Duration::from_seconds(1.0);

    let t_utc = Epoch::now()
        .unwrap_or_else(|e| panic!("Failed to determine system time: {}", e))
        .to_time_scale(TimeScale::UTC);

    // cli
    let cli = Cli::new();

    let station = cli.station_config();
    let period = cli.period();
    let text = cli.text().cloned();

    // input files
    let mut inputs = Inputs::new();
    for path in cli.filepaths() {
        inputs.stack(Input::open(path));
    }

    let mut ingesting = !inputs.is_empty();
    let (ingest_tx, mut ingest_rx) = mpsc::channel(128);

    if ingesting {
        tokio::task::spawn_blocking(move || ingest(inputs, ingest_tx));
    }

    // server
    let mut server = Server::new(cli.server_settings());

    server
        .run()
        .unwrap_or_else(|e| panic!("Failed to deploy server: {}", e));

    let publisher = server
        .publisher()
        .unwrap_or_else(|e| panic!("Failed to obtain publisher: {}", e));

    let mut encoder = Encoder::new();
    let mut rtm = Runtime::new(t_utc);

    let mut beacon = tokio::time::interval(std::time::Duration::from_nanos(
        period.total_nanoseconds() as u64,
    ));

    let ctrl_c = signal::ctrl_c();
    tokio::pin!(ctrl_c);

    info!(
        "{} - station #{} deployed",
        t_utc.round(cfg_precision),
        station.station_id
    );

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                break;
            },
            _ = beacon.tick() => {
                let t = Epoch::now()
                    .unwrap_or_else(|e| panic!("Failed to determine system time: {}", e))
                    .to_time_scale(TimeScale::UTC);

                rtm.new_epoch(t);

                for built in station_messages(&mut encoder, &station, text.as_deref(), t) {
                    match built {
                        Ok(frame) => publish(&mut rtm, &publisher, frame),
                        Err(e) => {
                            error!("{} - station message error: {}", t.round(cfg_precision), e);
                            rtm.rejected();
                        },
                    }
                }

                debug!(
                    "{} - {} session(s), {} delivered",
                    t.round(cfg_precision),
                    server.sessions(),
                    server.delivered()
                );
            },
            frame = ingest_rx.recv(), if ingesting => match frame {
                Some(frame) => {
                    if let Err(e) = describe(&frame) {
                        warn!("{} - rejected frame: {}", frame.message_number(), e);
                        rtm.rejected();
                    } else {
                        publish(&mut rtm, &publisher, frame);
                    }
                },
                None => {
                    info!("consumed all content");
                    ingesting = false;
                },
            },
        }
    }

    info!("shutting down");

    if let Err(e) = server.stop() {
        error!("failed to stop server: {}", e);
    }

    rtm.report();
}
