use clap::{Arg, ArgAction, ArgMatches, ColorChoice, Command};

use std::net::IpAddr;

use rtcm_caster::prelude::{Duration, ServerSettings};

use crate::config::StationConfig;

pub struct Cli {
    /// Arguments passed by user
    matches: ArgMatches,
}

impl Cli {
    /// Build new command line interface
    pub fn new() -> Self {
        Self {
            matches: {
                Command::new("rtcm-caster")
                    .author("Guillaume W. Bres, <guillaume.bressaix@gmail.com>")
                    .version(env!("CARGO_PKG_VERSION"))
                    .about("RTCM 3 caster: broadcasts reference station messages over TCP")
                    .color(ColorChoice::Always)
                    .next_help_heading("Server")
                    .arg(
                        Arg::new("port")
                            .short('p')
                            .long("port")
                            .value_name("PORT")
                            .help("Listening port. Default is 2101"),
                    )
                    .arg(
                        Arg::new("bind")
                            .long("bind")
                            .value_name("ADDRESS")
                            .help("Listening address. Default is 0.0.0.0"),
                    )
                    .arg(
                        Arg::new("raw")
                            .long("raw")
                            .action(ArgAction::SetTrue)
                            .help("Serve bare RTCM frames. By default, each frame is preceded by a \"GSdddd\" length header."),
                    )
                    .next_help_heading("Reference station")
                    .arg(
                        Arg::new("config")
                            .short('c')
                            .long("config")
                            .value_name("FILE")
                            .help("Station configuration (JSON): coordinates, antenna, constellations."),
                    )
                    .arg(
                        Arg::new("station-id")
                            .short('s')
                            .long("station-id")
                            .value_name("ID")
                            .help("Reference station ID (0-4095). Overrides the configuration file."),
                    )
                    .arg(
                        Arg::new("period")
                            .long("period")
                            .value_name("DURATION")
                            .help("Station messages (1005/1006, 1008, 1029) period. Default is 10 s"),
                    )
                    .arg(
                        Arg::new("text")
                            .short('t')
                            .long("text")
                            .value_name("TEXT")
                            .help("Text message (1029) appended to every station cycle"),
                    )
                    .next_help_heading("Ingest")
                    .arg(
                        Arg::new("file")
                            .short('f')
                            .long("file")
                            .action(ArgAction::Append)
                            .value_name("FILE")
                            .help("RTCM file to republish (gzip compressed files are supported). Can be repeated."),
                    )
                    .get_matches()
            },
        }
    }

    pub fn filepaths(&self) -> Vec<&String> {
        if let Some(files) = self.matches.get_many::<String>("file") {
            files.collect()
        } else {
            vec![]
        }
    }

    fn port(&self) -> u16 {
        if let Some(port) = self.matches.get_one::<String>("port") {
            port.trim()
                .parse::<u16>()
                .unwrap_or_else(|e| panic!("Invalid port: {}", e))
        } else {
            2101
        }
    }

    fn address(&self) -> IpAddr {
        if let Some(address) = self.matches.get_one::<String>("bind") {
            address
                .trim()
                .parse::<IpAddr>()
                .unwrap_or_else(|e| panic!("Invalid address: {}", e))
        } else {
            ServerSettings::default().address
        }
    }

    pub fn server_settings(&self) -> ServerSettings {
        ServerSettings {
            port: self.port(),
            address: self.address(),
            raw: self.matches.get_flag("raw"),
        }
    }

    pub fn station_config(&self) -> StationConfig {
        let mut config = if let Some(path) = self.matches.get_one::<String>("config") {
            StationConfig::from_file(path)
        } else {
            StationConfig::default()
        };

        if let Some(id) = self.matches.get_one::<String>("station-id") {
            config.station_id = id
                .trim()
                .parse::<u16>()
                .unwrap_or_else(|e| panic!("Invalid station ID: {}", e));
        }

        assert!(
            config.station_id < 4096,
            "Invalid station ID: {} does not fit in 12 bits",
            config.station_id
        );

        config
    }

    pub fn period(&self) -> Duration {
        if let Some(period) = self.matches.get_one::<String>("period") {
            let dt = period
                .trim()
                .parse::<Duration>()
                .unwrap_or_else(|e| panic!("Invalid duration: {}", e));

            if dt.total_nanoseconds() < 1_000_000_000 {
                panic!("Station period is limited to 1s");
            }
            dt
        } else {
            Duration::from_seconds(10.0)
        }
    }

    pub fn text(&self) -> Option<&String> {
        self.matches.get_one::<String>("text")
    }
}
