use serde::Deserialize;

use std::{fs::File, io::BufReader};

use rtcm_caster::prelude::{AntennaDescriptor, StationArp};

/// Reference station description, loaded from JSON.
/// Missing fields take their default value.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StationConfig {
    /// Reference station ID
    pub station_id: u16,

    /// ITRF realization year
    pub itrf_year: u8,

    /// ECEF antenna reference point (m)
    pub x_m: f64,
    pub y_m: f64,
    pub z_m: f64,

    /// Antenna height above marker (m). Selects 1006 over 1005 when not null.
    pub antenna_height_m: f64,

    pub gps: bool,
    pub glonass: bool,
    pub galileo: bool,

    /// Antenna descriptor (1008)
    pub antenna: Option<String>,

    /// Antenna setup ID
    pub setup_id: u8,

    /// Antenna serial number
    pub serial_number: String,
}

impl StationConfig {
    pub fn from_file(path: &str) -> Self {
        let fd = File::open(path).unwrap_or_else(|e| panic!("Failed to open {}: {}", path, e));

        serde_json::from_reader(BufReader::new(fd))
            .unwrap_or_else(|e| panic!("Invalid station configuration {}: {}", path, e))
    }

    pub fn arp(&self) -> StationArp {
        StationArp {
            station_id: self.station_id,
            itrf_year: self.itrf_year,
            gps: self.gps,
            glonass: self.glonass,
            galileo: self.galileo,
            x_m: self.x_m,
            y_m: self.y_m,
            z_m: self.z_m,
            antenna_height_m: self.antenna_height_m,
            ..Default::default()
        }
    }

    pub fn antenna(&self) -> Option<AntennaDescriptor> {
        let descriptor = self.antenna.as_ref()?;
        Some(AntennaDescriptor {
            station_id: self.station_id,
            descriptor: descriptor.clone(),
            setup_id: self.setup_id,
            serial_number: self.serial_number.clone(),
        })
    }
}
