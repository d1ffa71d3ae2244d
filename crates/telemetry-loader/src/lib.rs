//! Engine Telemetry Loader
//!
//! Parses C-MAPSS FD001-style run-to-failure telemetry into typed records.
//! Each row holds an engine id, a cycle index, three operational settings
//! and 21 sensor channels, separated by whitespace and without a header.

mod error;
mod loader;

pub use error::LoaderError;
pub use loader::TelemetryLoader;

use serde::{Deserialize, Serialize};

/// Number of operational setting columns
pub const SETTING_COUNT: usize = 3;

/// Number of sensor channels (addressed 1..=21)
pub const SENSOR_COUNT: usize = 21;

/// Total fields per row: id, cycle, settings, sensors
pub const COLUMN_COUNT: usize = 2 + SETTING_COUNT + SENSOR_COUNT;

/// Canonical column names in file order
pub const COLUMN_NAMES: [&str; COLUMN_COUNT] = [
    "engine_id",
    "cycle",
    "setting_1",
    "setting_2",
    "setting_3",
    "sensor_1",
    "sensor_2",
    "sensor_3",
    "sensor_4",
    "sensor_5",
    "sensor_6",
    "sensor_7",
    "sensor_8",
    "sensor_9",
    "sensor_10",
    "sensor_11",
    "sensor_12",
    "sensor_13",
    "sensor_14",
    "sensor_15",
    "sensor_16",
    "sensor_17",
    "sensor_18",
    "sensor_19",
    "sensor_20",
    "sensor_21",
];

/// Column names in file order
pub fn column_names() -> &'static [&'static str] {
    &COLUMN_NAMES
}

/// One engine cycle of telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryRecord {
    pub engine_id: u32,
    pub cycle: u32,
    pub settings: [f64; SETTING_COUNT],
    pub sensors: [f64; SENSOR_COUNT],
}

impl TelemetryRecord {
    /// Reading for a 1-based sensor channel
    pub fn sensor(&self, channel: usize) -> Option<f64> {
        channel
            .checked_sub(1)
            .and_then(|idx| self.sensors.get(idx))
            .copied()
    }

    /// Column name of a 1-based sensor channel
    pub fn sensor_name(channel: usize) -> Option<&'static str> {
        if (1..=SENSOR_COUNT).contains(&channel) {
            Some(COLUMN_NAMES[1 + SETTING_COUNT + channel])
        } else {
            None
        }
    }
}

impl Default for TelemetryRecord {
    fn default() -> Self {
        Self {
            engine_id: 0,
            cycle: 0,
            settings: [0.0; SETTING_COUNT],
            sensors: [0.0; SENSOR_COUNT],
        }
    }
}
