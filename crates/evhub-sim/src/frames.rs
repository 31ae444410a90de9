//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Telemetry, chart and sensor feed record types."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One synthetic dashboard reading. Replaced wholesale on every tick.
///
/// Field names on the wire keep the dashboard contract; units are watts,
/// percent, degrees Celsius, amps and volts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    #[serde(rename = "timestamp")]
    pub timestamp_utc: DateTime<Utc>,
    #[serde(rename = "solarPower")]
    pub solar_power_watts: f64,
    #[serde(rename = "batteryLevel")]
    pub battery_level_percent: f64,
    #[serde(rename = "temperature")]
    pub temperature_celsius: f64,
    #[serde(rename = "humidity")]
    pub humidity_percent: f64,
    #[serde(rename = "totalCurrent")]
    pub total_current_amps: f64,
    pub voltage: f64,
    #[serde(rename = "power")]
    pub power_watts: f64,
}

impl TelemetrySnapshot {
    pub fn solar_power_kilowatts(&self) -> f64 {
        self.solar_power_watts / 1000.0
    }
}

/// Hourly sample on the power analytics chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    /// Local wall-clock hour formatted as `HH:00`.
    pub time: String,
    pub solar_power: f64,
    pub consumption: f64,
    pub battery_level: f64,
}

/// Rolling 24 hour chart history, oldest point first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartHistory {
    pub generated_at: DateTime<Utc>,
    pub points: Vec<ChartPoint>,
}

/// Per-station reading in the shape posted by the ESP32 sensor nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub station_id: String,
    pub timestamp: DateTime<Utc>,
    pub voltage: f64,
    pub current_dc: f64,
    pub current_ac: f64,
    pub power: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub battery_level: f64,
    pub is_charging: bool,
    /// Energy generated over the last interval in kWh.
    pub energy_generated: f64,
    /// Solar panel efficiency in percent.
    pub efficiency: f64,
}
