//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Station sensor feed generator with day and night ranges."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Stand-in for the ESP32 sensor nodes when no hardware is attached.

use chrono::{DateTime, FixedOffset, Timelike, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::frames::SensorReading;

const DAYLIGHT_HOURS: std::ops::RangeInclusive<u32> = 6..=18;

/// Station registered with the sensor feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedStation {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl FeedStation {
    fn new(id: &str, name: &str, lat: f64, lng: f64) -> Self {
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            lat,
            lng,
        }
    }
}

pub fn default_feed_stations() -> Vec<FeedStation> {
    vec![
        FeedStation::new("STATION_001", "Downtown Station", 40.7128, -74.0060),
        FeedStation::new("STATION_002", "Mall Station", 40.7589, -73.9851),
        FeedStation::new("STATION_003", "Airport Station", 40.6413, -73.7781),
        FeedStation::new("STATION_004", "University Station", 40.8176, -73.7004),
    ]
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Produces day/night aware readings in the ESP32 payload shape.
#[derive(Debug, Clone)]
pub struct SensorFeedGenerator {
    offset: FixedOffset,
}

impl SensorFeedGenerator {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    pub fn is_daytime(&self, now: DateTime<Utc>) -> bool {
        DAYLIGHT_HOURS.contains(&now.with_timezone(&self.offset).hour())
    }

    pub fn reading<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        station_id: &str,
        now: DateTime<Utc>,
    ) -> SensorReading {
        let (base_voltage, base_current): (f64, f64) = if self.is_daytime(now) {
            (rng.gen_range(23.0..26.0), rng.gen_range(5.0..15.0))
        } else {
            (rng.gen_range(20.0..23.0), rng.gen_range(0.0..3.0))
        };

        let voltage = base_voltage + rng.gen_range(-2.0..2.0);
        let current_dc = (base_current + rng.gen_range(-2.0..2.0)).max(0.0);
        let current_ac = rng.gen_range(0.0..8.0);
        let temperature = rng.gen_range(18.0..35.0);
        let humidity = rng.gen_range(30.0..80.0);
        let power = voltage * current_dc;

        let is_charging = current_ac > 2.0;
        let battery_level = if is_charging {
            rng.gen_range(20.0..100.0)
        } else {
            rng.gen_range(50.0..100.0)
        };

        SensorReading {
            station_id: station_id.to_owned(),
            timestamp: now,
            voltage: round_to(voltage, 2),
            current_dc: round_to(current_dc, 2),
            current_ac: round_to(current_ac, 2),
            power: round_to(power, 2),
            temperature: round_to(temperature, 1),
            humidity: round_to(humidity, 1),
            battery_level: round_to(battery_level, 1),
            is_charging,
            energy_generated: round_to(power * 0.1, 2),
            efficiency: round_to(rng.gen_range(85.0..95.0), 1),
        }
    }
}
