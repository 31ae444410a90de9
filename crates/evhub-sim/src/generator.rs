//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dashboard telemetry and chart history generators."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
use std::f64::consts::PI;

use chrono::{DateTime, Duration, FixedOffset, Offset, Timelike, Utc};
use rand::Rng;
use rand_distr::{Distribution, Uniform};
use tracing::trace;

use crate::frames::{ChartHistory, ChartPoint, TelemetrySnapshot};

/// Number of hourly points on the analytics chart.
pub const CHART_HISTORY_HOURS: usize = 24;

const DIURNAL_AMPLITUDE_W: f64 = 2000.0;

/// Solar bias for a local hour: +1 at noon, 0 at 06:00 and 18:00, -1 at midnight.
pub fn diurnal_bias(hour: u32) -> f64 {
    ((f64::from(hour) - 6.0) * PI / 12.0).sin()
}

fn solar_with_bias(base: f64, hour: u32) -> f64 {
    (base + DIURNAL_AMPLITUDE_W * diurnal_bias(hour)).max(0.0)
}

/// Generates the headline dashboard snapshot.
///
/// Each field is drawn independently; solar power gets the diurnal term so
/// midday readings trend high and night readings trend toward zero. With
/// the +/-2 kW term on a 2-7 kW base, solar spans [0, 9000) W rather than
/// the flat 2-7 kW the original dashboard card drew.
#[derive(Debug, Clone)]
pub struct TelemetryGenerator {
    offset: FixedOffset,
    solar_w: Uniform<f64>,
    battery_pct: Uniform<f64>,
    temperature_c: Uniform<f64>,
    humidity_pct: Uniform<f64>,
    current_a: Uniform<f64>,
    voltage_v: Uniform<f64>,
    power_w: Uniform<f64>,
}

impl Default for TelemetryGenerator {
    fn default() -> Self {
        Self::new(utc_offset())
    }
}

fn utc_offset() -> FixedOffset {
    Utc.fix()
}

impl TelemetryGenerator {
    /// `offset` decides which local hour drives the diurnal term.
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            solar_w: Uniform::new(2000.0, 7000.0),
            battery_pct: Uniform::new(60.0, 100.0),
            temperature_c: Uniform::new(25.0, 35.0),
            humidity_pct: Uniform::new(40.0, 60.0),
            current_a: Uniform::new(10.0, 60.0),
            voltage_v: Uniform::new(220.0, 240.0),
            power_w: Uniform::new(5000.0, 15000.0),
        }
    }

    pub fn generate<R: Rng + ?Sized>(&self, rng: &mut R, now: DateTime<Utc>) -> TelemetrySnapshot {
        let hour = now.with_timezone(&self.offset).hour();
        let snapshot = TelemetrySnapshot {
            timestamp_utc: now,
            solar_power_watts: solar_with_bias(self.solar_w.sample(rng), hour),
            battery_level_percent: self.battery_pct.sample(rng),
            temperature_celsius: self.temperature_c.sample(rng),
            humidity_percent: self.humidity_pct.sample(rng),
            total_current_amps: self.current_a.sample(rng),
            voltage: self.voltage_v.sample(rng),
            power_watts: self.power_w.sample(rng),
        };
        trace!(hour, solar_w = snapshot.solar_power_watts, "telemetry snapshot generated");
        snapshot
    }
}

/// Generates the 24 hour power analytics history.
///
/// Uses its own ranges, distinct from [`TelemetryGenerator`]: battery stays
/// within 70-90 % here.
#[derive(Debug, Clone)]
pub struct ChartGenerator {
    offset: FixedOffset,
    solar_w: Uniform<f64>,
    consumption_w: Uniform<f64>,
    battery_pct: Uniform<f64>,
}

impl Default for ChartGenerator {
    fn default() -> Self {
        Self::new(utc_offset())
    }
}

impl ChartGenerator {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            solar_w: Uniform::new(1000.0, 4000.0),
            consumption_w: Uniform::new(500.0, 2500.0),
            battery_pct: Uniform::new(70.0, 90.0),
        }
    }

    pub fn point<R: Rng + ?Sized>(&self, rng: &mut R, at: DateTime<Utc>) -> ChartPoint {
        let local = at.with_timezone(&self.offset);
        let hour = local.hour();
        ChartPoint {
            time: format!("{:02}:00", hour),
            solar_power: solar_with_bias(self.solar_w.sample(rng), hour),
            consumption: self.consumption_w.sample(rng),
            battery_level: self.battery_pct.sample(rng),
        }
    }

    /// Points for the 23 preceding hours plus the current one, oldest first.
    pub fn history<R: Rng + ?Sized>(&self, rng: &mut R, now: DateTime<Utc>) -> ChartHistory {
        let points = (0..CHART_HISTORY_HOURS as i64)
            .rev()
            .map(|hours_ago| self.point(&mut *rng, now - Duration::hours(hours_ago)))
            .collect();
        ChartHistory {
            generated_at: now,
            points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 21, hour, 0, 0).unwrap()
    }

    #[test]
    fn diurnal_bias_peaks_at_noon() {
        assert!((diurnal_bias(12) - 1.0).abs() < 1e-9);
        assert!(diurnal_bias(6).abs() < 1e-9);
        assert!((diurnal_bias(0) + 1.0).abs() < 1e-9);
    }

    #[test]
    fn snapshot_fields_stay_in_range() {
        let generator = TelemetryGenerator::default();
        let mut rng = StdRng::seed_from_u64(42);
        for hour in 0..24 {
            let snapshot = generator.generate(&mut rng, at_hour(hour));
            assert!(snapshot.solar_power_watts >= 0.0);
            assert!(snapshot.solar_power_watts < 9000.0);
            assert!((60.0..=100.0).contains(&snapshot.battery_level_percent));
            assert!((25.0..=35.0).contains(&snapshot.temperature_celsius));
            assert!((40.0..=60.0).contains(&snapshot.humidity_percent));
            assert!((10.0..=60.0).contains(&snapshot.total_current_amps));
            assert!((220.0..=240.0).contains(&snapshot.voltage));
            assert!((5000.0..=15000.0).contains(&snapshot.power_watts));
            assert_eq!(snapshot.timestamp_utc, at_hour(hour));
        }
    }

    #[test]
    fn midday_solar_exceeds_base_range_floor() {
        let generator = TelemetryGenerator::default();
        let mut rng = StdRng::seed_from_u64(3);
        let snapshot = generator.generate(&mut rng, at_hour(12));
        assert!(snapshot.solar_power_watts >= 4000.0);
    }

    #[test]
    fn offset_shifts_the_diurnal_hour() {
        let east = FixedOffset::east_opt(6 * 3600).unwrap();
        let generator = ChartGenerator::new(east);
        let mut rng = StdRng::seed_from_u64(1);
        let point = generator.point(&mut rng, at_hour(6));
        assert_eq!(point.time, "12:00");
    }

    #[test]
    fn chart_history_covers_a_day_oldest_first() {
        let generator = ChartGenerator::default();
        let mut rng = StdRng::seed_from_u64(5);
        let history = generator.history(&mut rng, at_hour(10));
        assert_eq!(history.points.len(), CHART_HISTORY_HOURS);
        assert_eq!(history.points.first().unwrap().time, "11:00");
        assert_eq!(history.points.last().unwrap().time, "10:00");
        for point in &history.points {
            assert!((70.0..=90.0).contains(&point.battery_level));
            assert!((500.0..=2500.0).contains(&point.consumption));
            assert!(point.solar_power >= 0.0);
        }
    }
}
