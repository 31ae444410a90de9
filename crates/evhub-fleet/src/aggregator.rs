//! ---
//! ems_section: "04-fleet-aggregation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Charging fleet model and derived metrics."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::station::{ChargingStation, StationStatus, COMPLETE_LABEL};

/// Nameplate capacity assumed for every bay.
pub const STATION_CAPACITY_KW: f64 = 50.0;

/// Load approximation: each percent of session progress counts as 0.5 kW.
pub const LOAD_COEFFICIENT_KW: f64 = 0.5;

/// Upper bound (exclusive) of the random per-tick progress increment.
pub const DEFAULT_MAX_PROGRESS_STEP: f64 = 2.0;

const PROGRESS_CEILING: f64 = 100.0;

/// What happens to a station whose session saturates at 100 %.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum CompletionPolicy {
    /// Label flips to "Complete" while the status stays `Charging`.
    #[default]
    HoldCharging,
    /// Label flips to "Complete" and the bay is released to `Available`.
    ReleaseToAvailable,
}

/// Advances charging sessions on every dashboard tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FleetAggregator {
    max_step: f64,
    completion: CompletionPolicy,
}

impl Default for FleetAggregator {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_PROGRESS_STEP, CompletionPolicy::default())
    }
}

impl FleetAggregator {
    pub fn new(max_step: f64, completion: CompletionPolicy) -> Self {
        Self {
            max_step: max_step.max(0.0),
            completion,
        }
    }

    /// Produce the next station collection, drawing each increment from
    /// `[0, max_step)`. The input slice is left untouched.
    pub fn advance<R: Rng + ?Sized>(
        &self,
        stations: &[ChargingStation],
        rng: &mut R,
    ) -> Vec<ChargingStation> {
        let max_step = self.max_step;
        self.advance_with(stations, |_| rng.gen::<f64>() * max_step)
    }

    /// Same mapping as [`FleetAggregator::advance`] with the increment
    /// supplied by the caller. Only invoked for charging stations.
    pub fn advance_with<F>(&self, stations: &[ChargingStation], mut increment: F) -> Vec<ChargingStation>
    where
        F: FnMut(&ChargingStation) -> f64,
    {
        stations
            .iter()
            .map(|station| {
                if !station.is_charging() {
                    return station.clone();
                }
                let step = increment(station).max(0.0);
                let progress = (station.progress_percent + step).min(PROGRESS_CEILING);
                let mut next = station.clone();
                next.progress_percent = progress;
                if progress >= PROGRESS_CEILING {
                    if !station.is_complete() {
                        info!(station_id = station.id, station = %station.name, "charging session complete");
                    }
                    next.time_remaining = COMPLETE_LABEL.to_owned();
                    if self.completion == CompletionPolicy::ReleaseToAvailable {
                        next.status = StationStatus::Available;
                    }
                } else {
                    debug!(station_id = station.id, progress, "charging progress advanced");
                }
                next
            })
            .collect()
    }
}

/// Fleet-level figures derived from a station collection.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FleetSummary {
    pub station_count: usize,
    pub active_station_count: usize,
    pub total_capacity_kilowatts: f64,
    pub current_load_kilowatts: f64,
    /// Share of bays currently charging, rounded to a whole percent.
    pub active_percentage: u32,
    /// Current load as a percentage of nameplate capacity.
    pub load_percentage: f64,
}

/// Recompute the fleet summary. Pure; nothing is cached.
pub fn summarize(stations: &[ChargingStation]) -> FleetSummary {
    let (active_station_count, progress_sum) = stations
        .iter()
        .filter(|station| station.is_charging())
        .fold((0usize, 0.0f64), |(count, sum), station| {
            (count + 1, sum + station.progress_percent)
        });
    let station_count = stations.len();
    let total_capacity_kilowatts = station_count as f64 * STATION_CAPACITY_KW;
    let current_load_kilowatts = progress_sum * LOAD_COEFFICIENT_KW;
    let active_percentage = if station_count == 0 {
        0
    } else {
        (active_station_count as f64 / station_count as f64 * 100.0).round() as u32
    };
    let load_percentage = if total_capacity_kilowatts <= 0.0 {
        0.0
    } else {
        current_load_kilowatts * 100.0 / total_capacity_kilowatts
    };
    FleetSummary {
        station_count,
        active_station_count,
        total_capacity_kilowatts,
        current_load_kilowatts,
        active_percentage,
        load_percentage,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::station::default_fleet;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn charging(id: u32, progress: f64) -> ChargingStation {
        ChargingStation::new(id, format!("Bay {id}"), StationStatus::Charging, progress, "30 min")
    }

    #[test]
    fn saturating_increment_marks_session_complete() {
        let aggregator = FleetAggregator::default();
        let next = aggregator.advance_with(&[charging(1, 98.0)], |_| 2.0);
        assert_eq!(next[0].progress_percent, 100.0);
        assert_eq!(next[0].time_remaining, COMPLETE_LABEL);
        assert_eq!(next[0].status, StationStatus::Charging);
    }

    #[test]
    fn available_station_is_returned_unchanged() {
        let station =
            ChargingStation::new(2, "Station Beta", StationStatus::Available, 0.0, "0 min");
        let next = FleetAggregator::default().advance_with(&[station.clone()], |_| 1.5);
        assert_eq!(next, vec![station]);
    }

    #[test]
    fn input_collection_is_not_modified() {
        let fleet = default_fleet();
        let before = fleet.clone();
        let mut rng = StdRng::seed_from_u64(7);
        let next = FleetAggregator::default().advance(&fleet, &mut rng);
        assert_eq!(fleet, before);
        assert_eq!(next.len(), fleet.len());
    }

    #[test]
    fn progress_beyond_ceiling_is_clamped() {
        let next = FleetAggregator::default().advance_with(&[charging(1, 140.0)], |_| 0.5);
        assert_eq!(next[0].progress_percent, 100.0);
        assert!(next[0].is_complete());
    }

    #[test]
    fn negative_increment_never_decreases_progress() {
        let next = FleetAggregator::default().advance_with(&[charging(1, 40.0)], |_| -3.0);
        assert_eq!(next[0].progress_percent, 40.0);
    }

    #[test]
    fn release_policy_frees_the_bay() {
        let aggregator = FleetAggregator::new(2.0, CompletionPolicy::ReleaseToAvailable);
        let next = aggregator.advance_with(&[charging(1, 99.5)], |_| 1.0);
        assert_eq!(next[0].status, StationStatus::Available);
        assert!(next[0].is_complete());
        assert_eq!(summarize(&next).active_station_count, 0);
    }

    #[test]
    fn random_steps_stay_below_max_step() {
        let aggregator = FleetAggregator::default();
        let mut rng = StdRng::seed_from_u64(99);
        let fleet = vec![charging(1, 10.0)];
        let next = aggregator.advance(&fleet, &mut rng);
        let delta = next[0].progress_percent - 10.0;
        assert!((0.0..DEFAULT_MAX_PROGRESS_STEP).contains(&delta));
    }

    #[test]
    fn summary_matches_dashboard_formula() {
        let summary = summarize(&default_fleet());
        assert_eq!(summary.active_station_count, 2);
        assert_eq!(summary.total_capacity_kilowatts, 200.0);
        assert_eq!(summary.current_load_kilowatts, 53.5);
        assert_eq!(summary.active_percentage, 50);
        assert!((summary.load_percentage - 26.75).abs() < 1e-9);
    }

    #[test]
    fn empty_fleet_summary_is_zeroed() {
        let summary = summarize(&[]);
        assert_eq!(summary.station_count, 0);
        assert_eq!(summary.active_percentage, 0);
        assert_eq!(summary.load_percentage, 0.0);
    }
}
