//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Tick jitter measurement for the refresh timers."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

use crate::time::duration_to_micros;

#[derive(Debug, Default)]
pub struct JitterHistogram {
    samples: Mutex<Vec<u64>>,
}

impl JitterHistogram {
    pub fn record(&self, jitter: Duration) {
        self.samples.lock().push(duration_to_micros(jitter));
    }

    pub fn summary(&self) -> Option<JitterSummary> {
        let samples = self.samples.lock();
        if samples.is_empty() {
            return None;
        }
        let count = samples.len() as f64;
        let mean = samples.iter().map(|&v| v as f64).sum::<f64>() / count;
        let variance = if samples.len() > 1 {
            samples
                .iter()
                .map(|&v| {
                    let delta = v as f64 - mean;
                    delta * delta
                })
                .sum::<f64>()
                / (count - 1.0)
        } else {
            0.0
        };
        Some(JitterSummary {
            mean_us: mean,
            std_dev_us: variance.sqrt(),
            max_us: samples.iter().copied().max().unwrap_or_default(),
            min_us: samples.iter().copied().min().unwrap_or_default(),
            samples: samples.len() as u64,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct JitterSummary {
    pub mean_us: f64,
    pub std_dev_us: f64,
    pub max_us: u64,
    pub min_us: u64,
    pub samples: u64,
}

/// Measures tick spacing against the target period of a refresh timer.
#[derive(Debug)]
pub struct LoopTimingReporter {
    target_interval: Duration,
    last_tick: Mutex<Option<Instant>>,
    histogram: JitterHistogram,
}

impl LoopTimingReporter {
    pub fn new(target_interval: Duration) -> Self {
        Self {
            target_interval,
            last_tick: Mutex::new(None),
            histogram: JitterHistogram::default(),
        }
    }

    /// Record a tick observed at `now`; the first tick only sets the baseline.
    pub fn record_tick_at(&self, now: Instant) {
        let mut last_tick = self.last_tick.lock();
        if let Some(previous) = *last_tick {
            let actual = now.saturating_duration_since(previous);
            let jitter = if actual > self.target_interval {
                actual - self.target_interval
            } else {
                self.target_interval - actual
            };
            self.histogram.record(jitter);
        }
        *last_tick = Some(now);
    }

    pub fn histogram(&self) -> &JitterHistogram {
        &self.histogram
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_only_sets_baseline() {
        let reporter = LoopTimingReporter::new(Duration::from_millis(100));
        reporter.record_tick_at(Instant::now());
        assert!(reporter.histogram().summary().is_none());
    }

    #[test]
    fn jitter_is_measured_in_both_directions() {
        let reporter = LoopTimingReporter::new(Duration::from_millis(100));
        let start = Instant::now();
        reporter.record_tick_at(start);
        reporter.record_tick_at(start + Duration::from_millis(110));
        reporter.record_tick_at(start + Duration::from_millis(200));
        let summary = reporter.histogram().summary().unwrap();
        assert_eq!(summary.samples, 2);
        assert_eq!(summary.max_us, 10_000);
        assert_eq!(summary.min_us, 10_000);
        assert_eq!(summary.mean_us, 10_000.0);
    }
}
