//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Render surfaces for dashboard and chart frames."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::io::Write;

use evhub_sim::ChartHistory;
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::state::DashboardFrame;

/// Destination for frames produced by the refresh timers.
///
/// Called from the timer tasks, so implementations must not block for long.
pub trait RenderSurface: Send + Sync {
    fn render_dashboard(&self, frame: &DashboardFrame);

    fn render_chart(&self, history: &ChartHistory);
}

/// Publishes the latest frames on `watch` channels for in-process consumers.
#[derive(Debug)]
pub struct WatchSurface {
    dashboard: watch::Sender<Option<DashboardFrame>>,
    chart: watch::Sender<Option<ChartHistory>>,
}

impl Default for WatchSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSurface {
    pub fn new() -> Self {
        let (dashboard, _) = watch::channel(None);
        let (chart, _) = watch::channel(None);
        Self { dashboard, chart }
    }

    pub fn subscribe_dashboard(&self) -> watch::Receiver<Option<DashboardFrame>> {
        self.dashboard.subscribe()
    }

    pub fn latest_dashboard(&self) -> Option<DashboardFrame> {
        self.dashboard.borrow().clone()
    }

    pub fn latest_chart(&self) -> Option<ChartHistory> {
        self.chart.borrow().clone()
    }
}

impl RenderSurface for WatchSurface {
    fn render_dashboard(&self, frame: &DashboardFrame) {
        self.dashboard.send_replace(Some(frame.clone()));
    }

    fn render_chart(&self, history: &ChartHistory) {
        self.chart.send_replace(Some(history.clone()));
    }
}

/// Emits each frame as a structured tracing event.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSurface;

impl RenderSurface for LogSurface {
    fn render_dashboard(&self, frame: &DashboardFrame) {
        let telemetry = &frame.telemetry;
        info!(
            tick = frame.tick,
            solar_kw = telemetry.solar_power_kilowatts(),
            battery_pct = telemetry.battery_level_percent,
            temperature_c = telemetry.temperature_celsius,
            humidity_pct = telemetry.humidity_percent,
            active_stations = frame.summary.active_station_count,
            station_count = frame.summary.station_count,
            active_pct = frame.summary.active_percentage,
            load_kw = frame.summary.current_load_kilowatts,
            capacity_kw = frame.summary.total_capacity_kilowatts,
            load_pct = frame.summary.load_percentage,
            "dashboard refreshed"
        );
    }

    fn render_chart(&self, history: &ChartHistory) {
        let latest = history.points.last();
        info!(
            points = history.points.len(),
            latest_hour = latest.map(|point| point.time.as_str()).unwrap_or("-"),
            latest_solar_w = latest.map(|point| point.solar_power).unwrap_or_default(),
            "chart refreshed"
        );
    }
}

#[derive(Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
enum Envelope<'a> {
    Dashboard(&'a DashboardFrame),
    Chart(&'a ChartHistory),
}

/// Writes one JSON object per frame, tagged with `"kind"`.
#[derive(Debug)]
pub struct JsonLinesSurface<W> {
    writer: Mutex<W>,
}

impl JsonLinesSurface<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSurface<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn emit(&self, envelope: &Envelope<'_>) {
        let mut writer = self.writer.lock();
        let written = serde_json::to_writer(&mut *writer, envelope)
            .map_err(std::io::Error::from)
            .and_then(|_| writer.write_all(b"\n"))
            .and_then(|_| writer.flush());
        if let Err(err) = written {
            warn!(error = %err, "failed to write json frame");
        }
    }
}

impl<W: Write + Send> RenderSurface for JsonLinesSurface<W> {
    fn render_dashboard(&self, frame: &DashboardFrame) {
        self.emit(&Envelope::Dashboard(frame));
    }

    fn render_chart(&self, history: &ChartHistory) {
        self.emit(&Envelope::Chart(history));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use evhub_fleet::{default_fleet, summarize};
    use evhub_sim::{ChartGenerator, TelemetryGenerator};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn frame() -> DashboardFrame {
        let mut rng = StdRng::seed_from_u64(3);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let stations = default_fleet();
        DashboardFrame {
            tick: 1,
            telemetry: TelemetryGenerator::default().generate(&mut rng, now),
            summary: summarize(&stations),
            stations: stations.into(),
        }
    }

    #[test]
    fn watch_surface_keeps_latest_frame() {
        let surface = WatchSurface::new();
        let receiver = surface.subscribe_dashboard();
        assert!(receiver.borrow().is_none());
        surface.render_dashboard(&frame());
        assert_eq!(receiver.borrow().as_ref().map(|f| f.tick), Some(1));
        assert!(surface.latest_chart().is_none());
    }

    #[test]
    fn json_lines_are_tagged_by_kind() {
        let surface = JsonLinesSurface::new(Vec::new());
        surface.render_dashboard(&frame());
        let mut rng = StdRng::seed_from_u64(4);
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        surface.render_chart(&ChartGenerator::default().history(&mut rng, now));

        let output = String::from_utf8(surface.into_inner()).unwrap();
        let lines: Vec<serde_json::Value> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["kind"], "dashboard");
        assert_eq!(lines[0]["summary"]["currentLoadKilowatts"], 53.5);
        assert_eq!(lines[0]["summary"]["activePercentage"], 50);
        assert_eq!(lines[0]["summary"]["loadPercentage"], 26.75);
        assert_eq!(lines[0]["stations"].as_array().unwrap().len(), 4);
        assert_eq!(lines[1]["kind"], "chart");
        assert_eq!(lines[1]["points"].as_array().unwrap().len(), 24);
    }
}
