//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dashboard runtime and lifecycle management."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, Utc};
use evhub_common::config::AppConfig;
use evhub_fleet::{summarize, FleetAggregator};
use evhub_rt::{PeriodicTimer, SchedulerError, TimerReport};
use evhub_sim::{ChartGenerator, ChartHistory, TelemetryGenerator};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, info};

use crate::state::{DashboardFrame, FleetState};
use crate::surface::RenderSurface;

type SharedRng = Arc<Mutex<StdRng>>;

fn seeded_rng(seed: Option<u64>) -> SharedRng {
    let rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    Arc::new(Mutex::new(rng))
}

#[derive(Clone)]
struct DashboardPipeline {
    generator: TelemetryGenerator,
    aggregator: FleetAggregator,
    fleet: FleetState,
    rng: SharedRng,
    // Tick-0 renders draw from their own stream so that extra previews never
    // shift the sequence the timer ticks see.
    preview_rng: SharedRng,
}

impl DashboardPipeline {
    /// Tick 0 renders the fleet as-is; later ticks advance it first.
    fn frame(&self, tick: u64, now: DateTime<Utc>) -> DashboardFrame {
        let (telemetry, stations) = if tick == 0 {
            let telemetry = self.generator.generate(&mut *self.preview_rng.lock(), now);
            (telemetry, self.fleet.snapshot())
        } else {
            let mut rng = self.rng.lock();
            let telemetry = self.generator.generate(&mut *rng, now);
            let current = self.fleet.snapshot();
            let advanced = self.aggregator.advance(&current, &mut *rng);
            (telemetry, self.fleet.replace(advanced))
        };
        DashboardFrame {
            tick,
            telemetry,
            summary: summarize(&stations),
            stations,
        }
    }
}

#[derive(Clone)]
struct ChartPipeline {
    generator: ChartGenerator,
    rng: SharedRng,
}

impl ChartPipeline {
    fn history(&self, now: DateTime<Utc>) -> ChartHistory {
        self.generator.history(&mut *self.rng.lock(), now)
    }
}

/// Reports from both timers after [`DashboardRuntime::stop`].
#[derive(Debug, Clone, Default)]
pub struct RuntimeReport {
    pub dashboard: Option<TimerReport>,
    pub chart: Option<TimerReport>,
}

/// Drives the dashboard and chart refresh cadences.
///
/// The two timers are independent; neither waits on nor orders itself
/// against the other. `start` renders an initial frame for each view before
/// the first tick, matching what a freshly opened dashboard shows.
pub struct DashboardRuntime {
    dashboard: DashboardPipeline,
    chart: ChartPipeline,
    surface: Arc<dyn RenderSurface>,
    dashboard_timer: PeriodicTimer,
    chart_timer: PeriodicTimer,
}

impl DashboardRuntime {
    /// Build the runtime with timers sized from `[refresh]`.
    pub fn from_config(config: &AppConfig, surface: Arc<dyn RenderSurface>) -> Result<Self> {
        let dashboard_timer = PeriodicTimer::new("dashboard", config.refresh.dashboard_interval)?;
        let chart_timer = PeriodicTimer::new("chart", config.refresh.chart_interval)?;
        Self::new(config, dashboard_timer, chart_timer, surface)
    }

    pub fn new(
        config: &AppConfig,
        dashboard_timer: PeriodicTimer,
        chart_timer: PeriodicTimer,
        surface: Arc<dyn RenderSurface>,
    ) -> Result<Self> {
        let offset = config.simulation.utc_offset()?;
        let seed = config.simulation.random_seed;
        let dashboard = DashboardPipeline {
            generator: TelemetryGenerator::new(offset),
            aggregator: FleetAggregator::new(
                config.fleet.max_progress_step,
                config.fleet.completion,
            ),
            fleet: FleetState::new(config.fleet.stations.clone()),
            rng: seeded_rng(seed),
            preview_rng: seeded_rng(seed.map(|seed| seed.wrapping_add(2))),
        };
        let chart = ChartPipeline {
            generator: ChartGenerator::new(offset),
            rng: seeded_rng(seed.map(|seed| seed.wrapping_add(1))),
        };
        debug!(
            seed = ?seed,
            stations = config.fleet.stations.len(),
            "dashboard runtime configured"
        );
        Ok(Self {
            dashboard,
            chart,
            surface,
            dashboard_timer,
            chart_timer,
        })
    }

    pub fn fleet(&self) -> &FleetState {
        &self.dashboard.fleet
    }

    pub fn is_running(&self) -> bool {
        self.dashboard_timer.is_running() || self.chart_timer.is_running()
    }

    /// Current dashboard view without advancing the fleet. Does not consume
    /// randomness from the tick sequence.
    pub fn current_frame(&self) -> DashboardFrame {
        self.dashboard.frame(0, Utc::now())
    }

    /// Freshly generated chart history.
    pub fn chart_history(&self) -> ChartHistory {
        self.chart.history(Utc::now())
    }

    pub fn start(&mut self) -> Result<(), SchedulerError> {
        if self.dashboard_timer.is_running() {
            return Err(SchedulerError::AlreadyRunning(
                self.dashboard_timer.label().to_owned(),
            ));
        }
        if self.chart_timer.is_running() {
            return Err(SchedulerError::AlreadyRunning(
                self.chart_timer.label().to_owned(),
            ));
        }

        self.surface.render_dashboard(&self.current_frame());
        self.surface.render_chart(&self.chart_history());

        let pipeline = self.dashboard.clone();
        let surface = self.surface.clone();
        self.dashboard_timer.start(move |tick| {
            surface.render_dashboard(&pipeline.frame(tick, Utc::now()));
        })?;

        let pipeline = self.chart.clone();
        let surface = self.surface.clone();
        if let Err(err) = self.chart_timer.start(move |_| {
            surface.render_chart(&pipeline.history(Utc::now()));
        }) {
            self.dashboard_timer.abort();
            return Err(err);
        }
        info!(
            dashboard_ms = self.dashboard_timer.period().as_millis() as u64,
            chart_ms = self.chart_timer.period().as_millis() as u64,
            "dashboard runtime started"
        );
        Ok(())
    }

    /// Stop both timers and log their tick jitter.
    pub async fn stop(&mut self) -> RuntimeReport {
        let report = RuntimeReport {
            dashboard: self.dashboard_timer.stop().await,
            chart: self.chart_timer.stop().await,
        };
        for timer in [&report.dashboard, &report.chart].into_iter().flatten() {
            match &timer.jitter {
                Some(jitter) => info!(
                    timer = %timer.label,
                    ticks = timer.ticks,
                    jitter_mean_us = jitter.mean_us,
                    jitter_max_us = jitter.max_us,
                    "refresh timer summary"
                ),
                None => info!(timer = %timer.label, ticks = timer.ticks, "refresh timer summary"),
            }
        }
        report
    }
}
