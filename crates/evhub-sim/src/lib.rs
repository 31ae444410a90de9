//! ---
//! ems_section: "11-simulation"
//! ems_subsection: "01-bootstrap"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Simulation runtime module exports and shared types."
//! ems_version: "v0.1.0"
//! ems_owner: "tbd"
//! ---
//! Synthetic telemetry for the Solar EV Hub dashboard.
//!
//! Every generator takes its random source and the current instant as
//! arguments so callers decide between seeded and entropy-backed runs.

pub mod frames;
pub mod generator;
pub mod sensor;

pub use frames::{ChartHistory, ChartPoint, SensorReading, TelemetrySnapshot};
pub use generator::{diurnal_bias, ChartGenerator, TelemetryGenerator, CHART_HISTORY_HOURS};
pub use sensor::{default_feed_stations, FeedStation, SensorFeedGenerator};
