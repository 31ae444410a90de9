//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dashboard frame and copy-on-write fleet state."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::sync::Arc;

use evhub_fleet::{ChargingStation, FleetSummary};
use evhub_sim::TelemetrySnapshot;
use parking_lot::RwLock;
use serde::Serialize;

/// Everything the dashboard view shows after one refresh tick.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardFrame {
    pub tick: u64,
    pub telemetry: TelemetrySnapshot,
    pub stations: Arc<[ChargingStation]>,
    pub summary: FleetSummary,
}

/// Current station list, replaced wholesale on every advance.
///
/// Readers get an `Arc` to the list as it was when they asked; a later
/// advance swaps in a new list and never mutates one already handed out.
#[derive(Debug, Clone)]
pub struct FleetState {
    current: Arc<RwLock<Arc<[ChargingStation]>>>,
}

impl FleetState {
    pub fn new(stations: Vec<ChargingStation>) -> Self {
        Self {
            current: Arc::new(RwLock::new(stations.into())),
        }
    }

    pub fn snapshot(&self) -> Arc<[ChargingStation]> {
        self.current.read().clone()
    }

    pub fn replace(&self, stations: Vec<ChargingStation>) -> Arc<[ChargingStation]> {
        let next: Arc<[ChargingStation]> = stations.into();
        *self.current.write() = next.clone();
        next
    }
}
