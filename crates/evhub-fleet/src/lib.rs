//! ---
//! ems_section: "04-fleet-aggregation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Charging fleet model and derived metrics."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Charging station records, per-tick progress aggregation, and the
//! station finder directory used by the Solar EV Hub dashboard.

pub mod aggregator;
pub mod finder;
pub mod station;

pub use aggregator::{
    summarize, CompletionPolicy, FleetAggregator, FleetSummary, DEFAULT_MAX_PROGRESS_STEP,
    LOAD_COEFFICIENT_KW, STATION_CAPACITY_KW,
};
pub use finder::{
    default_directory, sort_listings, AvailabilityStatus, SortKey, StationListing,
};
pub use station::{default_fleet, ChargingStation, StationStatus, COMPLETE_LABEL};
