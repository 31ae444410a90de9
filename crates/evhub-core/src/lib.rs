//! ---
//! ems_section: "01-core-functionality"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Dashboard runtime and lifecycle management."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
//! Dashboard runtime for Solar EV Hub: two refresh timers driving the
//! telemetry generator and fleet aggregator, the surfaces frames are
//! rendered to, and the location and map collaborators of the station finder.

pub mod location;
pub mod map;
pub mod runtime;
pub mod state;
pub mod surface;

pub use location::{
    provider_from_config as geolocation_from_config, resolve_location, resolve_location_within,
    Coordinates, DeniedGeolocation, FixedGeolocation, GeolocationError, GeolocationProvider,
    LocationResolution, Notice, NoticeSeverity, FALLBACK_LOCATION,
};
pub use map::{
    marker_color, provider_from_config as map_from_config, MapError, MapMarker, MapProvider,
    MapView, MapboxProvider, OpenStreetMapProvider,
};
pub use runtime::{DashboardRuntime, RuntimeReport};
pub use state::{DashboardFrame, FleetState};
pub use surface::{JsonLinesSurface, LogSurface, RenderSurface, WatchSurface};
