//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Pluggable map tile providers for the station finder."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use evhub_common::config::{MapBackend, MapConfig};
use evhub_fleet::StationListing;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use crate::location::Coordinates;

const MAPBOX_API: &str = "https://api.mapbox.com/styles/v1/";

#[derive(Debug, Error, PartialEq)]
pub enum MapError {
    #[error("mapbox access token must not be empty")]
    MissingToken,
    #[error("mapbox style '{0}' must look like 'owner/style-id'")]
    InvalidStyle(String),
    #[error("failed to build map url: {0}")]
    Url(#[from] url::ParseError),
}

/// Initial camera position.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MapView {
    pub center: Coordinates,
    pub zoom: u8,
}

impl Default for MapView {
    fn default() -> Self {
        Self {
            center: Coordinates::new(40.7128, -74.006),
            zoom: 12,
        }
    }
}

/// Station pin with the data shown in its popup.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapMarker {
    pub station_id: u32,
    pub name: String,
    pub address: String,
    pub position: Coordinates,
    pub color: &'static str,
    pub available_chargers: u32,
    pub total_chargers: u32,
    pub price_per_kwh: f64,
    pub distance_miles: f64,
    pub badges: Vec<&'static str>,
}

impl MapMarker {
    pub fn from_listing(listing: &StationListing) -> Self {
        let mut badges = Vec::new();
        if listing.solar_powered {
            badges.push("Solar");
        }
        if listing.fast_charging {
            badges.push("Fast");
        }
        Self {
            station_id: listing.id,
            name: listing.name.clone(),
            address: listing.address.clone(),
            position: Coordinates::new(listing.lat, listing.lng),
            color: marker_color(listing.availability_ratio()),
            available_chargers: listing.available_chargers,
            total_chargers: listing.total_chargers,
            price_per_kwh: listing.price_per_kwh,
            distance_miles: listing.distance,
            badges,
        }
    }
}

/// Green above 60 % free chargers, amber above 30 %, red otherwise.
pub fn marker_color(availability_ratio: f64) -> &'static str {
    if availability_ratio > 0.6 {
        "#22c55e"
    } else if availability_ratio > 0.3 {
        "#f59e0b"
    } else {
        "#ef4444"
    }
}

/// Tile source used to render the station map.
pub trait MapProvider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Leaflet-style template with `{z}`, `{x}` and `{y}` placeholders.
    fn tile_url_template(&self) -> String;

    fn attribution(&self) -> &'static str;

    fn initial_view(&self) -> MapView {
        MapView::default()
    }

    fn markers(&self, listings: &[StationListing]) -> Vec<MapMarker> {
        listings.iter().map(MapMarker::from_listing).collect()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OpenStreetMapProvider;

impl MapProvider for OpenStreetMapProvider {
    fn name(&self) -> &'static str {
        "open-street-map"
    }

    fn tile_url_template(&self) -> String {
        "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png".to_owned()
    }

    fn attribution(&self) -> &'static str {
        "&copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a> contributors"
    }
}

/// Owner and style ids are inserted into URL paths verbatim, so only plain
/// path characters are allowed and dot segments are refused.
fn is_style_segment(segment: &str) -> bool {
    !segment.is_empty()
        && segment != "."
        && segment != ".."
        && segment
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '-'))
}

/// Mapbox raster tiles; requires an access token.
#[derive(Debug, Clone)]
pub struct MapboxProvider {
    token: String,
    style: String,
}

impl MapboxProvider {
    pub fn new(token: impl Into<String>, style: impl Into<String>) -> Result<Self, MapError> {
        let token = token.into().trim().to_owned();
        if token.is_empty() {
            return Err(MapError::MissingToken);
        }
        let style = style.into();
        let mut segments = style.split('/');
        let well_formed = matches!(
            (segments.next(), segments.next(), segments.next()),
            (Some(owner), Some(id), None) if is_style_segment(owner) && is_style_segment(id)
        );
        if !well_formed {
            return Err(MapError::InvalidStyle(style));
        }
        let provider = Self { token, style };
        provider.style_url()?;
        Ok(provider)
    }

    /// Style document endpoint with the access token attached.
    pub fn style_url(&self) -> Result<Url, MapError> {
        let mut url = Url::parse(MAPBOX_API)?.join(&self.style)?;
        url.query_pairs_mut()
            .append_pair("access_token", &self.token);
        Ok(url)
    }
}

impl MapProvider for MapboxProvider {
    fn name(&self) -> &'static str {
        "mapbox"
    }

    fn tile_url_template(&self) -> String {
        let encoded: String =
            url::form_urlencoded::byte_serialize(self.token.as_bytes()).collect();
        format!(
            "{}{}/tiles/{{z}}/{{x}}/{{y}}?access_token={}",
            MAPBOX_API, self.style, encoded
        )
    }

    fn attribution(&self) -> &'static str {
        "&copy; <a href=\"https://www.mapbox.com/about/maps/\">Mapbox</a> &copy; <a href=\"https://www.openstreetmap.org/copyright\">OpenStreetMap</a>"
    }
}

/// Build the provider selected by `[map]`.
pub fn provider_from_config(config: &MapConfig) -> Result<Box<dyn MapProvider>, MapError> {
    match config.provider {
        MapBackend::OpenStreetMap => Ok(Box::new(OpenStreetMapProvider)),
        MapBackend::Mapbox => {
            let token = config.mapbox_token.as_deref().unwrap_or_default();
            Ok(Box::new(MapboxProvider::new(token, config.style.as_str())?))
        }
    }
}
