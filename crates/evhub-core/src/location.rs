//! ---
//! ems_section: "05-networking-external-interfaces"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Geolocation collaborator with a fixed fallback location."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use std::time::Duration;

use async_trait::async_trait;
use evhub_common::config::LocationConfig;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

/// Label shown whenever the user's position cannot be determined.
pub const FALLBACK_LOCATION: &str = "New York, NY";

/// Upper bound on a single position lookup.
pub const DEFAULT_LOCATE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// `"lat, lng"` with four decimals.
    pub fn label(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeolocationError {
    #[error("geolocation is not supported on this host")]
    Unsupported,
    #[error("location permission was denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
    #[error("timed out after {0:?} waiting for a position")]
    Timeout(Duration),
}

/// Source of the user's current position.
#[async_trait]
pub trait GeolocationProvider: Send + Sync {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError>;
}

/// Always reports the same position.
#[derive(Debug, Clone, Copy)]
pub struct FixedGeolocation(pub Coordinates);

#[async_trait]
impl GeolocationProvider for FixedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Ok(self.0)
    }
}

/// Behaves like a user who rejected the permission prompt.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeniedGeolocation;

#[async_trait]
impl GeolocationProvider for DeniedGeolocation {
    async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
        Err(GeolocationError::PermissionDenied)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Info,
    Destructive,
}

/// Advisory surfaced alongside a location lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub title: &'static str,
    pub description: &'static str,
    pub severity: NoticeSeverity,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LocationResolution {
    pub label: String,
    pub coordinates: Option<Coordinates>,
    pub notice: Notice,
}

impl LocationResolution {
    pub fn is_fallback(&self) -> bool {
        self.coordinates.is_none()
    }

    fn found(coordinates: Coordinates) -> Self {
        Self {
            label: coordinates.label(),
            coordinates: Some(coordinates),
            notice: Notice {
                title: "Location Found",
                description: "Showing nearest charging stations based on your location.",
                severity: NoticeSeverity::Info,
            },
        }
    }

    fn denied() -> Self {
        Self {
            label: FALLBACK_LOCATION.to_owned(),
            coordinates: None,
            notice: Notice {
                title: "Location Access Denied",
                description:
                    "Using default location. Please enable location services for accurate results.",
                severity: NoticeSeverity::Destructive,
            },
        }
    }

    fn unsupported() -> Self {
        Self {
            label: FALLBACK_LOCATION.to_owned(),
            coordinates: None,
            notice: Notice {
                title: "Geolocation Not Supported",
                description: "Using default location.",
                severity: NoticeSeverity::Destructive,
            },
        }
    }
}

/// Resolve the display location using [`DEFAULT_LOCATE_TIMEOUT`].
pub async fn resolve_location(provider: Option<&dyn GeolocationProvider>) -> LocationResolution {
    resolve_location_within(provider, DEFAULT_LOCATE_TIMEOUT).await
}

/// Resolve the display location. Never fails: any provider error or timeout
/// yields [`FALLBACK_LOCATION`] with a destructive notice.
pub async fn resolve_location_within(
    provider: Option<&dyn GeolocationProvider>,
    timeout: Duration,
) -> LocationResolution {
    let Some(provider) = provider else {
        warn!(fallback = FALLBACK_LOCATION, "geolocation not supported");
        return LocationResolution::unsupported();
    };
    let outcome = tokio::time::timeout(timeout, provider.current_position())
        .await
        .unwrap_or(Err(GeolocationError::Timeout(timeout)));
    match outcome {
        Ok(coordinates) => {
            info!(
                latitude = coordinates.latitude,
                longitude = coordinates.longitude,
                "location found"
            );
            LocationResolution::found(coordinates)
        }
        Err(GeolocationError::Unsupported) => {
            warn!(fallback = FALLBACK_LOCATION, "geolocation not supported");
            LocationResolution::unsupported()
        }
        Err(err) => {
            warn!(error = %err, fallback = FALLBACK_LOCATION, "location lookup failed");
            LocationResolution::denied()
        }
    }
}

/// Build the geolocation provider described by `[location]`. `None` means
/// geolocation is unavailable on this host.
pub fn provider_from_config(config: &LocationConfig) -> Option<Box<dyn GeolocationProvider>> {
    if config.deny {
        return Some(Box::new(DeniedGeolocation));
    }
    config
        .coordinates()
        .map(|(lat, lng)| {
            Box::new(FixedGeolocation(Coordinates::new(lat, lng))) as Box<dyn GeolocationProvider>
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Stalled;

    #[async_trait]
    impl GeolocationProvider for Stalled {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            std::future::pending().await
        }
    }

    struct Broken;

    #[async_trait]
    impl GeolocationProvider for Broken {
        async fn current_position(&self) -> Result<Coordinates, GeolocationError> {
            Err(GeolocationError::Unavailable("no fix".into()))
        }
    }

    #[tokio::test]
    async fn success_formats_four_decimals() {
        let provider = FixedGeolocation(Coordinates::new(37.774_929, -122.419_416));
        let resolved = resolve_location(Some(&provider)).await;
        assert_eq!(resolved.label, "37.7749, -122.4194");
        assert_eq!(resolved.notice.title, "Location Found");
        assert_eq!(resolved.notice.severity, NoticeSeverity::Info);
        assert!(!resolved.is_fallback());
    }

    #[tokio::test]
    async fn denial_falls_back_to_new_york() {
        let resolved = resolve_location(Some(&DeniedGeolocation)).await;
        assert_eq!(resolved.label, FALLBACK_LOCATION);
        assert_eq!(resolved.notice.title, "Location Access Denied");
        assert_eq!(resolved.notice.severity, NoticeSeverity::Destructive);

        let resolved = resolve_location(Some(&Broken)).await;
        assert_eq!(resolved.label, FALLBACK_LOCATION);
        assert_eq!(resolved.notice.title, "Location Access Denied");
    }

    #[tokio::test]
    async fn missing_provider_reports_unsupported() {
        let resolved = resolve_location(None).await;
        assert_eq!(resolved.label, FALLBACK_LOCATION);
        assert_eq!(resolved.notice.title, "Geolocation Not Supported");
        assert!(resolved.is_fallback());
    }

    #[tokio::test(start_paused = true)]
    async fn stalled_lookup_times_out_to_fallback() {
        let resolved = resolve_location_within(Some(&Stalled), Duration::from_secs(2)).await;
        assert_eq!(resolved.label, FALLBACK_LOCATION);
        assert_eq!(resolved.notice.severity, NoticeSeverity::Destructive);
    }

    #[tokio::test]
    async fn config_selects_provider() {
        assert!(provider_from_config(&LocationConfig::default()).is_none());

        let config = LocationConfig {
            latitude: Some(40.0),
            longitude: Some(-73.5),
            deny: false,
        };
        let provider = provider_from_config(&config).unwrap();
        assert_eq!(
            provider.current_position().await,
            Ok(Coordinates::new(40.0, -73.5))
        );

        let denied = LocationConfig {
            deny: true,
            ..config
        };
        let provider = provider_from_config(&denied).unwrap();
        assert_eq!(
            provider.current_position().await,
            Err(GeolocationError::PermissionDenied)
        );
    }
}
