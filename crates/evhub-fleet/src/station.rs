//! ---
//! ems_section: "04-fleet-aggregation"
//! ems_subsection: "module"
//! ems_type: "source"
//! ems_scope: "code"
//! ems_description: "Charging fleet model and derived metrics."
//! ems_version: "v0.0.0-prealpha"
//! ems_owner: "tbd"
//! ---
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Label shown once a charging session saturates at 100 %.
pub const COMPLETE_LABEL: &str = "Complete";

/// Operational state of a charging bay.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StationStatus {
    Charging,
    Available,
    Maintenance,
}

/// A single charging station as rendered on the dashboard cards.
///
/// Serialized field names follow the dashboard contract (`progress`,
/// `timeRemaining`) so snapshots can be handed to existing consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChargingStation {
    pub id: u32,
    pub name: String,
    pub status: StationStatus,
    #[serde(rename = "progress", alias = "progress_percent")]
    pub progress_percent: f64,
    #[serde(alias = "time_remaining")]
    pub time_remaining: String,
}

impl ChargingStation {
    pub fn new(
        id: u32,
        name: impl Into<String>,
        status: StationStatus,
        progress_percent: f64,
        time_remaining: impl Into<String>,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            status,
            progress_percent,
            time_remaining: time_remaining.into(),
        }
    }

    pub fn is_charging(&self) -> bool {
        self.status == StationStatus::Charging
    }

    pub fn is_complete(&self) -> bool {
        self.time_remaining == COMPLETE_LABEL
    }
}

/// The four bays seeded into a fresh dashboard.
pub fn default_fleet() -> Vec<ChargingStation> {
    vec![
        ChargingStation::new(1, "Station Alpha", StationStatus::Charging, 75.0, "45 min"),
        ChargingStation::new(2, "Station Beta", StationStatus::Available, 0.0, "0 min"),
        ChargingStation::new(3, "Station Gamma", StationStatus::Charging, 32.0, "2h 15min"),
        ChargingStation::new(4, "Station Delta", StationStatus::Maintenance, 0.0, "N/A"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_dashboard_field_names() {
        let station = ChargingStation::new(7, "Station Eta", StationStatus::Charging, 12.5, "1h");
        let value = serde_json::to_value(&station).unwrap();
        assert_eq!(value["status"], "charging");
        assert_eq!(value["progress"], 12.5);
        assert_eq!(value["timeRemaining"], "1h");
    }

    #[test]
    fn status_parses_case_insensitively() {
        assert_eq!(
            "Maintenance".parse::<StationStatus>().unwrap(),
            StationStatus::Maintenance
        );
        assert_eq!(StationStatus::Available.to_string(), "available");
    }

    #[test]
    fn default_fleet_has_unique_ids() {
        let fleet = default_fleet();
        let mut ids: Vec<u32> = fleet.iter().map(|s| s.id).collect();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert_eq!(fleet.iter().filter(|s| s.is_charging()).count(), 2);
    }
}
