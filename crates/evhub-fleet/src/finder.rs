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

/// Public directory entry shown by the station finder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StationListing {
    pub id: u32,
    pub name: String,
    pub address: String,
    pub lat: f64,
    pub lng: f64,
    /// Distance from the reference location in miles.
    pub distance: f64,
    pub available_chargers: u32,
    pub total_chargers: u32,
    pub fast_charging: bool,
    pub solar_powered: bool,
    pub price_per_kwh: f64,
    pub operating_hours: String,
}

impl StationListing {
    /// Fraction of chargers currently free, `0.0` for a listing without chargers.
    pub fn availability_ratio(&self) -> f64 {
        if self.total_chargers == 0 {
            return 0.0;
        }
        f64::from(self.available_chargers) / f64::from(self.total_chargers)
    }

    pub fn availability(&self) -> AvailabilityStatus {
        AvailabilityStatus::classify(self.available_chargers, self.total_chargers)
    }
}

/// Ordering applied to the finder results.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortKey {
    #[default]
    Distance,
    Availability,
    Price,
}

/// Badge shown next to each listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
pub enum AvailabilityStatus {
    Full,
    Limited,
    Available,
}

impl AvailabilityStatus {
    pub fn classify(available: u32, total: u32) -> Self {
        if total == 0 || available == 0 {
            return AvailabilityStatus::Full;
        }
        let percentage = f64::from(available) / f64::from(total) * 100.0;
        if percentage <= 25.0 {
            AvailabilityStatus::Limited
        } else {
            AvailabilityStatus::Available
        }
    }
}

/// Return a sorted copy; ties keep directory order.
pub fn sort_listings(listings: &[StationListing], key: SortKey) -> Vec<StationListing> {
    let mut sorted = listings.to_vec();
    match key {
        SortKey::Distance => sorted.sort_by(|a, b| a.distance.total_cmp(&b.distance)),
        SortKey::Availability => {
            sorted.sort_by(|a, b| b.available_chargers.cmp(&a.available_chargers))
        }
        SortKey::Price => sorted.sort_by(|a, b| a.price_per_kwh.total_cmp(&b.price_per_kwh)),
    }
    sorted
}

#[allow(clippy::too_many_arguments)]
fn listing(
    id: u32,
    name: &str,
    address: &str,
    (lat, lng): (f64, f64),
    distance: f64,
    (available_chargers, total_chargers): (u32, u32),
    fast_charging: bool,
    solar_powered: bool,
    price_per_kwh: f64,
    operating_hours: &str,
) -> StationListing {
    StationListing {
        id,
        name: name.to_owned(),
        address: address.to_owned(),
        lat,
        lng,
        distance,
        available_chargers,
        total_chargers,
        fast_charging,
        solar_powered,
        price_per_kwh,
        operating_hours: operating_hours.to_owned(),
    }
}

/// Directory of public stations around the default New York view.
pub fn default_directory() -> Vec<StationListing> {
    vec![
        listing(
            1,
            "Solar Hub Central",
            "123 Green Energy Blvd, Tech City",
            (40.7128, -74.0060),
            0.8,
            (3, 4),
            true,
            true,
            0.15,
            "24/7",
        ),
        listing(
            2,
            "EcoCharge Plaza",
            "456 Renewable Ave, Green District",
            (40.7589, -73.9851),
            2.3,
            (2, 6),
            true,
            true,
            0.12,
            "6:00 AM - 10:00 PM",
        ),
        listing(
            3,
            "PowerPoint Station",
            "789 Electric Street, Innovation Park",
            (40.7505, -73.9934),
            1.5,
            (1, 3),
            false,
            false,
            0.18,
            "24/7",
        ),
        listing(
            4,
            "SunVolt Express",
            "321 Solar Way, Energy Heights",
            (40.7282, -74.0776),
            3.2,
            (4, 8),
            true,
            true,
            0.14,
            "24/7",
        ),
        listing(
            5,
            "GreenCharge Station",
            "654 Sustainable Dr, Eco Valley",
            (40.6892, -74.0445),
            4.1,
            (0, 4),
            true,
            true,
            0.16,
            "5:00 AM - 11:00 PM",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(listings: &[StationListing]) -> Vec<u32> {
        listings.iter().map(|l| l.id).collect()
    }

    #[test]
    fn sorts_by_distance_ascending() {
        let sorted = sort_listings(&default_directory(), SortKey::Distance);
        assert_eq!(ids(&sorted), vec![1, 3, 2, 4, 5]);
    }

    #[test]
    fn sorts_by_free_chargers_descending() {
        let sorted = sort_listings(&default_directory(), SortKey::Availability);
        assert_eq!(ids(&sorted), vec![4, 1, 2, 3, 5]);
    }

    #[test]
    fn sorts_by_price_ascending() {
        let sorted = sort_listings(&default_directory(), SortKey::Price);
        assert_eq!(ids(&sorted), vec![2, 4, 1, 5, 3]);
    }

    #[test]
    fn availability_badges() {
        assert_eq!(AvailabilityStatus::classify(0, 4), AvailabilityStatus::Full);
        assert_eq!(AvailabilityStatus::classify(1, 4), AvailabilityStatus::Limited);
        assert_eq!(AvailabilityStatus::classify(1, 3), AvailabilityStatus::Available);
        assert_eq!(AvailabilityStatus::classify(0, 0), AvailabilityStatus::Full);
    }

    #[test]
    fn sort_key_parses_from_cli_text() {
        assert_eq!("price".parse::<SortKey>().unwrap(), SortKey::Price);
        assert_eq!("Availability".parse::<SortKey>().unwrap(), SortKey::Availability);
    }
}
