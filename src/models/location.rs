//! Location model for resolved places and coordinate queries

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Identity of the place a snapshot was resolved to
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ResolvedLocation {
    /// Place name (city, town, ...)
    pub name: String,
    /// Region or state, empty when the service has none
    pub region: String,
    /// Country name
    pub country: String,
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// IANA timezone identifier, e.g. `Europe/Paris`
    pub timezone: String,
    /// Wall-clock time at the location when the snapshot was taken
    pub local_time: NaiveDateTime,
}

impl ResolvedLocation {
    /// `"<name>, <country>"`, the form used for suggestions and notices
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// One candidate returned by the location search endpoint
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LocationCandidate {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
    #[serde(default)]
    pub lat: f64,
    #[serde(default)]
    pub lon: f64,
}

impl LocationCandidate {
    /// Query string offered to the user when their own query did not resolve
    #[must_use]
    pub fn suggestion(&self) -> String {
        format!("{}, {}", self.name, self.country)
    }
}
