//! Resolver-owned view state and the notices shown to the user

use crate::WeatherDeskError;
use crate::geolocation::{PositionError, PositionErrorCode};
use crate::models::WeatherSnapshot;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Why a resolution attempt ended without weather data
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Please enter a location")]
    EmptyQuery,

    #[error("{message}")]
    LocationNotFound { message: String },

    #[error("{message}")]
    Api { message: String },

    #[error("Geolocation is not supported on this device")]
    GeolocationUnsupported,

    #[error("Location access denied. Please enable location access in your system settings.")]
    GeolocationPermissionDenied,

    #[error(
        "Location information is unavailable. Please try again or enter your location manually."
    )]
    GeolocationPositionUnavailable,

    #[error("Location request timed out. Please try again or enter your location manually.")]
    GeolocationTimeout,

    #[error("Geolocation request timed out. Please try again or enter your location manually.")]
    SoftTimeout,

    #[error("Location access denied. Please enable location access or enter your location manually.")]
    GeolocationFailed,
}

impl ResolveError {
    /// Classify a positioning failure; unrecognised codes get the generic message
    #[must_use]
    pub fn from_position_error(error: &PositionError) -> Self {
        match error.code {
            PositionErrorCode::PermissionDenied => Self::GeolocationPermissionDenied,
            PositionErrorCode::PositionUnavailable => Self::GeolocationPositionUnavailable,
            PositionErrorCode::Timeout => Self::GeolocationTimeout,
            PositionErrorCode::Other(_) => Self::GeolocationFailed,
        }
    }

    #[must_use]
    pub fn is_geolocation(&self) -> bool {
        matches!(
            self,
            Self::GeolocationUnsupported
                | Self::GeolocationPermissionDenied
                | Self::GeolocationPositionUnavailable
                | Self::GeolocationTimeout
                | Self::SoftTimeout
                | Self::GeolocationFailed
        )
    }
}

impl From<&WeatherDeskError> for ResolveError {
    fn from(error: &WeatherDeskError) -> Self {
        let message = error.user_message();
        if error.is_location_not_found() {
            Self::LocationNotFound {
                message: non_empty_or(message, "Location not found"),
            }
        } else {
            Self::Api {
                message: non_empty_or(message, "Failed to fetch weather data. Please try again."),
            }
        }
    }
}

fn non_empty_or(message: String, fallback: &str) -> String {
    if message.trim().is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

/// Lifecycle of the current resolution attempt
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ResolutionState {
    #[default]
    Idle,
    Loading,
    Ready(Box<WeatherSnapshot>),
    Failed(ResolveError),
}

/// Everything the resolver owns
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ViewState {
    /// Text of the current query, as typed or as formatted coordinates
    pub query: String,
    pub resolution: ResolutionState,
    /// `"<name>, <country>"` offered after a location-not-found failure
    pub suggestion: Option<String>,
    pub geo_error: Option<String>,
}

impl ViewState {
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self.resolution, ResolutionState::Loading)
    }

    #[must_use]
    pub fn weather(&self) -> Option<&WeatherSnapshot> {
        match &self.resolution {
            ResolutionState::Ready(snapshot) => Some(snapshot.as_ref()),
            _ => None,
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ResolveError> {
        match &self.resolution {
            ResolutionState::Failed(error) => Some(error),
            _ => None,
        }
    }

    /// Project into the shape handed to presentation layers
    #[must_use]
    pub fn to_view(&self) -> WidgetView {
        WidgetView {
            location: self.query.clone(),
            weather: self.weather().cloned(),
            loading: self.is_loading(),
            suggestion: self.suggestion.clone(),
            geo_error: self.geo_error.clone(),
            error: self.error().map(ToString::to_string),
        }
    }
}

/// Serialisable presentation state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetView {
    pub location: String,
    pub weather: Option<WeatherSnapshot>,
    pub loading: bool,
    pub suggestion: Option<String>,
    pub geo_error: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeSeverity {
    Info,
    Error,
}

/// Transient message for the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notice {
    pub title: String,
    pub description: String,
    pub severity: NoticeSeverity,
    /// How long to show the notice, `None` for the presentation default
    pub duration_ms: Option<u64>,
}

impl Notice {
    pub fn info<T: Into<String>, D: Into<String>>(title: T, description: D, duration: Duration) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: NoticeSeverity::Info,
            duration_ms: Some(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)),
        }
    }

    pub fn error<T: Into<String>, D: Into<String>>(title: T, description: D) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            severity: NoticeSeverity::Error,
            duration_ms: None,
        }
    }

    #[must_use]
    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }
}
