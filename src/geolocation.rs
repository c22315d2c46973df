//! Positioning capability used by "use my current location"
//!
//! The resolver only sees the [`Geolocator`] trait. Providers:
//! - [`IpGeolocator`]: approximate position from an ip-api.com style lookup
//! - [`StaticGeolocator`]: fixed coordinates from configuration
//! - [`UnsupportedGeolocator`]: no positioning available

use crate::config::GeolocationConfig;
use crate::{Result, WeatherDeskError};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Options passed with every positioning request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PositionOptions {
    /// Prefer the most accurate fix the provider can give
    pub enable_high_accuracy: bool,
    /// Provider-side bound on the request
    pub timeout: Duration,
    /// Maximum age of a cached position that may be returned; zero disables reuse
    pub maximum_age: Duration,
}

/// A position fix in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
    /// Accuracy radius in meters, when the provider reports one
    pub accuracy: Option<f64>,
}

/// Why a positioning request failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionErrorCode {
    PermissionDenied,
    PositionUnavailable,
    Timeout,
    /// A reason code the resolver does not recognise
    Other(u16),
}

impl PositionErrorCode {
    /// Map a numeric reason code (1 = denied, 2 = unavailable, 3 = timeout)
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            1 => Self::PermissionDenied,
            2 => Self::PositionUnavailable,
            3 => Self::Timeout,
            other => Self::Other(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionError {
    pub code: PositionErrorCode,
    pub message: String,
}

impl PositionError {
    pub fn new<S: Into<String>>(code: PositionErrorCode, message: S) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for PositionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.code, self.message)
    }
}

impl std::error::Error for PositionError {}

/// Host positioning capability
#[async_trait]
pub trait Geolocator: Send + Sync {
    /// False when no positioning is available at all
    fn is_supported(&self) -> bool {
        true
    }

    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> std::result::Result<Position, PositionError>;
}

/// Build the provider selected by `geolocation.provider`
pub fn from_config(config: &GeolocationConfig) -> Result<Arc<dyn Geolocator>> {
    match config.provider.as_str() {
        "ip" => Ok(Arc::new(IpGeolocator::new(&config.ip_lookup_url)?)),
        "static" => match (config.latitude, config.longitude) {
            (Some(latitude), Some(longitude)) => {
                Ok(Arc::new(StaticGeolocator::new(latitude, longitude)))
            }
            _ => Err(WeatherDeskError::config(
                "Static geolocation requires both geolocation.latitude and geolocation.longitude",
            )),
        },
        "none" => Ok(Arc::new(UnsupportedGeolocator)),
        other => Err(WeatherDeskError::config(format!(
            "Invalid geolocation provider '{other}'"
        ))),
    }
}

/// ip-api.com response with `fields=status,message,lat,lon`
#[derive(Debug, Deserialize)]
struct IpLookupResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Approximate position derived from the public IP address
pub struct IpGeolocator {
    client: reqwest::Client,
    lookup_url: String,
}

impl IpGeolocator {
    pub fn new(lookup_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("WeatherDesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherDeskError::config(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            lookup_url: lookup_url.to_string(),
        })
    }
}

#[async_trait]
impl Geolocator for IpGeolocator {
    async fn current_position(
        &self,
        options: PositionOptions,
    ) -> std::result::Result<Position, PositionError> {
        debug!("IP location lookup via {}", self.lookup_url);

        let response = self
            .client
            .get(&self.lookup_url)
            .timeout(options.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PositionError::new(PositionErrorCode::Timeout, "IP location lookup timed out")
                } else {
                    PositionError::new(
                        PositionErrorCode::PositionUnavailable,
                        format!("IP location lookup failed: {e}"),
                    )
                }
            })?;

        let body: IpLookupResponse = response.json().await.map_err(|e| {
            PositionError::new(
                PositionErrorCode::PositionUnavailable,
                format!("Invalid IP location response: {e}"),
            )
        })?;

        match body {
            IpLookupResponse {
                status,
                lat: Some(latitude),
                lon: Some(longitude),
                ..
            } if status == "success" => {
                info!("IP location resolved to {:.4},{:.4}", latitude, longitude);
                Ok(Position {
                    latitude,
                    longitude,
                    accuracy: None,
                })
            }
            IpLookupResponse { message, .. } => {
                let message = message.unwrap_or_else(|| "no position in response".to_string());
                warn!("IP location lookup failed: {}", message);
                Err(PositionError::new(
                    PositionErrorCode::PositionUnavailable,
                    message,
                ))
            }
        }
    }
}

/// Always reports the configured coordinates
pub struct StaticGeolocator {
    position: Position,
}

impl StaticGeolocator {
    #[must_use]
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            position: Position {
                latitude,
                longitude,
                accuracy: Some(0.0),
            },
        }
    }
}

#[async_trait]
impl Geolocator for StaticGeolocator {
    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> std::result::Result<Position, PositionError> {
        Ok(self.position)
    }
}

/// No positioning capability
pub struct UnsupportedGeolocator;

#[async_trait]
impl Geolocator for UnsupportedGeolocator {
    fn is_supported(&self) -> bool {
        false
    }

    async fn current_position(
        &self,
        _options: PositionOptions,
    ) -> std::result::Result<Position, PositionError> {
        Err(PositionError::new(
            PositionErrorCode::PositionUnavailable,
            "Geolocation is not supported",
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn options() -> PositionOptions {
        PositionOptions {
            enable_high_accuracy: true,
            timeout: Duration::from_secs(8),
            maximum_age: Duration::ZERO,
        }
    }

    #[rstest]
    #[case(1, PositionErrorCode::PermissionDenied)]
    #[case(2, PositionErrorCode::PositionUnavailable)]
    #[case(3, PositionErrorCode::Timeout)]
    #[case(0, PositionErrorCode::Other(0))]
    #[case(42, PositionErrorCode::Other(42))]
    fn test_position_error_codes(#[case] code: u16, #[case] expected: PositionErrorCode) {
        assert_eq!(PositionErrorCode::from_code(code), expected);
    }

    #[tokio::test]
    async fn test_static_geolocator() {
        let geo = StaticGeolocator::new(37.7749, -122.4194);
        assert!(geo.is_supported());
        let position = geo.current_position(options()).await.unwrap();
        assert_eq!(position.latitude, 37.7749);
        assert_eq!(position.longitude, -122.4194);
    }

    #[tokio::test]
    async fn test_unsupported_geolocator() {
        let geo = UnsupportedGeolocator;
        assert!(!geo.is_supported());
        assert!(geo.current_position(options()).await.is_err());
    }

    #[test]
    fn test_from_config() {
        let mut config = GeolocationConfig::default();
        assert!(from_config(&config).unwrap().is_supported());

        config.provider = "none".to_string();
        assert!(!from_config(&config).unwrap().is_supported());

        config.provider = "static".to_string();
        assert!(from_config(&config).is_err());

        config.latitude = Some(48.85);
        config.longitude = Some(2.35);
        assert!(from_config(&config).unwrap().is_supported());

        config.provider = "gps".to_string();
        assert!(from_config(&config).is_err());
    }
}
