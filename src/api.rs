//! Weather API client for WeatherAPI.com
//!
//! This module provides the HTTP client used to look up forecasts and
//! location suggestions, the [`WeatherSource`] seam the resolver depends on,
//! and parsing of coordinate queries.

use crate::config::WeatherConfig;
use crate::models::weatherapi::{ErrorResponse, ForecastResponse};
use crate::models::{FORECAST_DAYS, LocationCandidate, WeatherSnapshot};
use crate::{ErrorCode, Result, WeatherDeskError};
use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, instrument, warn};

/// Anything that can turn a query into weather data and location suggestions
#[async_trait]
pub trait WeatherSource: Send + Sync {
    /// Current conditions plus the 7-day forecast for `query`
    async fn forecast(&self, query: &str) -> Result<WeatherSnapshot>;

    /// Autocomplete candidates for `query`, best match first
    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>>;
}

/// Weather API client for WeatherAPI.com
pub struct WeatherApiClient {
    /// HTTP client with transient-failure retries
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl WeatherApiClient {
    /// Create a new weather API client
    pub fn new(config: &WeatherConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| WeatherDeskError::config("Weather API key is not configured"))?;

        let timeout = Duration::from_secs(config.timeout_seconds.into());
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("WeatherDesk/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| WeatherDeskError::config(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    /// Get current conditions, air quality and the 7-day forecast for a query
    #[instrument(skip(self))]
    pub async fn get_forecast(&self, query: &str) -> Result<WeatherSnapshot> {
        info!("Getting forecast for '{}'", query);
        let url = format!(
            "{}/forecast.json?key={}&q={}&days={}&aqi=yes&alerts=no",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query),
            FORECAST_DAYS
        );

        let response = self.make_request(&url, query).await?;

        let parse_start = Instant::now();
        let body: ForecastResponse = response.json().await.map_err(|e| {
            error!("Failed to parse forecast response for '{}': {}", query, e);
            WeatherDeskError::api_with_context(
                "Invalid forecast data received from the weather API",
                ErrorCode::ApiInvalidResponse,
                HashMap::from([("query".to_string(), query.to_string())]),
            )
        })?;
        let snapshot = body.into_snapshot()?;

        debug!(
            "Parsed forecast for {} in {:.3}s",
            snapshot.location.display_name(),
            parse_start.elapsed().as_secs_f64()
        );
        Ok(snapshot)
    }

    /// Search for locations matching a (possibly misspelled) query
    #[instrument(skip(self))]
    pub async fn search_locations(&self, query: &str) -> Result<Vec<LocationCandidate>> {
        let url = format!(
            "{}/search.json?key={}&q={}",
            self.base_url,
            urlencoding::encode(&self.api_key),
            urlencoding::encode(query)
        );

        let response = self.make_request(&url, query).await?;

        let candidates: Vec<LocationCandidate> = response.json().await.map_err(|e| {
            error!("Failed to parse search response for '{}': {}", query, e);
            WeatherDeskError::api_with_context(
                "Invalid search data received from the weather API",
                ErrorCode::ApiInvalidResponse,
                HashMap::from([("query".to_string(), query.to_string())]),
            )
        })?;

        if candidates.is_empty() {
            warn!("No search results for '{}'", query);
        } else {
            debug!(
                "Search results: {:?}",
                candidates.iter().map(LocationCandidate::suggestion).collect::<Vec<_>>()
            );
        }

        Ok(candidates)
    }

    /// Send a GET request and turn non-2xx answers into API errors
    async fn make_request(&self, url: &str, query: &str) -> Result<Response> {
        debug!("Weather API request: {}", redact_key(url));
        let start = Instant::now();

        let response = self.client.get(url).send().await.map_err(|e| {
            warn!("Network error for '{}': {}", query, e);
            WeatherDeskError::api_with_context(
                format!("Network error: {e}"),
                ErrorCode::ApiNetworkError,
                HashMap::from([
                    ("query".to_string(), query.to_string()),
                    ("error".to_string(), e.to_string()),
                ]),
            )
        })?;

        let status = response.status();
        let elapsed = start.elapsed();
        if status.is_success() {
            info!("Weather API answered {} in {:.3}s", status, elapsed.as_secs_f64());
            if elapsed.as_secs() > 5 {
                warn!("Slow API response detected: {:.3}s", elapsed.as_secs_f64());
            }
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ErrorResponse>(&text) {
            Ok(body) => {
                warn!(
                    "Weather API error {} for '{}': {} ({})",
                    status, query, body.error.message, body.error.code
                );
                Err(body.into_error(query))
            }
            Err(_) => {
                error!("Weather API returned {} without an error body", status);
                let code = match status {
                    StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::ApiUnauthorized,
                    _ => ErrorCode::ApiRequestFailed,
                };
                Err(WeatherDeskError::api_with_context(
                    format!(
                        "Failed to fetch weather data: {} {}",
                        status.as_u16(),
                        status.canonical_reason().unwrap_or("Unknown error")
                    ),
                    code,
                    HashMap::from([
                        ("query".to_string(), query.to_string()),
                        ("status_code".to_string(), status.as_u16().to_string()),
                    ]),
                ))
            }
        }
    }
}

#[async_trait]
impl WeatherSource for WeatherApiClient {
    async fn forecast(&self, query: &str) -> Result<WeatherSnapshot> {
        self.get_forecast(query).await
    }

    async fn search(&self, query: &str) -> Result<Vec<LocationCandidate>> {
        self.search_locations(query).await
    }
}

fn redact_key(url: &str) -> String {
    match url.split_once("key=") {
        Some((head, tail)) => {
            let rest = tail.find('&').map_or("", |i| &tail[i..]);
            format!("{head}key=***{rest}")
        }
        None => url.to_string(),
    }
}

/// Location parsing utilities
pub struct LocationParser;

impl LocationParser {
    /// Classify a query as a coordinate pair or a place name
    pub fn parse(input: &str) -> Result<LocationInput> {
        let input = input.trim();
        if input.is_empty() {
            return Err(WeatherDeskError::validation("Location cannot be empty"));
        }

        if let Ok((lat, lon)) = Self::parse_coordinates(input) {
            return Ok(LocationInput::Coordinates(lat, lon));
        }

        Ok(LocationInput::Name(input.to_string()))
    }

    /// Parse coordinates from string like "46.8182,8.2275" or "46.8182 8.2275"
    pub fn parse_coordinates(input: &str) -> Result<(f64, f64)> {
        let parts: Vec<&str> = input
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .collect();

        if parts.len() != 2 {
            return Err(WeatherDeskError::validation(
                "Coordinates must be in format 'lat,lon'",
            ));
        }

        let lat = parts[0]
            .parse::<f64>()
            .map_err(|_| WeatherDeskError::validation(format!("Invalid latitude: {}", parts[0])))?;
        let lon = parts[1]
            .parse::<f64>()
            .map_err(|_| WeatherDeskError::validation(format!("Invalid longitude: {}", parts[1])))?;

        if !(-90.0..=90.0).contains(&lat) {
            return Err(WeatherDeskError::validation(format!(
                "Latitude must be between -90 and 90, got: {lat}"
            )));
        }

        if !(-180.0..=180.0).contains(&lon) {
            return Err(WeatherDeskError::validation(format!(
                "Longitude must be between -180 and 180, got: {lon}"
            )));
        }

        Ok((lat, lon))
    }

    /// `"<lat>,<lon>"` using the shortest representation that parses back exactly
    #[must_use]
    pub fn format_coordinates(latitude: f64, longitude: f64) -> String {
        format!("{latitude},{longitude}")
    }
}

/// Types of location input
#[derive(Debug, Clone, PartialEq)]
pub enum LocationInput {
    /// Coordinates (latitude, longitude)
    Coordinates(f64, f64),
    /// Location name (city, region, postal code, ...)
    Name(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("46.8182,8.2275", 46.8182, 8.2275)]
    #[case("46.8182 8.2275", 46.8182, 8.2275)]
    #[case("-46.8182, -8.2275", -46.8182, -8.2275)]
    fn test_location_parser_coordinates(#[case] input: &str, #[case] lat: f64, #[case] lon: f64) {
        assert_eq!(
            LocationParser::parse(input).unwrap(),
            LocationInput::Coordinates(lat, lon)
        );
    }

    #[rstest]
    #[case("91.0,8.0")]
    #[case("-91.0,8.0")]
    #[case("46.0,181.0")]
    #[case("46.0,-181.0")]
    #[case("46.0")]
    #[case("46.0,8.0,0.0")]
    #[case("Interlaken")]
    #[case("New York City")]
    fn test_location_parser_names(#[case] input: &str) {
        assert!(matches!(
            LocationParser::parse(input).unwrap(),
            LocationInput::Name(_)
        ));
    }

    #[test]
    fn test_location_parser_rejects_empty() {
        let err = LocationParser::parse("   ").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidInput);
    }

    #[test]
    fn test_coordinate_round_trip() {
        let query = LocationParser::format_coordinates(37.7749, -122.4194);
        assert_eq!(query, "37.7749,-122.4194");

        let (lat, lon) = LocationParser::parse_coordinates(&query).unwrap();
        assert!((lat - 37.7749).abs() < f64::EPSILON);
        assert!((lon - -122.4194).abs() < f64::EPSILON);
    }

    #[test]
    fn test_redact_key() {
        assert_eq!(
            redact_key("https://api.weatherapi.com/v1/search.json?key=secret123&q=Paris"),
            "https://api.weatherapi.com/v1/search.json?key=***&q=Paris"
        );
        assert_eq!(redact_key("http://example.com/?q=1"), "http://example.com/?q=1");
    }

    #[test]
    fn test_client_requires_api_key() {
        let config = WeatherConfig::default();
        let err = WeatherApiClient::new(&config).err().unwrap();
        assert_eq!(err.code(), ErrorCode::ConfigInvalid);
    }
}
