//! WeatherAPI.com response structures and conversion into domain models

use super::{
    AirQuality, Condition, CurrentConditions, DailyForecast, FORECAST_DAYS, ResolvedLocation,
    WeatherSnapshot,
};
use crate::{ErrorCode, Result, WeatherDeskError};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// `forecast.json` response
#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    pub location: LocationData,
    pub current: CurrentData,
    pub forecast: ForecastData,
}

#[derive(Debug, Deserialize)]
pub struct LocationData {
    pub name: String,
    #[serde(default)]
    pub region: String,
    pub country: String,
    pub lat: f64,
    pub lon: f64,
    pub tz_id: String,
    /// `YYYY-MM-DD H:MM`, hour not zero-padded
    pub localtime: String,
}

#[derive(Debug, Deserialize)]
pub struct ConditionData {
    pub text: String,
    #[serde(default)]
    pub icon: String,
    pub code: u16,
}

#[derive(Debug, Deserialize)]
pub struct CurrentData {
    pub temp_c: f64,
    pub feelslike_c: f64,
    pub humidity: u8,
    pub wind_kph: f64,
    pub precip_mm: f64,
    pub condition: ConditionData,
    pub air_quality: Option<AirQualityData>,
}

#[derive(Debug, Deserialize)]
pub struct AirQualityData {
    #[serde(rename = "us-epa-index")]
    pub us_epa_index: Option<u8>,
    pub pm2_5: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastData {
    pub forecastday: Vec<ForecastDay>,
}

#[derive(Debug, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub day: DayData,
    pub astro: AstroData,
}

#[derive(Debug, Deserialize)]
pub struct DayData {
    pub maxtemp_c: f64,
    pub mintemp_c: f64,
    pub avgtemp_c: f64,
    pub totalprecip_mm: f64,
    pub avghumidity: f64,
    pub maxwind_kph: f64,
    pub condition: ConditionData,
}

#[derive(Debug, Deserialize)]
pub struct AstroData {
    /// `06:12 AM`, or `No sunrise` near the poles
    pub sunrise: String,
    pub sunset: String,
}

/// Body of every non-2xx response
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    pub code: u32,
    pub message: String,
}

impl ErrorResponse {
    /// Convert into a crate error, classifying the provider code
    #[must_use]
    pub fn into_error(self, query: &str) -> WeatherDeskError {
        WeatherDeskError::api_with_context(
            self.error.message,
            ErrorCode::from_provider_code(self.error.code),
            HashMap::from([
                ("query".to_string(), query.to_string()),
                ("provider_code".to_string(), self.error.code.to_string()),
            ]),
        )
    }
}

impl From<ConditionData> for Condition {
    fn from(value: ConditionData) -> Self {
        Self {
            code: value.code,
            text: value.text,
            icon: value.icon,
        }
    }
}

fn invalid(message: String) -> WeatherDeskError {
    WeatherDeskError::api(message, ErrorCode::ApiInvalidResponse)
}

fn parse_astro_time(value: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(value.trim(), "%I:%M %p").ok()
}

impl ForecastResponse {
    /// Convert the wire response into a [`WeatherSnapshot`].
    ///
    /// Fails when the response does not carry exactly [`FORECAST_DAYS`] days
    /// or any date field cannot be parsed.
    pub fn into_snapshot(self) -> Result<WeatherSnapshot> {
        let days = self.forecast.forecastday.len();
        if days != FORECAST_DAYS {
            return Err(invalid(format!(
                "Expected {FORECAST_DAYS} forecast days, got {days}"
            )));
        }

        let local_time = NaiveDateTime::parse_from_str(&self.location.localtime, "%Y-%m-%d %H:%M")
            .map_err(|e| invalid(format!("Invalid local time '{}': {e}", self.location.localtime)))?;

        let location = ResolvedLocation {
            name: self.location.name,
            region: self.location.region,
            country: self.location.country,
            latitude: self.location.lat,
            longitude: self.location.lon,
            timezone: self.location.tz_id,
            local_time,
        };

        let air_quality = self.current.air_quality.and_then(|aq| {
            Some(AirQuality {
                us_epa_index: aq.us_epa_index?,
                pm2_5: aq.pm2_5.unwrap_or_default(),
            })
        });

        let current = CurrentConditions {
            temperature_c: self.current.temp_c,
            feels_like_c: self.current.feelslike_c,
            humidity: self.current.humidity,
            wind_kph: self.current.wind_kph,
            precipitation_mm: self.current.precip_mm,
            condition: self.current.condition.into(),
            air_quality,
        };

        let forecast = self
            .forecast
            .forecastday
            .into_iter()
            .map(|day| {
                let date = NaiveDate::parse_from_str(&day.date, "%Y-%m-%d")
                    .map_err(|e| invalid(format!("Invalid forecast date '{}': {e}", day.date)))?;
                Ok(DailyForecast {
                    date,
                    min_temp_c: day.day.mintemp_c,
                    max_temp_c: day.day.maxtemp_c,
                    avg_temp_c: day.day.avgtemp_c,
                    condition: day.day.condition.into(),
                    total_precip_mm: day.day.totalprecip_mm,
                    avg_humidity: day.day.avghumidity,
                    max_wind_kph: day.day.maxwind_kph,
                    sunrise: parse_astro_time(&day.astro.sunrise),
                    sunset: parse_astro_time(&day.astro.sunset),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(WeatherSnapshot {
            location,
            current,
            forecast,
            retrieved_at: Utc::now(),
        })
    }
}

/// Canned responses shared by unit tests
#[cfg(test)]
pub(crate) mod fixtures {
    use serde_json::{Value, json};

    pub fn forecast_json(days: usize) -> Value {
        let forecastday: Vec<Value> = (0..days)
            .map(|i| {
                json!({
                    "date": format!("2025-03-{:02}", 14 + i),
                    "date_epoch": 1_741_910_400 + i * 86_400,
                    "day": {
                        "maxtemp_c": 12.6,
                        "mintemp_c": 3.4,
                        "avgtemp_c": 8.1,
                        "maxwind_kph": 14.4,
                        "totalprecip_mm": 0.2,
                        "avghumidity": 64,
                        "condition": { "text": "Sunny", "icon": "//cdn.weatherapi.com/113.png", "code": 1000 }
                    },
                    "astro": { "sunrise": "06:12 AM", "sunset": "06:05 PM" }
                })
            })
            .collect();

        json!({
            "location": {
                "name": "Paris",
                "region": "Ile-de-France",
                "country": "France",
                "lat": 48.87,
                "lon": 2.33,
                "tz_id": "Europe/Paris",
                "localtime_epoch": 1_741_943_100,
                "localtime": "2025-03-14 9:05"
            },
            "current": {
                "temp_c": 9.0,
                "feelslike_c": 7.2,
                "humidity": 81,
                "wind_kph": 11.2,
                "precip_mm": 0.0,
                "condition": { "text": "Partly cloudy", "icon": "//cdn.weatherapi.com/116.png", "code": 1003 },
                "air_quality": { "us-epa-index": 2, "pm2_5": 14.5 }
            },
            "forecast": { "forecastday": forecastday }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(value: serde_json::Value) -> ForecastResponse {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_snapshot_conversion() {
        let snapshot = parse(fixtures::forecast_json(7)).into_snapshot().unwrap();

        assert_eq!(snapshot.location.display_name(), "Paris, France");
        assert_eq!(snapshot.location.timezone, "Europe/Paris");
        assert_eq!(
            snapshot.location.local_time,
            NaiveDate::from_ymd_opt(2025, 3, 14)
                .unwrap()
                .and_hms_opt(9, 5, 0)
                .unwrap()
        );
        assert_eq!(snapshot.current.humidity, 81);
        assert_eq!(snapshot.current.condition.code, 1003);
        assert_eq!(
            snapshot.current.air_quality,
            Some(AirQuality {
                us_epa_index: 2,
                pm2_5: 14.5
            })
        );
        assert_eq!(snapshot.forecast.len(), FORECAST_DAYS);
        assert_eq!(snapshot.forecast[0].sunrise, NaiveTime::from_hms_opt(6, 12, 0));
        assert_eq!(snapshot.forecast[0].sunset, NaiveTime::from_hms_opt(18, 5, 0));
        assert!(snapshot.forecast.windows(2).all(|w| w[0].date < w[1].date));
    }

    #[test]
    fn test_snapshot_rejects_short_forecast() {
        let err = parse(fixtures::forecast_json(3)).into_snapshot().unwrap_err();
        assert_eq!(err.code(), ErrorCode::ApiInvalidResponse);
        assert!(err.to_string().contains("Expected 7 forecast days, got 3"));
    }

    #[test]
    fn test_missing_air_quality_index() {
        let mut value = fixtures::forecast_json(7);
        value["current"]["air_quality"] = serde_json::json!({ "pm2_5": 3.0 });
        let snapshot = parse(value).into_snapshot().unwrap();
        assert!(snapshot.current.air_quality.is_none());
    }

    #[test]
    fn test_polar_astro_values() {
        assert_eq!(parse_astro_time("No sunrise"), None);
        assert_eq!(parse_astro_time("07:45 PM"), NaiveTime::from_hms_opt(19, 45, 0));
    }

    #[test]
    fn test_error_body_mapping() {
        let body: ErrorResponse = serde_json::from_str(
            r#"{"error":{"code":1006,"message":"No matching location found."}}"#,
        )
        .unwrap();
        let err = body.into_error("Atlantis");
        assert!(err.is_location_not_found());
        assert_eq!(err.message(), "No matching location found.");
        match err {
            WeatherDeskError::Api { context, .. } => {
                assert_eq!(context.get("query").map(String::as_str), Some("Atlantis"));
                assert_eq!(context.get("provider_code").map(String::as_str), Some("1006"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
