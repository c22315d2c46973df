//! Current conditions, air quality and the complete weather snapshot

use super::{DailyForecast, ResolvedLocation};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Number of daily entries every snapshot carries
pub const FORECAST_DAYS: usize = 7;

/// Full current-conditions-plus-forecast payload for one resolved location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WeatherSnapshot {
    pub location: ResolvedLocation,
    pub current: CurrentConditions,
    /// Exactly [`FORECAST_DAYS`] entries, in date order
    pub forecast: Vec<DailyForecast>,
    /// When this snapshot was retrieved
    pub retrieved_at: DateTime<Utc>,
}

/// Weather condition as reported by the service
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Condition {
    /// WeatherAPI.com condition code (1000 = clear, ...)
    pub code: u16,
    pub text: String,
    /// Icon URL supplied by the service
    pub icon: String,
}

impl Condition {
    #[must_use]
    pub fn category(&self) -> ConditionCategory {
        ConditionCategory::from_code(self.code)
    }
}

/// Current weather conditions
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CurrentConditions {
    /// Temperature in Celsius
    pub temperature_c: f64,
    /// Apparent temperature in Celsius
    pub feels_like_c: f64,
    /// Relative humidity in percent
    pub humidity: u8,
    /// Wind speed in km/h
    pub wind_kph: f64,
    /// Precipitation in mm
    pub precipitation_mm: f64,
    pub condition: Condition,
    /// Present when the service returned air quality data
    pub air_quality: Option<AirQuality>,
}

impl CurrentConditions {
    /// Format temperature with unit
    #[must_use]
    pub fn format_temperature(&self) -> String {
        format!("{:.1}°C (feels like {:.1}°C)", self.temperature_c, self.feels_like_c)
    }

    /// Format wind information
    #[must_use]
    pub fn format_wind(&self) -> String {
        format!("{:.1} km/h", self.wind_kph)
    }
}

/// Air quality readings
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct AirQuality {
    /// US EPA index, 1 (good) to 6 (hazardous)
    pub us_epa_index: u8,
    /// Fine particulate matter in µg/m³
    pub pm2_5: f64,
}

impl AirQuality {
    #[must_use]
    pub fn level(&self) -> AirQualityLevel {
        AirQualityLevel::from_epa_index(self.us_epa_index)
    }
}

/// US EPA air quality band
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AirQualityLevel {
    Good,
    Moderate,
    UnhealthyForSensitiveGroups,
    Unhealthy,
    VeryUnhealthy,
    Hazardous,
    Unknown,
}

impl AirQualityLevel {
    #[must_use]
    pub fn from_epa_index(index: u8) -> Self {
        match index {
            1 => Self::Good,
            2 => Self::Moderate,
            3 => Self::UnhealthyForSensitiveGroups,
            4 => Self::Unhealthy,
            5 => Self::VeryUnhealthy,
            6 => Self::Hazardous,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "Good",
            Self::Moderate => "Moderate",
            Self::UnhealthyForSensitiveGroups => "Unhealthy for Sensitive Groups",
            Self::Unhealthy => "Unhealthy",
            Self::VeryUnhealthy => "Very Unhealthy",
            Self::Hazardous => "Hazardous",
            Self::Unknown => "Unknown",
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Good => "Air quality is satisfactory, and air pollution poses little or no risk.",
            Self::Moderate => {
                "Air quality is acceptable. However, there may be a risk for some people."
            }
            Self::UnhealthyForSensitiveGroups => {
                "Members of sensitive groups may experience health effects."
            }
            Self::Unhealthy => "Everyone may begin to experience health effects.",
            Self::VeryUnhealthy => {
                "Health alert: everyone may experience more serious health effects."
            }
            Self::Hazardous => {
                "Health warnings of emergency conditions. The entire population is likely to be affected."
            }
            Self::Unknown => "Air quality information unavailable.",
        }
    }
}

/// Coarse grouping of WeatherAPI.com condition codes
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConditionCategory {
    Clear,
    PartlyCloudy,
    Cloudy,
    Fog,
    Rain,
    Thunderstorm,
    Snow,
    Other,
}

impl ConditionCategory {
    /// See <https://www.weatherapi.com/docs/weather_conditions.json>
    #[must_use]
    pub fn from_code(code: u16) -> Self {
        match code {
            1000 => Self::Clear,
            1003 => Self::PartlyCloudy,
            1006 | 1009 => Self::Cloudy,
            1030 | 1135 | 1147 => Self::Fog,
            // thunder with snow is still a thunderstorm
            1087 | 1273 | 1276 | 1279 | 1282 => Self::Thunderstorm,
            1063 | 1150 | 1153 | 1180 | 1183 | 1186 | 1189 | 1192 | 1195 | 1240 | 1243 | 1246 => {
                Self::Rain
            }
            1066 | 1114 | 1117 | 1210 | 1213 | 1216 | 1219 | 1222 | 1225 | 1255 | 1258 => {
                Self::Snow
            }
            _ => Self::Other,
        }
    }

    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::PartlyCloudy => "Partly Cloudy",
            Self::Cloudy => "Cloudy",
            Self::Fog => "Fog",
            Self::Rain => "Rain",
            Self::Thunderstorm => "Thunderstorm",
            Self::Snow => "Snow",
            Self::Other => "Other",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(1, AirQualityLevel::Good)]
    #[case(3, AirQualityLevel::UnhealthyForSensitiveGroups)]
    #[case(6, AirQualityLevel::Hazardous)]
    #[case(0, AirQualityLevel::Unknown)]
    #[case(7, AirQualityLevel::Unknown)]
    fn test_air_quality_levels(#[case] index: u8, #[case] expected: AirQualityLevel) {
        assert_eq!(AirQualityLevel::from_epa_index(index), expected);
    }

    #[test]
    fn test_air_quality_text() {
        let aq = AirQuality {
            us_epa_index: 2,
            pm2_5: 12.4,
        };
        assert_eq!(aq.level().label(), "Moderate");
        assert!(aq.level().description().contains("acceptable"));
        assert_eq!(AirQualityLevel::Unknown.description(), "Air quality information unavailable.");
    }

    #[rstest]
    #[case(1000, ConditionCategory::Clear)]
    #[case(1003, ConditionCategory::PartlyCloudy)]
    #[case(1009, ConditionCategory::Cloudy)]
    #[case(1135, ConditionCategory::Fog)]
    #[case(1195, ConditionCategory::Rain)]
    #[case(1225, ConditionCategory::Snow)]
    #[case(1282, ConditionCategory::Thunderstorm)]
    #[case(1279, ConditionCategory::Thunderstorm)]
    #[case(4242, ConditionCategory::Other)]
    fn test_condition_categories(#[case] code: u16, #[case] expected: ConditionCategory) {
        assert_eq!(ConditionCategory::from_code(code), expected);
    }

    #[test]
    fn test_current_formatting() {
        let current = CurrentConditions {
            temperature_c: 15.0,
            feels_like_c: 13.26,
            humidity: 72,
            wind_kph: 11.2,
            precipitation_mm: 0.0,
            condition: Condition {
                code: 1003,
                text: "Partly cloudy".to_string(),
                icon: String::new(),
            },
            air_quality: None,
        };
        assert_eq!(current.format_temperature(), "15.0°C (feels like 13.3°C)");
        assert_eq!(current.format_wind(), "11.2 km/h");
        assert_eq!(current.condition.category(), ConditionCategory::PartlyCloudy);
    }
}
