//! Daily forecast entries

use super::Condition;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Forecast for one calendar day at the resolved location
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct DailyForecast {
    pub date: NaiveDate,
    pub min_temp_c: f64,
    pub max_temp_c: f64,
    pub avg_temp_c: f64,
    pub condition: Condition,
    /// Total precipitation in mm
    pub total_precip_mm: f64,
    /// Average relative humidity in percent
    pub avg_humidity: f64,
    /// Maximum wind speed in km/h
    pub max_wind_kph: f64,
    /// `None` during polar day or night
    pub sunrise: Option<NaiveTime>,
    pub sunset: Option<NaiveTime>,
}

impl DailyForecast {
    /// Short weekday name, e.g. `Mon`
    #[must_use]
    pub fn weekday(&self) -> String {
        self.date.format("%a").to_string()
    }

    /// Format temperature range with unit
    #[must_use]
    pub fn format_temperature_range(&self) -> String {
        format!("{:.0}°C / {:.0}°C", self.min_temp_c, self.max_temp_c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weekday_and_range() {
        let day = DailyForecast {
            date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
            min_temp_c: 3.4,
            max_temp_c: 12.6,
            avg_temp_c: 8.1,
            condition: Condition {
                code: 1000,
                text: "Sunny".to_string(),
                icon: String::new(),
            },
            total_precip_mm: 0.0,
            avg_humidity: 64.0,
            max_wind_kph: 14.4,
            sunrise: NaiveTime::from_hms_opt(6, 12, 0),
            sunset: NaiveTime::from_hms_opt(18, 5, 0),
        };

        assert_eq!(day.weekday(), "Fri");
        assert_eq!(day.format_temperature_range(), "3°C / 13°C");
    }
}
