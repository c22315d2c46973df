//! Data models for `WeatherDesk`
//!
//! - Location: resolved place identity and search candidates
//! - Weather: current conditions, air quality and the full snapshot
//! - Forecast: daily forecast entries
//! - `weatherapi`: wire format of the WeatherAPI.com service

pub mod forecast;
pub mod location;
pub mod weather;
pub mod weatherapi;

pub use forecast::DailyForecast;
pub use location::{LocationCandidate, ResolvedLocation};
pub use weather::{
    AirQuality, AirQualityLevel, Condition, ConditionCategory, CurrentConditions, FORECAST_DAYS,
    WeatherSnapshot,
};
