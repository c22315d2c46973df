//! `WeatherDesk` - current conditions and 7-day forecasts for any place
//!
//! This library resolves free-text or coordinate queries against
//! WeatherAPI.com, falls back to suggested locations when a query does not
//! match, and supports "use my current location" through a pluggable
//! positioning capability.

pub mod api;
pub mod config;
pub mod error;
pub mod geolocation;
pub mod location_resolver;
pub mod logging;
pub mod models;
pub mod state;
pub mod web;

// Re-export core types for public API
pub use api::{LocationInput, LocationParser, WeatherApiClient, WeatherSource};
pub use config::WeatherDeskConfig;
pub use error::{ErrorCode, WeatherDeskError};
pub use geolocation::{Geolocator, Position, PositionError, PositionErrorCode, PositionOptions};
pub use location_resolver::LocationResolver;
pub use models::{DailyForecast, LocationCandidate, ResolvedLocation, WeatherSnapshot};
pub use state::{Notice, NoticeSeverity, ResolutionState, ResolveError, ViewState, WidgetView};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, WeatherDeskError>;
