//! Error types and handling for `WeatherDesk`

use std::collections::HashMap;
use thiserror::Error;

/// Machine-readable classification of a [`WeatherDeskError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// Configuration could not be loaded or failed validation
    ConfigInvalid,
    /// The weather service could not match the query to a location
    ApiLocationNotFound,
    /// API key missing, invalid or disabled
    ApiUnauthorized,
    /// Monthly call quota exhausted
    ApiQuotaExceeded,
    /// The service answered with a body we could not decode
    ApiInvalidResponse,
    /// Transport-level failure after all retries
    ApiNetworkError,
    /// Any other error reported by the service
    ApiRequestFailed,
    /// Input rejected before reaching the network
    InvalidInput,
    /// Anything else
    Internal,
}

impl ErrorCode {
    /// Map a WeatherAPI.com error code to our classification.
    ///
    /// See <https://www.weatherapi.com/docs/#intro-error-codes>.
    #[must_use]
    pub fn from_provider_code(code: u32) -> Self {
        match code {
            1006 => Self::ApiLocationNotFound,
            1002 | 2006 | 2008 => Self::ApiUnauthorized,
            2007 => Self::ApiQuotaExceeded,
            _ => Self::ApiRequestFailed,
        }
    }
}

/// Main error type for `WeatherDesk`
#[derive(Error, Debug)]
pub enum WeatherDeskError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Weather service errors
    #[error("API error: {message}")]
    Api {
        message: String,
        code: ErrorCode,
        context: HashMap<String, String>,
    },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    /// General application errors
    #[error("Application error: {message}")]
    General { message: String },
}

impl WeatherDeskError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new API error without extra context
    pub fn api<S: Into<String>>(message: S, code: ErrorCode) -> Self {
        Self::api_with_context(message, code, HashMap::new())
    }

    /// Create a new API error carrying request context (query, status, ...)
    pub fn api_with_context<S: Into<String>>(
        message: S,
        code: ErrorCode,
        context: HashMap<String, String>,
    ) -> Self {
        Self::Api {
            message: message.into(),
            code,
            context,
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new general error
    pub fn general<S: Into<String>>(message: S) -> Self {
        Self::General {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Config { .. } => ErrorCode::ConfigInvalid,
            Self::Api { code, .. } => *code,
            Self::Validation { .. } => ErrorCode::InvalidInput,
            Self::Io { .. } | Self::General { .. } => ErrorCode::Internal,
        }
    }

    /// True when the service reported that the query matched no location
    #[must_use]
    pub fn is_location_not_found(&self) -> bool {
        self.code() == ErrorCode::ApiLocationNotFound
    }

    /// The bare message without the variant prefix, suitable for notices
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Config { message }
            | Self::Api { message, .. }
            | Self::Validation { message }
            | Self::General { message } => message.clone(),
            Self::Io { source } => source.to_string(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            WeatherDeskError::Config { .. } => {
                "Configuration error. Please check your config file and API key.".to_string()
            }
            WeatherDeskError::Api { code, message, .. } => match code {
                ErrorCode::ApiUnauthorized => {
                    "The weather service rejected the API key. Please check your configuration."
                        .to_string()
                }
                ErrorCode::ApiNetworkError => {
                    "Unable to reach the weather service. Please check your internet connection."
                        .to_string()
                }
                _ => message.clone(),
            },
            WeatherDeskError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            WeatherDeskError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
            WeatherDeskError::General { message } => message.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_error_creation() {
        let config_err = WeatherDeskError::config("missing API key");
        assert!(matches!(config_err, WeatherDeskError::Config { .. }));

        let api_err = WeatherDeskError::api("connection failed", ErrorCode::ApiNetworkError);
        assert!(matches!(api_err, WeatherDeskError::Api { .. }));
        assert_eq!(api_err.code(), ErrorCode::ApiNetworkError);

        let validation_err = WeatherDeskError::validation("invalid coordinates");
        assert_eq!(validation_err.code(), ErrorCode::InvalidInput);
    }

    #[rstest]
    #[case(1006, ErrorCode::ApiLocationNotFound)]
    #[case(1002, ErrorCode::ApiUnauthorized)]
    #[case(2006, ErrorCode::ApiUnauthorized)]
    #[case(2008, ErrorCode::ApiUnauthorized)]
    #[case(2007, ErrorCode::ApiQuotaExceeded)]
    #[case(1003, ErrorCode::ApiRequestFailed)]
    #[case(9999, ErrorCode::ApiRequestFailed)]
    fn test_provider_code_mapping(#[case] provider: u32, #[case] expected: ErrorCode) {
        assert_eq!(ErrorCode::from_provider_code(provider), expected);
    }

    #[test]
    fn test_location_not_found_detection() {
        let err = WeatherDeskError::api("No matching location found.", ErrorCode::ApiLocationNotFound);
        assert!(err.is_location_not_found());
        assert_eq!(err.message(), "No matching location found.");

        let other = WeatherDeskError::api("boom", ErrorCode::ApiRequestFailed);
        assert!(!other.is_location_not_found());
    }

    #[test]
    fn test_user_messages() {
        let config_err = WeatherDeskError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let api_err = WeatherDeskError::api("test", ErrorCode::ApiNetworkError);
        assert!(api_err.user_message().contains("Unable to reach"));

        let passthrough = WeatherDeskError::api("Parameter q is missing.", ErrorCode::ApiRequestFailed);
        assert_eq!(passthrough.user_message(), "Parameter q is missing.");

        let validation_err = WeatherDeskError::validation("test input");
        assert!(validation_err.user_message().contains("test input"));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: WeatherDeskError = io_err.into();
        assert!(matches!(err, WeatherDeskError::Io { .. }));
        assert_eq!(err.code(), ErrorCode::Internal);
    }
}
