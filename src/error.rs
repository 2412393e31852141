//! Error types and handling for the `FarmCast` service

use thiserror::Error;

/// Main error type for the `FarmCast` service
#[derive(Error, Debug)]
pub enum FarmcastError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Forecast provider communication errors
    #[error("Forecast provider error: {message}")]
    Provider { message: String },

    /// The provider does not know the requested location
    #[error("Location not found: {location}")]
    LocationNotFound { location: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache and history storage errors
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl FarmcastError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a new location-not-found error
    pub fn location_not_found<S: Into<String>>(location: S) -> Self {
        Self::LocationNotFound {
            location: location.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new storage error
    pub fn storage<S: Into<String>>(message: S) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            FarmcastError::Config { .. } => {
                "Service is not configured correctly. Please check the weather API key.".to_string()
            }
            FarmcastError::Provider { .. } => "Error fetching weather".to_string(),
            FarmcastError::LocationNotFound { location } => {
                format!("Location '{location}' was not found.")
            }
            FarmcastError::Validation { message } => message.clone(),
            FarmcastError::Storage { .. } => "Could not load history".to_string(),
            FarmcastError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

impl From<anyhow::Error> for FarmcastError {
    fn from(err: anyhow::Error) -> Self {
        FarmcastError::Storage {
            message: format!("{err:#}"),
        }
    }
}

impl From<reqwest_middleware::Error> for FarmcastError {
    fn from(err: reqwest_middleware::Error) -> Self {
        FarmcastError::Provider {
            message: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for FarmcastError {
    fn from(err: reqwest::Error) -> Self {
        FarmcastError::Provider {
            message: err.to_string(),
        }
    }
}
