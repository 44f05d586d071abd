//! Error taxonomy for property operations.
//!
//! Lower layers pass errors upward unchanged in kind. `Display` output is
//! operator-facing; `user_message()` is what callers get to see.

use parcel_weather::WeatherError;
use thiserror::Error;

use crate::property_backend::StoreError;
use crate::validation::FieldViolation;

#[derive(Debug, Error)]
pub enum PropertyError {
    /// One or more input fields break a rule. Never touches external systems.
    #[error("Validation failed: {}", summarize(.0))]
    ValidationFailed(Vec<FieldViolation>),

    /// Provider answered with a client-class error or an unusable payload.
    #[error("Weather provider rejected the request: {0}")]
    WeatherRejected(String),

    /// Provider unreachable or failing after all retries.
    #[error("Weather provider unavailable after {attempts} attempts: {last_error}")]
    WeatherUnavailable { attempts: u32, last_error: String },

    #[error("Property not found: {0}")]
    NotFound(String),

    /// The store failed. Always surfaced, never swallowed.
    #[error("Persistence fault: {0}")]
    PersistenceFault(String),
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

impl PropertyError {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::ValidationFailed(_) => "validation_failed",
            Self::WeatherRejected(_) => "weather_rejected",
            Self::WeatherUnavailable { .. } => "weather_unavailable",
            Self::NotFound(_) => "not_found",
            Self::PersistenceFault(_) => "persistence_fault",
        }
    }

    /// Returns a user-friendly message without internal detail.
    pub fn user_message(&self) -> String {
        match self {
            Self::ValidationFailed(violations) => format!("Invalid input: {}", summarize(violations)),
            Self::WeatherRejected(_) => {
                "Weather data could not be retrieved for this address. Check the address and try again."
                    .to_string()
            }
            Self::WeatherUnavailable { .. } => {
                "The weather service is currently unavailable. Please try again later.".to_string()
            }
            Self::NotFound(id) => format!("Property {} was not found.", id),
            Self::PersistenceFault(_) => "The property could not be saved or loaded. Please try again.".to_string(),
        }
    }

    /// Field violations, if this is a validation failure.
    pub fn violations(&self) -> Option<&[FieldViolation]> {
        match self {
            Self::ValidationFailed(violations) => Some(violations.as_slice()),
            _ => None,
        }
    }
}

impl From<WeatherError> for PropertyError {
    fn from(error: WeatherError) -> Self {
        match error {
            WeatherError::Rejected { message } => Self::WeatherRejected(message),
            WeatherError::Unavailable {
                attempts,
                last_error,
            } => Self::WeatherUnavailable {
                attempts,
                last_error,
            },
        }
    }
}

impl From<StoreError> for PropertyError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::NotFound(id) => Self::NotFound(id),
            StoreError::Storage(message) => Self::PersistenceFault(message),
        }
    }
}
