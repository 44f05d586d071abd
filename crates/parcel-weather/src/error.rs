//! Weather lookup errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WeatherError {
    /// The provider answered but refused the request or sent something we
    /// cannot use. Retrying will not help.
    #[error("Weather provider rejected the request: {message}")]
    Rejected { message: String },

    /// Every attempt failed with a transient error.
    #[error("Weather provider unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },
}

impl WeatherError {
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// User-friendly error message.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::Rejected { .. } => {
                "Weather data could not be retrieved for this address. Check the address and try again."
            }
            Self::Unavailable { .. } => {
                "The weather service is currently unavailable. Please try again later."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_carries_attempts() {
        let err = WeatherError::Unavailable {
            attempts: 3,
            last_error: "HTTP 503".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("3 attempts"));
        assert!(text.contains("HTTP 503"));
    }

    #[test]
    fn test_user_messages_hide_detail() {
        let err = WeatherError::rejected("invalid_access_key: You have not supplied a valid API Access Key");
        assert!(!err.user_message().contains("access"));
        assert!(WeatherError::Unavailable {
            attempts: 3,
            last_error: "timeout".to_string()
        }
        .user_message()
        .contains("unavailable"));
    }
}
