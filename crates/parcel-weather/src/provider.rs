use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use tracing::instrument;

use crate::error::WeatherError;
use crate::retry::{run_with_retry, AttemptError, RetryPolicy};
use crate::types::{WeatherReport, WeatherSnapshot};

pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;
pub const DEFAULT_UNITS: &str = "f";

/// Anything that can turn a street address into current weather plus
/// coordinates.
#[async_trait]
pub trait WeatherLookup: Send + Sync {
    /// Look up current conditions for `address`.
    ///
    /// # Errors
    /// `WeatherError::Rejected` for caller-class failures,
    /// `WeatherError::Unavailable` once retries are exhausted.
    async fn fetch(&self, address: &str) -> Result<WeatherReport, WeatherError>;
}

/// HTTP client for a Weatherstack-style `current` endpoint.
#[derive(Debug, Clone)]
pub struct WeatherClient {
    client: Arc<Client>,
    base_url: String,
    access_key: String,
    units: String,
    policy: RetryPolicy,
}

impl WeatherClient {
    /// Create a client with a fixed per-attempt `timeout` and the default
    /// retry policy.
    pub fn new(base_url: &str, access_key: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build weather HTTP client")?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.trim_end_matches('/').to_string(),
            access_key: access_key.into(),
            units: DEFAULT_UNITS.to_string(),
            policy: RetryPolicy::default(),
        })
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_units(mut self, units: impl Into<String>) -> Self {
        self.units = units.into();
        self
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// One lookup request, classified for the retry loop.
    async fn attempt(&self, address: &str) -> Result<WeatherReport, AttemptError> {
        let url = format!("{}/current", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[
                ("access_key", self.access_key.as_str()),
                ("query", address),
                ("units", self.units.as_str()),
            ])
            .send()
            .await
            .map_err(|e| AttemptError::from_reqwest(&e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AttemptError::from_status(status));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::from_reqwest(&e))?;

        parse_current(&body)
    }
}

#[async_trait]
impl WeatherLookup for WeatherClient {
    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, address: &str) -> Result<WeatherReport, WeatherError> {
        run_with_retry(&self.policy, |attempt| {
            tracing::debug!("Weather lookup attempt {}", attempt);
            self.attempt(address)
        })
        .await
    }
}

/// Parse a `current` response body into a report.
///
/// Missing `location` or `current` blocks, unparsable coordinates and
/// non-JSON bodies are all rejected outright.
pub fn parse_current(body: &str) -> Result<WeatherReport, AttemptError> {
    let payload: wire::CurrentResponse = serde_json::from_str(body)
        .map_err(|e| AttemptError::Rejected(format!("Malformed weather response: {}", e)))?;

    if let Some(error) = payload.error {
        return Err(error.classify());
    }

    let location = payload
        .location
        .ok_or_else(|| AttemptError::Rejected("Weather response is missing the location block".to_string()))?;
    let current = payload
        .current
        .ok_or_else(|| AttemptError::Rejected("Weather response is missing the current block".to_string()))?;

    let latitude = location
        .lat
        .to_f64()
        .ok_or_else(|| AttemptError::Rejected(format!("Invalid latitude: {:?}", location.lat)))?;
    let longitude = location
        .lon
        .to_f64()
        .ok_or_else(|| AttemptError::Rejected(format!("Invalid longitude: {:?}", location.lon)))?;

    Ok(WeatherReport {
        snapshot: WeatherSnapshot {
            temperature: current.temperature,
            conditions: current.weather_descriptions,
            humidity: current.humidity,
            wind_speed: current.wind_speed,
            observed_at: current.observation_time,
            feels_like: current.feelslike,
        },
        latitude,
        longitude,
    })
}

/// Provider response structures
mod wire {
    use serde::Deserialize;

    use crate::retry::AttemptError;

    /// Provider codes that mean "try again later" rather than "your request is wrong"
    const TRANSIENT_PROVIDER_CODES: [i64; 1] = [615];

    #[derive(Debug, Deserialize)]
    pub struct CurrentResponse {
        pub location: Option<Location>,
        pub current: Option<Current>,
        pub error: Option<ProviderError>,
    }

    #[derive(Debug, Deserialize)]
    pub struct Location {
        pub lat: Coordinate,
        pub lon: Coordinate,
    }

    /// The provider sends coordinates as strings; accept numbers too.
    #[derive(Debug, Deserialize)]
    #[serde(untagged)]
    pub enum Coordinate {
        Number(f64),
        Text(String),
    }

    impl Coordinate {
        pub fn to_f64(&self) -> Option<f64> {
            let value = match self {
                Self::Number(n) => *n,
                Self::Text(s) => s.trim().parse().ok()?,
            };
            value.is_finite().then_some(value)
        }
    }

    #[derive(Debug, Deserialize)]
    pub struct Current {
        pub temperature: f64,
        #[serde(default)]
        pub weather_descriptions: Vec<String>,
        pub humidity: f64,
        pub wind_speed: f64,
        pub observation_time: String,
        pub feelslike: f64,
    }

    #[derive(Debug, Deserialize)]
    pub struct ProviderError {
        pub code: i64,
        #[serde(rename = "type", default)]
        pub kind: String,
        #[serde(default)]
        pub info: String,
    }

    impl ProviderError {
        pub fn classify(&self) -> AttemptError {
            let message = format!("Provider error {} ({}): {}", self.code, self.kind, self.info);
            if (500..=599).contains(&self.code) || TRANSIENT_PROVIDER_CODES.contains(&self.code) {
                AttemptError::Transient(message)
            } else {
                AttemptError::Rejected(message)
            }
        }
    }
}
