//! Weather lookup for Parcel
//!
//! Fetches current conditions and geocoordinates for a street address from
//! a Weatherstack-style provider, with bounded linear-backoff retries.

pub mod error;
pub mod provider;
pub mod retry;
pub mod types;

pub use error::WeatherError;
pub use provider::{WeatherClient, WeatherLookup};
pub use retry::{run_with_retry, AttemptError, RetryPolicy};
pub use types::*;
