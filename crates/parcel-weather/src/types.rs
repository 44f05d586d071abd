use serde::{Deserialize, Serialize};

/// Point-in-time weather captured when a property record is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherSnapshot {
    pub temperature: f64,
    pub conditions: Vec<String>,
    pub humidity: f64,
    pub wind_speed: f64,
    /// Provider-local observation time, e.g. `"05:30 PM"`
    pub observed_at: String,
    pub feels_like: f64,
}

/// Result of a successful lookup: the snapshot and the provider's
/// geocoding of the queried address. Always produced together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherReport {
    pub snapshot: WeatherSnapshot,
    pub latitude: f64,
    pub longitude: f64,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_snapshot_uses_camel_case_keys() {
        let snapshot = WeatherSnapshot {
            temperature: 75.0,
            conditions: vec!["Sunny".to_string()],
            humidity: 35.0,
            wind_speed: 5.0,
            observed_at: "05:30 PM".to_string(),
            feels_like: 73.0,
        };

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["windSpeed"], 5.0);
        assert_eq!(json["observedAt"], "05:30 PM");
        assert_eq!(json["feelsLike"], 73.0);
        assert_eq!(json["conditions"][0], "Sunny");
    }
}
