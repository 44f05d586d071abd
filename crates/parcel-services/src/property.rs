//! Property record types.

use chrono::{DateTime, SubsecRound, Utc};
use parcel_weather::{WeatherReport, WeatherSnapshot};
use serde::{Deserialize, Serialize};

/// A stored property, enriched with the weather observed when it was created.
///
/// Records are immutable once written; the only later operation is deletion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyRecord {
    pub id: String,
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub weather_snapshot: WeatherSnapshot,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
}

impl PropertyRecord {
    /// Combine validated input with a successful weather lookup.
    ///
    /// Generates a fresh identifier and stamps the creation time, truncated
    /// to the microsecond precision the store keeps.
    pub fn from_lookup(input: NewProperty, report: WeatherReport) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            street: input.street,
            city: input.city,
            state: input.state,
            zip_code: input.zip_code,
            weather_snapshot: report.snapshot,
            latitude: report.latitude,
            longitude: report.longitude,
            created_at: Utc::now().trunc_subsecs(6),
        }
    }
}

/// Input for creating a property.
///
/// Missing JSON fields default to empty strings so they surface as
/// validation violations alongside any others.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NewProperty {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl NewProperty {
    pub fn new(
        street: impl Into<String>,
        city: impl Into<String>,
        state: impl Into<String>,
        zip_code: impl Into<String>,
    ) -> Self {
        Self {
            street: street.into(),
            city: city.into(),
            state: state.into(),
            zip_code: zip_code.into(),
        }
    }

    /// Address string sent to the weather provider:
    /// `"{street}, {city}, {state} {zipCode}"`.
    pub fn address(&self) -> String {
        format!("{}, {}, {} {}", self.street, self.city, self.state, self.zip_code)
    }
}

/// Exact-match filter; all present fields must match (AND).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
}

impl PropertyFilter {
    /// Treat empty values (e.g. `?city=`) as unconstrained.
    pub fn normalized(self) -> Self {
        fn non_empty(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.is_empty())
        }

        Self {
            city: non_empty(self.city),
            state: non_empty(self.state),
            zip_code: non_empty(self.zip_code),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.city.is_none() && self.state.is_none() && self.zip_code.is_none()
    }
}

/// Ordering on `createdAt`. Newest first unless asked otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    Asc,
    #[default]
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse of `asc` / `desc`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(Self::Asc),
            "desc" => Some(Self::Desc),
            _ => None,
        }
    }

    pub(crate) fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}
