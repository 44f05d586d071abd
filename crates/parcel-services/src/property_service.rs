//! Property use-cases: the creation pipeline plus query and delete.
//!
//! Creation runs validate, compose address, fetch weather, persist. Each
//! step gates the next; a failed weather lookup ends the request before
//! anything is written, so no record ever exists without its snapshot and
//! coordinates.

use std::sync::Arc;

use parcel_weather::WeatherLookup;
use tracing::instrument;

use crate::error::PropertyError;
use crate::property::{NewProperty, PropertyFilter, PropertyRecord, SortDirection};
use crate::property_repository::PropertyRepository;
use crate::validation::{validate_id, validate_new_property};

#[derive(Clone)]
pub struct PropertyService {
    weather: Arc<dyn WeatherLookup>,
    repository: PropertyRepository,
}

impl PropertyService {
    pub fn new(weather: Arc<dyn WeatherLookup>, repository: PropertyRepository) -> Self {
        Self { weather, repository }
    }

    pub fn repository(&self) -> &PropertyRepository {
        &self.repository
    }

    /// Create a property record enriched with current weather.
    ///
    /// # Errors
    /// - `ValidationFailed` listing every invalid field (no lookup is made)
    /// - `WeatherRejected` / `WeatherUnavailable` from the lookup (nothing is stored)
    /// - `PersistenceFault` if the insert fails
    #[instrument(skip(self, input), fields(city = %input.city, state = %input.state))]
    pub async fn create(&self, input: NewProperty) -> Result<PropertyRecord, PropertyError> {
        let violations = validate_new_property(&input);
        if !violations.is_empty() {
            tracing::debug!("Rejected property input with {} violations", violations.len());
            return Err(PropertyError::ValidationFailed(violations));
        }

        let address = input.address();
        let report = self.weather.fetch(&address).await.map_err(|e| {
            tracing::warn!("Weather lookup failed, property not created: {}", e);
            PropertyError::from(e)
        })?;

        let record = PropertyRecord::from_lookup(input, report);
        self.repository.insert(record.clone()).await.map_err(|e| {
            tracing::error!("Failed to persist property {}: {}", record.id, e);
            PropertyError::from(e)
        })?;

        tracing::info!("Created property {}", record.id);
        Ok(record)
    }

    /// List records matching `filter`, newest first unless `sort` says otherwise.
    ///
    /// # Errors
    /// `PersistenceFault` if the store fails.
    #[instrument(skip(self), level = "debug")]
    pub async fn list(
        &self,
        filter: PropertyFilter,
        sort: Option<SortDirection>,
    ) -> Result<Vec<PropertyRecord>, PropertyError> {
        let records = self
            .repository
            .list(filter.normalized(), sort.unwrap_or_default())
            .await?;
        Ok(records)
    }

    /// # Errors
    /// `ValidationFailed` for a blank id, `NotFound` if absent.
    #[instrument(skip(self), level = "debug")]
    pub async fn get_by_id(&self, id: &str) -> Result<PropertyRecord, PropertyError> {
        let id = validate_id(id)?;
        self.repository
            .get(id)
            .await?
            .ok_or_else(|| PropertyError::NotFound(id.to_string()))
    }

    /// Delete a record; returns `true` once it is gone.
    ///
    /// # Errors
    /// `ValidationFailed` for a blank id, `NotFound` if absent.
    #[instrument(skip(self))]
    pub async fn delete_by_id(&self, id: &str) -> Result<bool, PropertyError> {
        let id = validate_id(id)?;
        self.repository.delete(id).await?;
        tracing::info!("Deleted property {}", id);
        Ok(true)
    }

    /// Whether the store answers a trivial query.
    pub async fn health(&self) -> bool {
        match self.repository.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Store health check failed: {}", e);
                false
            }
        }
    }
}
