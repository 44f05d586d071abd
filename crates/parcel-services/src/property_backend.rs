//! Property storage backend trait and error types.
//!
//! This module defines the `PropertyStore` trait that abstracts over storage
//! implementations (SQLite in production, fakes in tests).

use thiserror::Error;

use crate::property::{PropertyFilter, PropertyRecord, SortDirection};

/// Errors that can occur during property store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Property not found: {0}")]
    NotFound(String),

    /// Database failure, corrupt row, lock poisoning, etc.
    #[error("Storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(error: rusqlite::Error) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Result type for property store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Trait for property storage backends.
///
/// Each method is a single atomic operation against the store. Implementations
/// don't need to be Sync; `PropertyRepository` serializes access via a Mutex.
pub trait PropertyStore: Send {
    /// Insert a fully built record.
    fn insert(&self, record: &PropertyRecord) -> StoreResult<()>;

    /// List records matching every present filter field, ordered by
    /// `created_at` in `sort` direction, ties broken by insertion order in
    /// the same direction.
    fn list(&self, filter: &PropertyFilter, sort: SortDirection) -> StoreResult<Vec<PropertyRecord>>;

    /// Get a record by ID.
    ///
    /// Returns `None` if the record doesn't exist.
    fn get(&self, id: &str) -> StoreResult<Option<PropertyRecord>>;

    fn exists(&self, id: &str) -> StoreResult<bool>;

    /// Delete a record.
    ///
    /// # Errors
    /// Returns `StoreError::NotFound` if the record doesn't exist.
    fn delete(&self, id: &str) -> StoreResult<()>;

    fn count(&self) -> StoreResult<usize>;

    /// Cheap round trip proving the store is reachable.
    fn ping(&self) -> StoreResult<()>;
}
