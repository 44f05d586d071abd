//! Async access to a property store.
//!
//! `PropertyRepository` wraps any `PropertyStore` behind a mutex and runs
//! each call on the blocking thread pool, so handlers never block the
//! runtime on SQLite I/O.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::property::{PropertyFilter, PropertyRecord, SortDirection};
use crate::property_backend::{PropertyStore, StoreError, StoreResult};
use crate::property_store::SqlitePropertyStore;

#[derive(Clone)]
pub struct PropertyRepository {
    store: Arc<Mutex<Box<dyn PropertyStore>>>,
}

impl PropertyRepository {
    pub fn new<S: PropertyStore + 'static>(store: S) -> Self {
        let store: Box<dyn PropertyStore> = Box::new(store);
        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// Create a repository backed by SQLite storage.
    pub fn sqlite(store: SqlitePropertyStore) -> Self {
        Self::new(store)
    }

    async fn run<T, F>(&self, operation: F) -> StoreResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&dyn PropertyStore) -> StoreResult<T> + Send + 'static,
    {
        let store = self.store.clone();
        tokio::task::spawn_blocking(move || {
            let guard = store.lock();
            operation(&**guard)
        })
        .await
        .map_err(|e| StoreError::storage(format!("Store task failed: {}", e)))?
    }

    pub async fn insert(&self, record: PropertyRecord) -> StoreResult<()> {
        self.run(move |store| store.insert(&record)).await
    }

    pub async fn list(&self, filter: PropertyFilter, sort: SortDirection) -> StoreResult<Vec<PropertyRecord>> {
        self.run(move |store| store.list(&filter, sort)).await
    }

    pub async fn get(&self, id: &str) -> StoreResult<Option<PropertyRecord>> {
        let id = id.to_string();
        self.run(move |store| store.get(&id)).await
    }

    pub async fn delete(&self, id: &str) -> StoreResult<()> {
        let id = id.to_string();
        self.run(move |store| store.delete(&id)).await
    }

    pub async fn count(&self) -> StoreResult<usize> {
        self.run(|store| store.count()).await
    }

    pub async fn ping(&self) -> StoreResult<()> {
        self.run(|store| store.ping()).await
    }
}
