pub mod error;
pub mod property;
pub mod property_backend;
pub mod property_repository;
pub mod property_service;
pub mod property_store;
pub mod validation;

pub use error::PropertyError;
pub use property::{NewProperty, PropertyFilter, PropertyRecord, SortDirection};
pub use property_backend::{PropertyStore, StoreError, StoreResult};
pub use property_repository::PropertyRepository;
pub use property_service::PropertyService;
pub use property_store::SqlitePropertyStore;
pub use validation::FieldViolation;
