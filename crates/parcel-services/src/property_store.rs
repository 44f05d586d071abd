//! SQLite-based property storage implementation.
//!
//! This module provides `SqlitePropertyStore`, the relational implementation
//! of the `PropertyStore` trait. The weather snapshot is kept as a JSON text
//! column; it and the coordinates are all `NOT NULL`, so a record can never
//! be stored with one and not the others.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection};
use std::path::Path;

use crate::property::{PropertyFilter, PropertyRecord, SortDirection};
use crate::property_backend::{PropertyStore, StoreError, StoreResult};

const COLUMNS: &str =
    "id, street, city, state, zip_code, weather, latitude, longitude, created_at";

/// SQLite-based property storage.
pub struct SqlitePropertyStore {
    conn: Connection,
}

impl SqlitePropertyStore {
    /// Open (or create) a property store at the given path.
    ///
    /// Creates the schema if it doesn't exist.
    pub fn new<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Create an in-memory property store (tests and ephemeral runs).
    pub fn in_memory() -> anyhow::Result<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> anyhow::Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS properties (
                id TEXT PRIMARY KEY NOT NULL,
                street TEXT NOT NULL,
                city TEXT NOT NULL,
                state TEXT NOT NULL,
                zip_code TEXT NOT NULL,
                weather TEXT NOT NULL,
                latitude REAL NOT NULL,
                longitude REAL NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_properties_created_at ON properties(created_at);
            CREATE INDEX IF NOT EXISTS idx_properties_state_city ON properties(state, city);
            "#,
        )?;
        Ok(())
    }

    /// Fixed-width RFC 3339 so text order equals time order.
    fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
        timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Convert a database row to a PropertyRecord.
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<PropertyRecord> {
        let weather_str: String = row.get(5)?;
        let created_at_str: String = row.get(8)?;

        let weather_snapshot = serde_json::from_str(&weather_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, Type::Text, Box::new(e)))?;
        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Text, Box::new(e)))?;

        Ok(PropertyRecord {
            id: row.get(0)?,
            street: row.get(1)?,
            city: row.get(2)?,
            state: row.get(3)?,
            zip_code: row.get(4)?,
            weather_snapshot,
            latitude: row.get(6)?,
            longitude: row.get(7)?,
            created_at,
        })
    }
}

impl PropertyStore for SqlitePropertyStore {
    fn insert(&self, record: &PropertyRecord) -> StoreResult<()> {
        let weather = serde_json::to_string(&record.weather_snapshot)
            .map_err(|e| StoreError::storage(format!("Failed to encode weather snapshot: {}", e)))?;

        self.conn.execute(
            r#"
            INSERT INTO properties (id, street, city, state, zip_code, weather, latitude, longitude, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.street,
                record.city,
                record.state,
                record.zip_code,
                weather,
                record.latitude,
                record.longitude,
                Self::format_timestamp(&record.created_at),
            ],
        )?;

        tracing::debug!("Inserted property: {}", record.id);
        Ok(())
    }

    fn list(&self, filter: &PropertyFilter, sort: SortDirection) -> StoreResult<Vec<PropertyRecord>> {
        let mut clauses = Vec::new();
        let mut values: Vec<&str> = Vec::new();

        for (column, value) in [
            ("city", &filter.city),
            ("state", &filter.state),
            ("zip_code", &filter.zip_code),
        ] {
            if let Some(value) = value {
                values.push(value);
                clauses.push(format!("{} = ?{}", column, values.len()));
            }
        }

        let where_clause = if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        };
        let direction = sort.as_sql();
        let sql = format!(
            "SELECT {} FROM properties {} ORDER BY created_at {}, rowid {}",
            COLUMNS, where_clause, direction, direction
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values), Self::row_to_record)?;

        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn get(&self, id: &str) -> StoreResult<Option<PropertyRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {} FROM properties WHERE id = ?1", COLUMNS))?;

        let mut rows = stmt.query(params![id])?;

        match rows.next()? {
            Some(row) => Ok(Some(Self::row_to_record(row)?)),
            None => Ok(None),
        }
    }

    fn exists(&self, id: &str) -> StoreResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM properties WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    fn delete(&self, id: &str) -> StoreResult<()> {
        if !self.exists(id)? {
            return Err(StoreError::not_found(id));
        }

        let affected = self
            .conn
            .execute("DELETE FROM properties WHERE id = ?1", params![id])?;

        // Someone else got there between the check and the delete
        if affected == 0 {
            return Err(StoreError::not_found(id));
        }

        tracing::debug!("Deleted property: {}", id);
        Ok(())
    }

    fn count(&self) -> StoreResult<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM properties", [], |row| row.get(0))?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    fn ping(&self) -> StoreResult<()> {
        let _: i64 = self.conn.query_row("SELECT 1", [], |row| row.get(0))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;
    use chrono::{Duration, TimeZone};
    use parcel_weather::WeatherSnapshot;

    fn create_test_store() -> SqlitePropertyStore {
        SqlitePropertyStore::in_memory().expect("Failed to create in-memory store")
    }

    fn snapshot(temperature: f64) -> WeatherSnapshot {
        WeatherSnapshot {
            temperature,
            conditions: vec!["Sunny".to_string(), "Haze".to_string()],
            humidity: 35.0,
            wind_speed: 5.0,
            observed_at: "05:30 PM".to_string(),
            feels_like: 73.0,
        }
    }

    fn record(id: &str, city: &str, state: &str, zip: &str, minute: u32) -> PropertyRecord {
        PropertyRecord {
            id: id.to_string(),
            street: format!("{} Main St", minute),
            city: city.to_string(),
            state: state.to_string(),
            zip_code: zip.to_string(),
            weather_snapshot: snapshot(70.0 + f64::from(minute)),
            latitude: 33.609,
            longitude: -111.729,
            created_at: Utc.with_ymd_and_hms(2026, 1, 30, 12, minute, 0).unwrap(),
        }
    }

    fn ids(records: &[PropertyRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_insert_and_get_round_trip() {
        let store = create_test_store();
        let mut original = record("a", "Fountain Hills", "AZ", "85268", 0);
        original.created_at = original.created_at + Duration::microseconds(123_456);

        store.insert(&original).unwrap();
        let retrieved = store.get("a").unwrap().unwrap();

        assert_eq!(retrieved, original);
    }

    #[test]
    fn test_get_nonexistent() {
        let store = create_test_store();
        assert!(store.get("missing").unwrap().is_none());
    }

    #[test]
    fn test_duplicate_id_is_storage_error() {
        let store = create_test_store();
        store.insert(&record("a", "Mesa", "AZ", "85201", 0)).unwrap();

        let result = store.insert(&record("a", "Mesa", "AZ", "85201", 1));
        assert!(matches!(result, Err(StoreError::Storage(_))));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_list_default_newest_first() {
        let store = create_test_store();
        store.insert(&record("old", "Mesa", "AZ", "85201", 1)).unwrap();
        store.insert(&record("new", "Mesa", "AZ", "85201", 3)).unwrap();
        store.insert(&record("mid", "Mesa", "AZ", "85201", 2)).unwrap();

        let desc = store.list(&PropertyFilter::default(), SortDirection::Desc).unwrap();
        assert_eq!(ids(&desc), vec!["new", "mid", "old"]);

        let asc = store.list(&PropertyFilter::default(), SortDirection::Asc).unwrap();
        assert_eq!(ids(&asc), vec!["old", "mid", "new"]);
    }

    #[test]
    fn test_list_ties_follow_insertion_order() {
        let store = create_test_store();
        store.insert(&record("first", "Mesa", "AZ", "85201", 5)).unwrap();
        store.insert(&record("second", "Mesa", "AZ", "85201", 5)).unwrap();

        let asc = store.list(&PropertyFilter::default(), SortDirection::Asc).unwrap();
        assert_eq!(ids(&asc), vec!["first", "second"]);

        let desc = store.list(&PropertyFilter::default(), SortDirection::Desc).unwrap();
        assert_eq!(ids(&desc), vec!["second", "first"]);
    }

    #[test]
    fn test_list_filters_are_conjunctive_and_case_sensitive() {
        let store = create_test_store();
        store.insert(&record("az-mesa", "Mesa", "AZ", "85201", 0)).unwrap();
        store.insert(&record("az-tempe", "Tempe", "AZ", "85281", 1)).unwrap();
        store.insert(&record("co-mesa", "Mesa", "CO", "81643", 2)).unwrap();

        let by_state = PropertyFilter {
            state: Some("AZ".to_string()),
            ..Default::default()
        };
        let result = store.list(&by_state, SortDirection::Asc).unwrap();
        assert_eq!(ids(&result), vec!["az-mesa", "az-tempe"]);

        let by_city_and_state = PropertyFilter {
            city: Some("Mesa".to_string()),
            state: Some("AZ".to_string()),
            zip_code: None,
        };
        let result = store.list(&by_city_and_state, SortDirection::Asc).unwrap();
        assert_eq!(ids(&result), vec!["az-mesa"]);

        let by_zip = PropertyFilter {
            zip_code: Some("81643".to_string()),
            ..Default::default()
        };
        assert_eq!(ids(&store.list(&by_zip, SortDirection::Asc).unwrap()), vec!["co-mesa"]);

        let lowercase = PropertyFilter {
            state: Some("az".to_string()),
            ..Default::default()
        };
        assert!(store.list(&lowercase, SortDirection::Asc).unwrap().is_empty());
    }

    #[test]
    fn test_delete_record() {
        let store = create_test_store();
        store.insert(&record("a", "Mesa", "AZ", "85201", 0)).unwrap();
        assert!(store.exists("a").unwrap());

        store.delete("a").unwrap();
        assert!(!store.exists("a").unwrap());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn test_delete_nonexistent() {
        let store = create_test_store();
        store.insert(&record("a", "Mesa", "AZ", "85201", 0)).unwrap();

        let result = store.delete("missing");
        assert!(matches!(result, Err(StoreError::NotFound(ref id)) if id == "missing"));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn test_second_delete_is_not_found() {
        let store = create_test_store();
        store.insert(&record("a", "Mesa", "AZ", "85201", 0)).unwrap();

        store.delete("a").unwrap();
        assert!(matches!(store.delete("a"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn test_corrupt_weather_column_is_reported() {
        let store = create_test_store();
        store.insert(&record("a", "Mesa", "AZ", "85201", 0)).unwrap();
        store
            .conn
            .execute("UPDATE properties SET weather = 'not json' WHERE id = 'a'", [])
            .unwrap();

        assert!(matches!(store.get("a"), Err(StoreError::Storage(_))));
    }

    #[test]
    fn test_schema_rejects_missing_weather() {
        let store = create_test_store();
        let result = store.conn.execute(
            "INSERT INTO properties (id, street, city, state, zip_code, latitude, longitude, created_at)
             VALUES ('x', '1 Main St', 'Mesa', 'AZ', '85201', 33.4, -111.8, '2026-01-30T12:00:00.000000Z')",
            [],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("properties.db");

        {
            let store = SqlitePropertyStore::new(&path).unwrap();
            store.insert(&record("a", "Mesa", "AZ", "85201", 0)).unwrap();
        }

        let store = SqlitePropertyStore::new(&path).unwrap();
        assert_eq!(store.count().unwrap(), 1);
        assert!(store.ping().is_ok());
    }
}
