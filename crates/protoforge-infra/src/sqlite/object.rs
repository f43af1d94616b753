//! SQLite storage for spawned objects.

use chrono::Utc;
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use protoforge_types::error::RepositoryError;
use protoforge_types::object::SpawnedObject;

use super::pool::DatabasePool;
use super::{format_datetime, parse_datetime, query_error};

/// Fields of an object about to be inserted. The ID and creation time are
/// assigned by the store.
#[derive(Debug, Clone, Default)]
pub struct NewObject {
    pub key: String,
    pub typeclass: String,
    pub prototype_key: Option<String>,
    pub location: Option<String>,
    pub home: Option<String>,
    pub destination: Option<String>,
    pub data: serde_json::Value,
}

/// Row-to-domain conversion for the `objects` table.
struct ObjectRow {
    id: i64,
    key: String,
    typeclass: String,
    prototype_key: Option<String>,
    location: Option<String>,
    home: Option<String>,
    destination: Option<String>,
    data: String,
    created_at: String,
}

impl ObjectRow {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            id: row.try_get("id")?,
            key: row.try_get("key")?,
            typeclass: row.try_get("typeclass")?,
            prototype_key: row.try_get("prototype_key")?,
            location: row.try_get("location")?,
            home: row.try_get("home")?,
            destination: row.try_get("destination")?,
            data: row.try_get("data")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_object(self) -> Result<SpawnedObject, RepositoryError> {
        Ok(SpawnedObject {
            id: self.id,
            key: self.key,
            typeclass: self.typeclass,
            prototype_key: self.prototype_key,
            location: self.location,
            home: self.home,
            destination: self.destination,
            data: serde_json::from_str(&self.data)
                .map_err(|e| RepositoryError::Query(format!("invalid object data: {e}")))?,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

const SELECT_COLUMNS: &str =
    "SELECT id, key, typeclass, prototype_key, location, home, destination, data, created_at FROM objects";

/// SQLite-backed object store used by the spawner.
#[derive(Clone)]
pub struct SqliteObjectRepository {
    pool: DatabasePool,
}

impl SqliteObjectRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Insert an object and return it with its assigned ID.
    pub async fn insert(&self, object: NewObject) -> Result<SpawnedObject, RepositoryError> {
        let created_at = Utc::now();
        let data = serde_json::to_string(&object.data).map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            r#"INSERT INTO objects (key, typeclass, prototype_key, location, home, destination, data, created_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&object.key)
        .bind(&object.typeclass)
        .bind(&object.prototype_key)
        .bind(&object.location)
        .bind(&object.home)
        .bind(&object.destination)
        .bind(&data)
        .bind(format_datetime(&created_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(SpawnedObject {
            id: result.last_insert_rowid(),
            key: object.key,
            typeclass: object.typeclass,
            prototype_key: object.prototype_key,
            location: object.location,
            home: object.home,
            destination: object.destination,
            data: object.data,
            created_at,
        })
    }

    pub async fn get(&self, id: i64) -> Result<Option<SpawnedObject>, RepositoryError> {
        let row = sqlx::query(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        match row {
            Some(row) => Ok(Some(ObjectRow::from_row(&row).map_err(query_error)?.into_object()?)),
            None => Ok(None),
        }
    }

    /// Objects spawned from a prototype, oldest first.
    pub async fn find_by_prototype(
        &self,
        prototype_key: &str,
    ) -> Result<Vec<SpawnedObject>, RepositoryError> {
        let rows = sqlx::query(&format!("{SELECT_COLUMNS} WHERE prototype_key = ? ORDER BY id"))
            .bind(prototype_key.to_lowercase())
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter()
            .map(|row| ObjectRow::from_row(row).map_err(query_error)?.into_object())
            .collect()
    }

    /// Overwrite everything but the ID and creation time.
    pub async fn update(&self, object: &SpawnedObject) -> Result<(), RepositoryError> {
        let data = serde_json::to_string(&object.data).map_err(|e| RepositoryError::Query(e.to_string()))?;

        let result = sqlx::query(
            r#"UPDATE objects SET key = ?, typeclass = ?, prototype_key = ?, location = ?,
                   home = ?, destination = ?, data = ?
               WHERE id = ?"#,
        )
        .bind(&object.key)
        .bind(&object.typeclass)
        .bind(&object.prototype_key)
        .bind(&object.location)
        .bind(&object.home)
        .bind(&object.destination)
        .bind(&data)
        .bind(object.id)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::pool::test_pool;

    fn lamp() -> NewObject {
        NewObject {
            key: "lamp".to_string(),
            typeclass: "typeclasses.objects.Object".to_string(),
            prototype_key: Some("lamp".to_string()),
            home: Some("#2".to_string()),
            data: serde_json::json!({"aliases": ["light"]}),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_increasing_ids() {
        let repo = SqliteObjectRepository::new(test_pool().await);

        let first = repo.insert(lamp()).await.unwrap();
        let second = repo.insert(lamp()).await.unwrap();
        assert!(second.id > first.id);

        let loaded = repo.get(first.id).await.unwrap().unwrap();
        assert_eq!(loaded.key, "lamp");
        assert_eq!(loaded.data["aliases"][0], "light");
    }

    #[tokio::test]
    async fn test_find_by_prototype() {
        let repo = SqliteObjectRepository::new(test_pool().await);
        repo.insert(lamp()).await.unwrap();
        repo.insert(NewObject {
            prototype_key: Some("torch".to_string()),
            ..lamp()
        })
        .await
        .unwrap();

        let lamps = repo.find_by_prototype("Lamp").await.unwrap();
        assert_eq!(lamps.len(), 1);
        assert!(repo.find_by_prototype("anvil").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update() {
        let repo = SqliteObjectRepository::new(test_pool().await);
        let mut obj = repo.insert(lamp()).await.unwrap();

        obj.key = "brass lamp".to_string();
        obj.location = Some("#5".to_string());
        repo.update(&obj).await.unwrap();

        let loaded = repo.get(obj.id).await.unwrap().unwrap();
        assert_eq!(loaded.key, "brass lamp");
        assert_eq!(loaded.location.as_deref(), Some("#5"));
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = SqliteObjectRepository::new(test_pool().await);
        let mut obj = repo.insert(lamp()).await.unwrap();
        obj.id += 100;
        assert!(matches!(repo.update(&obj).await, Err(RepositoryError::NotFound)));
    }
}
