//! SQLite prototype repository implementation.
//!
//! Prototypes are stored as JSON documents keyed by their lowercased
//! `prototype_key`.

use chrono::Utc;
use sqlx::Row;

use protoforge_core::repository::prototype::PrototypeRepository;
use protoforge_types::error::RepositoryError;
use protoforge_types::prototype::Prototype;

use super::pool::DatabasePool;
use super::{format_datetime, query_error};

/// SQLite-backed implementation of `PrototypeRepository`.
#[derive(Clone)]
pub struct SqlitePrototypeRepository {
    pool: DatabasePool,
}

impl SqlitePrototypeRepository {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn decode(row: &sqlx::sqlite::SqliteRow) -> Result<Prototype, RepositoryError> {
    let data: String = row.try_get("data").map_err(query_error)?;
    serde_json::from_str(&data)
        .map_err(|e| RepositoryError::Query(format!("invalid prototype JSON: {e}")))
}

impl PrototypeRepository for SqlitePrototypeRepository {
    async fn save_prototype(&self, prototype: &Prototype) -> Result<Prototype, RepositoryError> {
        let key = prototype
            .prototype_key
            .as_deref()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RepositoryError::Query("prototype has no prototype_key".to_string()))?;

        let mut stored = prototype.clone();
        stored.prototype_key = Some(key.clone());

        let data = serde_json::to_string(&stored).map_err(|e| RepositoryError::Query(e.to_string()))?;
        let tags = serde_json::to_string(&stored.prototype_tags)
            .map_err(|e| RepositoryError::Query(e.to_string()))?;
        let now = format_datetime(&Utc::now());

        sqlx::query(
            r#"INSERT INTO prototypes (prototype_key, prototype_desc, prototype_tags, prototype_locks, data, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(prototype_key) DO UPDATE SET
                   prototype_desc = excluded.prototype_desc,
                   prototype_tags = excluded.prototype_tags,
                   prototype_locks = excluded.prototype_locks,
                   data = excluded.data,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&key)
        .bind(&stored.prototype_desc)
        .bind(&tags)
        .bind(&stored.prototype_locks)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        tracing::debug!(prototype_key = %key, "prototype stored");
        Ok(stored)
    }

    async fn find_prototype(&self, key: &str) -> Result<Option<Prototype>, RepositoryError> {
        let row = sqlx::query("SELECT data FROM prototypes WHERE prototype_key = ?")
            .bind(key.trim().to_lowercase())
            .fetch_optional(&self.pool.reader)
            .await
            .map_err(query_error)?;

        row.as_ref().map(decode).transpose()
    }

    async fn list_prototypes(&self) -> Result<Vec<Prototype>, RepositoryError> {
        let rows = sqlx::query("SELECT data FROM prototypes ORDER BY prototype_key")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(query_error)?;

        rows.iter().map(decode).collect()
    }

    async fn delete_prototype(&self, key: &str) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM prototypes WHERE prototype_key = ?")
            .bind(key.trim().to_lowercase())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use protoforge_types::prototype::AttrSpec;

    use crate::sqlite::pool::test_pool;

    fn proto(key: &str) -> Prototype {
        Prototype {
            prototype_key: Some(key.to_string()),
            prototype_tags: vec!["light".to_string()],
            typeclass: Some("typeclasses.objects.Object".to_string()),
            attrs: vec![AttrSpec {
                key: "fuel".to_string(),
                value: "10".to_string(),
                category: None,
                locks: String::new(),
            }],
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_and_find_case_insensitive() {
        let repo = SqlitePrototypeRepository::new(test_pool().await);

        let saved = repo.save_prototype(&proto("Lamp")).await.unwrap();
        assert_eq!(saved.prototype_key.as_deref(), Some("lamp"));

        let found = repo.find_prototype("LAMP").await.unwrap().unwrap();
        assert_eq!(found, saved);
        assert_eq!(found.attrs[0].value, "10");
    }

    #[tokio::test]
    async fn test_save_overwrites_existing() {
        let repo = SqlitePrototypeRepository::new(test_pool().await);
        repo.save_prototype(&proto("lamp")).await.unwrap();

        let mut updated = proto("lamp");
        updated.key = Some("brass lamp".to_string());
        repo.save_prototype(&updated).await.unwrap();

        let all = repo.list_prototypes().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].key.as_deref(), Some("brass lamp"));
    }

    #[tokio::test]
    async fn test_save_without_key_fails() {
        let repo = SqlitePrototypeRepository::new(test_pool().await);
        let err = repo.save_prototype(&Prototype::default()).await.unwrap_err();
        assert!(matches!(err, RepositoryError::Query(_)));
    }

    #[tokio::test]
    async fn test_list_is_ordered_by_key() {
        let repo = SqlitePrototypeRepository::new(test_pool().await);
        for key in ["torch", "anvil", "lamp"] {
            repo.save_prototype(&proto(key)).await.unwrap();
        }

        let keys: Vec<_> = repo
            .list_prototypes()
            .await
            .unwrap()
            .into_iter()
            .filter_map(|p| p.prototype_key)
            .collect();
        assert_eq!(keys, vec!["anvil", "lamp", "torch"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let repo = SqlitePrototypeRepository::new(test_pool().await);
        repo.save_prototype(&proto("lamp")).await.unwrap();

        assert!(repo.delete_prototype("Lamp").await.unwrap());
        assert!(!repo.delete_prototype("lamp").await.unwrap());
        assert!(repo.find_prototype("lamp").await.unwrap().is_none());
    }
}
