//! SQLite implementation of `OlcDraftStore`.
//!
//! Persists wizard sessions in the `olc_drafts` table using INSERT OR REPLACE
//! for upsert semantics. The prototype key and current screen are pulled out
//! of `state_json` for listing without deserializing the whole `MenuState`.

use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use protoforge_core::olc::draft_store::{
    DRAFT_SCHEMA_VERSION, OlcDraft, OlcDraftStore, OlcDraftSummary,
};
use protoforge_types::error::RepositoryError;
use protoforge_types::menu::MenuState;

use crate::sqlite::pool::DatabasePool;
use crate::sqlite::{format_datetime, parse_datetime, query_error};

/// SQLite-backed wizard draft persistence.
pub struct SqliteOlcDraftStore {
    pool: DatabasePool,
}

impl SqliteOlcDraftStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

fn parse_session_id(s: &str) -> Result<Uuid, RepositoryError> {
    Uuid::parse_str(s).map_err(|e| RepositoryError::Query(format!("invalid session_id: {e}")))
}

/// Read a string at a JSON pointer, empty if absent.
fn extract_json_field(json: &serde_json::Value, pointer: &str) -> String {
    json.pointer(pointer)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

impl OlcDraftStore for SqliteOlcDraftStore {
    async fn save_draft(&self, draft: OlcDraft) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"INSERT OR REPLACE INTO olc_drafts (session_id, caller_id, state_json, schema_version, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(draft.session_id.to_string())
        .bind(draft.caller_id)
        .bind(&draft.state_json)
        .bind(draft.schema_version as i64)
        .bind(format_datetime(&draft.created_at))
        .bind(format_datetime(&draft.updated_at))
        .execute(&self.pool.writer)
        .await
        .map_err(query_error)?;

        Ok(())
    }

    async fn load_draft(&self, session_id: &Uuid) -> Result<Option<OlcDraft>, RepositoryError> {
        let row = sqlx::query(
            "SELECT session_id, caller_id, state_json, schema_version, created_at, updated_at FROM olc_drafts WHERE session_id = ?",
        )
        .bind(session_id.to_string())
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let sid: String = row.try_get("session_id").map_err(query_error)?;
        let schema_version: i64 = row.try_get("schema_version").map_err(query_error)?;
        let created_at: String = row.try_get("created_at").map_err(query_error)?;
        let updated_at: String = row.try_get("updated_at").map_err(query_error)?;

        Ok(Some(OlcDraft {
            session_id: parse_session_id(&sid)?,
            caller_id: row.try_get("caller_id").map_err(query_error)?,
            state_json: row.try_get("state_json").map_err(query_error)?,
            schema_version: schema_version as u32,
            created_at: parse_datetime(&created_at)?,
            updated_at: parse_datetime(&updated_at)?,
        }))
    }

    async fn list_drafts(&self, caller_id: i64) -> Result<Vec<OlcDraftSummary>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT session_id, state_json, updated_at FROM olc_drafts WHERE caller_id = ? ORDER BY updated_at DESC",
        )
        .bind(caller_id)
        .fetch_all(&self.pool.reader)
        .await
        .map_err(query_error)?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in &rows {
            let sid: String = row.try_get("session_id").map_err(query_error)?;
            let state_json: String = row.try_get("state_json").map_err(query_error)?;
            let updated_at: String = row.try_get("updated_at").map_err(query_error)?;
            let state: serde_json::Value = serde_json::from_str(&state_json).unwrap_or_default();

            summaries.push(OlcDraftSummary {
                session_id: parse_session_id(&sid)?,
                prototype_key: extract_json_field(&state, "/prototype/prototype_key"),
                node: extract_json_field(&state, "/node"),
                updated_at: parse_datetime(&updated_at)?,
            });
        }

        Ok(summaries)
    }

    async fn delete_draft(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM olc_drafts WHERE session_id = ?")
            .bind(session_id.to_string())
            .execute(&self.pool.writer)
            .await
            .map_err(query_error)?;

        Ok(())
    }
}

/// Snapshot a session as a draft. The creation time comes from the state so
/// a resumed session keeps it.
pub fn draft_from_state(state: &MenuState) -> Result<OlcDraft, RepositoryError> {
    let state_json = serde_json::to_string(state).map_err(|e| RepositoryError::Query(e.to_string()))?;
    Ok(OlcDraft {
        session_id: state.session_id,
        caller_id: state.caller_id,
        state_json,
        schema_version: DRAFT_SCHEMA_VERSION,
        created_at: state.created_at,
        updated_at: Utc::now(),
    })
}
