//! Wizard draft persistence trait.
//!
//! Defines `OlcDraftStore` for saving and restoring wizard sessions. When a
//! user leaves the wizard without saving the prototype (closes the terminal,
//! loses the connection), the session is auto-saved and can be resumed later.
//!
//! Drafts are kept apart from saved prototypes because an in-progress
//! prototype may not have a key yet, and may not validate.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use protoforge_types::error::RepositoryError;

/// Current `MenuState` serialization version.
pub const DRAFT_SCHEMA_VERSION: u32 = 1;

/// A saved wizard session containing the full serialized state.
///
/// `state_json` holds the serialized `MenuState`; `schema_version` lets a
/// later release migrate old drafts before deserializing them.
#[derive(Debug, Clone)]
pub struct OlcDraft {
    /// Session ID (matches `MenuState.session_id`).
    pub session_id: Uuid,
    /// Owning caller, so each caller only resumes their own drafts.
    pub caller_id: i64,
    /// Serialized `MenuState` as JSON.
    pub state_json: String,
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lightweight summary of a draft for listing.
#[derive(Debug, Clone)]
pub struct OlcDraftSummary {
    pub session_id: Uuid,
    /// Key of the prototype being edited, empty if not yet set.
    pub prototype_key: String,
    /// Screen the session was on (e.g., "attrs").
    pub node: String,
    pub updated_at: DateTime<Utc>,
}

/// Persistence interface for wizard drafts.
pub trait OlcDraftStore: Send + Sync {
    /// Save or update a draft (upsert on session_id).
    fn save_draft(&self, draft: OlcDraft) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Load a draft by session ID. `None` if there is none.
    fn load_draft(
        &self,
        session_id: &Uuid,
    ) -> impl Future<Output = Result<Option<OlcDraft>, RepositoryError>> + Send;

    /// List a caller's drafts, most recently updated first.
    fn list_drafts(
        &self,
        caller_id: i64,
    ) -> impl Future<Output = Result<Vec<OlcDraftSummary>, RepositoryError>> + Send;

    /// Delete a draft. No-op if it does not exist.
    fn delete_draft(
        &self,
        session_id: &Uuid,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}
