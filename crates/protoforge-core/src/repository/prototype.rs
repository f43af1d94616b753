//! Prototype repository trait definition.

use protoforge_types::error::RepositoryError;
use protoforge_types::prototype::Prototype;

/// Repository trait for saved prototypes.
///
/// Prototype keys are unique and case-insensitive; implementations store
/// them lowercased.
pub trait PrototypeRepository: Send + Sync {
    /// Save a prototype, replacing any existing one with the same key.
    ///
    /// Returns the stored prototype. Fails if `prototype_key` is unset.
    fn save_prototype(
        &self,
        prototype: &Prototype,
    ) -> impl std::future::Future<Output = Result<Prototype, RepositoryError>> + Send;

    /// Look up a prototype by key (case-insensitive).
    fn find_prototype(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<Option<Prototype>, RepositoryError>> + Send;

    /// List all saved prototypes ordered by key.
    fn list_prototypes(
        &self,
    ) -> impl std::future::Future<Output = Result<Vec<Prototype>, RepositoryError>> + Send;

    /// Delete a prototype. Returns `false` if no prototype had that key.
    fn delete_prototype(
        &self,
        key: &str,
    ) -> impl std::future::Future<Output = Result<bool, RepositoryError>> + Send;
}
