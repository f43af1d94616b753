use thiserror::Error;
use uuid::Uuid;

/// Errors from repository operations (used by trait definitions in protoforge-core).
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("query error: {0}")]
    Query(String),

    #[error("entity not found")]
    NotFound,
}

/// Errors raised while validating or spawning a prototype.
///
/// `Invalid` blocks saving and spawning. `Warning` is reported to the user
/// but still marks the prototype as not ready.
#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("{0}")]
    Invalid(String),

    #[error("{0}")]
    Warning(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Errors surfaced by the OLC wizard itself.
#[derive(Debug, Error)]
pub enum OlcError {
    #[error("no active wizard session '{0}'")]
    UnknownSession(Uuid),

    #[error("{0}")]
    PermissionDenied(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Spawn(#[from] SpawnError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_display() {
        let err = RepositoryError::Query("syntax error".to_string());
        assert_eq!(err.to_string(), "query error: syntax error");
    }

    #[test]
    fn test_spawn_error_display_is_bare_message() {
        let err = SpawnError::Invalid("Prototype lacks a `prototype_key`.".to_string());
        assert_eq!(err.to_string(), "Prototype lacks a `prototype_key`.");
    }

    #[test]
    fn test_olc_error_wraps_repository_error() {
        let err: OlcError = RepositoryError::NotFound.into();
        assert_eq!(err.to_string(), "entity not found");
    }
}
