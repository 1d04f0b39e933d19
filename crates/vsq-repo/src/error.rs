//! Error types for repository operations.

use thiserror::Error;

/// Errors that can occur while resolving or building revisions.
#[derive(Debug, Error)]
pub enum RepoError {
    /// The rev-spec string could not be parsed.
    #[error("invalid rev-spec {spec:?}: {reason}")]
    InvalidRevSpec { spec: String, reason: String },

    /// The ref name is malformed.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },

    /// A tag with this name already exists.
    #[error("ref already exists: {0}")]
    RefExists(String),

    /// No feature type is registered under this name.
    #[error("unknown feature type: {0}")]
    UnknownType(String),

    /// Object store failure.
    #[error("store error: {0}")]
    Store(#[from] vsq_store::StoreError),

    /// Tree walk failure.
    #[error("diff error: {0}")]
    Diff(#[from] vsq_diff::DiffError),
}

/// Convenience alias for repository results.
pub type RepoResult<T> = Result<T, RepoError>;
