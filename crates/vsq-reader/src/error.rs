use thiserror::Error;
use vsq_types::ObjectId;

/// Errors raised while resolving revisions or pulling features.
#[derive(Debug, Error)]
pub enum ReaderError {
    /// A root or old-root rev-spec does not resolve.
    #[error("revision not found: {0}")]
    RevisionNotFound(String),

    /// No type tree with this name exists at the queried revision.
    #[error("feature type not found: {0}")]
    TypeNotFound(String),

    /// A node's feature type object is missing.
    #[error("cannot resolve feature type {0}")]
    TypeResolutionFailure(ObjectId),

    /// A feature node points at content that is not in the store.
    #[error("missing content for {path} ({id})")]
    MissingContent { path: String, id: ObjectId },

    /// Feature content does not match its feature type.
    #[error("corrupt feature {path}: {reason}")]
    CorruptFeature { path: String, reason: String },

    #[error("query error: {0}")]
    Query(#[from] vsq_query::QueryError),

    #[error("repository error: {0}")]
    Repo(#[from] vsq_repo::RepoError),

    #[error("diff error: {0}")]
    Diff(#[from] vsq_diff::DiffError),
}

pub type ReaderResult<T> = Result<T, ReaderError>;
