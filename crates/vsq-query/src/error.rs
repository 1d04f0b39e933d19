use thiserror::Error;

/// Errors raised while turning a request into a query descriptor.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The request asks for something the adapter cannot push down.
    #[error("unsupported capability: {0}")]
    UnsupportedCapability(String),

    /// The filter cannot be evaluated against the feature type.
    #[error("predicate cannot be evaluated: {0}")]
    PredicateEvaluation(#[from] vsq_filter::FilterError),

    /// A projected property does not exist in the feature type.
    #[error("unknown property {name:?} of type {type_name:?}")]
    UnknownProperty { name: String, type_name: String },

    /// A sort key names a missing or unsortable attribute.
    #[error("invalid sort on {property:?}: {reason}")]
    InvalidSort { property: String, reason: String },

    /// Adapter configuration could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),
}

pub type QueryResult<T> = Result<T, QueryError>;
