use thiserror::Error;

/// Errors raised when a filter does not fit a feature type.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FilterError {
    #[error("filter references unknown attribute {name:?} of type {type_name:?}")]
    UnknownAttribute { name: String, type_name: String },

    #[error("spatial filter on type {type_name:?}, which has no default geometry")]
    NoDefaultGeometry { type_name: String },
}

pub type FilterResult<T> = Result<T, FilterError>;
