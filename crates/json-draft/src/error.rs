use thiserror::Error;

/// Errors reported by draft operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DraftError {
    /// The value is not an array or a serializable plain record.
    #[error("cannot draft a value of type {0}")]
    NotDraftable(String),
    /// The draft session was abandoned and its nodes no longer intercept.
    #[error("draft has been revoked")]
    Revoked,
    /// The length of an array cannot be deleted or reconfigured.
    #[error("array length is not configurable")]
    LengthNotConfigurable,
    /// An array length must be a non-negative integer.
    #[error("invalid array length: {0}")]
    InvalidLength(String),
    /// The key does not address an element of an array.
    #[error("invalid array index: {0}")]
    InvalidIndex(String),
    /// The operation only applies to arrays.
    #[error("draft is not an array")]
    NotASequence,
}
