/// Convenience result type used across digitdrift.
pub type DriftResult<T> = Result<T, DriftError>;

/// Top-level error taxonomy used by generator APIs.
#[derive(thiserror::Error, Debug)]
pub enum DriftError {
    /// Invalid user-provided configuration or request parameters.
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed or inconsistent source data (sprite pool, fixed set).
    #[error("data error: {0}")]
    Data(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DriftError {
    /// Build a [`DriftError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`DriftError::Data`] value.
    pub fn data(msg: impl Into<String>) -> Self {
        Self::Data(msg.into())
    }
}
