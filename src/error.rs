//! Error types for segaug.

use thiserror::Error;

/// Result type alias for segaug operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while configuring or applying augmentations.
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid augmentation parameters (probability, scale bounds, roles, channels).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// Array rank or channel extent does not fit the configured layout.
    #[error("invalid dimensions: {0}")]
    InvalidDimensions(String),

    /// Image and label spatial extents disagree.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// The augmentation needs fitted state that has not been computed yet.
    #[error("{0} has not been trained; call train() before apply()")]
    NotFitted(&'static str),

    /// Input data holds values the operation cannot use (NaN, infinity).
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// An operation received no data to work on.
    #[error("empty input: {0}")]
    EmptyInput(String),

    /// A pipeline step failed.
    #[error("{operation} failed: {reason}")]
    TransformError {
        /// Name of the failing step
        operation: String,
        /// Underlying error message
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages_name_the_problem() {
        let err = Error::NotFitted("PcaColorAugmentation");
        assert!(err.to_string().contains("train()"));

        let err = Error::TransformError {
            operation: "scale".into(),
            reason: "shape mismatch: 4 vs 5".into(),
        };
        assert_eq!(err.to_string(), "scale failed: shape mismatch: 4 vs 5");
    }
}
