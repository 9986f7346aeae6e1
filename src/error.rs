use thiserror::Error;

/// Errors reported by the clustering engine.
///
/// Every failure is deterministic given the inputs and is detected before
/// any state is mutated; nothing is retried or recovered internally.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum OpticsError {
    /// A parameter is outside its valid range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Which parameter was rejected and why.
        reason: &'static str,
    },

    /// A size or index that must agree with the dataset does not.
    #[error("dimension mismatch: expected {expected}, found {found}")]
    DimensionMismatch { expected: usize, found: usize },
}
