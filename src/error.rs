use thiserror::Error;

/// Errors raised by shapelet construction, conversion and evaluation.
///
/// Numerical problems (non-finite fluxes, ill-conditioned blocks at high order)
/// are not reported here; they surface as NaN/Inf in the results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ShapeletError {
    #[error("coefficient vector has incorrect size ({actual}, should be {expected})")]
    Length { expected: usize, actual: usize },

    #[error("evaluator is bound to order {expected}, but function has order {actual}")]
    OrderMismatch { expected: usize, actual: usize },

    #[error("order {order} exceeds the largest supported order {max}")]
    OrderTooLarge { order: usize, max: usize },

    #[error("matrix is singular and cannot be inverted")]
    Singular,

    #[error("matrix dimension mismatch: {0}")]
    Dimension(String),
}

/// Fail with [ShapeletError::Length] unless `actual == expected`.
pub(crate) fn validate_size(expected: usize, actual: usize) -> Result<(), ShapeletError> {
    if expected != actual {
        return Err(ShapeletError::Length { expected, actual });
    }
    Ok(())
}
