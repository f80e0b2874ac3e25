//! Errors raised by the fixed-point and AMM math.

use thiserror::Error;

/// Failure of an exact-integer computation.
///
/// None of these are recoverable during a replay: each one means the input
/// data (or the accounting built on it) can no longer produce a correct number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MathError {
    /// A divisor was zero.
    #[error("division by zero")]
    DivisionByZero,
    /// A reserve was zero or would be exhausted by the requested trade.
    #[error("insufficient liquidity")]
    InsufficientLiquidity,
    /// An intermediate or final value did not fit in 256 bits.
    #[error("arithmetic overflow")]
    Overflow,
    /// A subtraction would have produced a negative quantity.
    #[error("arithmetic underflow")]
    Underflow,
    /// A raw value could not be represented as a decimal.
    #[error("decimal conversion failed")]
    Conversion,
}

/// Result alias for the math modules.
pub type MathResult<T> = Result<T, MathError>;
