pub mod hedged;
pub mod hold;
pub mod liquidity;

// Re-export for easier access
pub use hedged::{HedgeTerms, HedgedPosition};
pub use hold::HoldPosition;
pub use liquidity::PoolPosition;

use crate::error::MathResult;
use crate::math::fixed_point::{mul, mul_div, sqrt};
use primitive_types::U256;

/// Asset0 value of an invariant product: `2 * sqrt(liquidity * reserve0 / reserve1)`.
pub(crate) fn lp_value0(liquidity: U256, reserve0: U256, reserve1: U256) -> MathResult<U256> {
    mul(sqrt(mul_div(liquidity, reserve0, reserve1)?), U256::from(2u8))
}
