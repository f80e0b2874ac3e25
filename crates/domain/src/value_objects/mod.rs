pub mod amount;

pub use amount::{Amount, SignedAmount};
