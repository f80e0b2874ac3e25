use serde::{Deserialize, Serialize};
use std::fmt;

/// Capital deployment strategies compared by a backtest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Buy-and-hold of a 50/50 split.
    Hold,
    /// Plain liquidity supplied to the pool.
    Liquidity,
    /// Flash-loan funded liquidity with a rehedged borrow.
    Hedged,
}

impl Strategy {
    pub const ALL: [Strategy; 3] = [Strategy::Hold, Strategy::Liquidity, Strategy::Hedged];

    /// Tag value written to the metrics sink.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::Hold => "hold",
            Strategy::Liquidity => "uniswap",
            Strategy::Hedged => "autohedge",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
