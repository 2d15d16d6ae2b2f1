//! Order intents emitted by the engine.

use serde::{Deserialize, Serialize};

/// Order direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    /// +1 for buys, -1 for sells.
    pub fn sign(self) -> i64 {
        match self {
            Side::Buy => 1,
            Side::Sell => -1,
        }
    }
}

/// A single order for the step's auction.
///
/// Positive `quantity` buys, negative sells. The sign is the only place
/// direction is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub product: String,
    pub price: i64,
    pub quantity: i64,
}

impl OrderIntent {
    pub fn new(product: impl Into<String>, side: Side, price: i64, quantity: u64) -> Self {
        Self {
            product: product.into(),
            price,
            quantity: side.sign() * quantity as i64,
        }
    }

    pub fn side(&self) -> Side {
        if self.quantity >= 0 {
            Side::Buy
        } else {
            Side::Sell
        }
    }
}
