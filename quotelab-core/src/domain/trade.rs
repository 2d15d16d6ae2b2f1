//! Executed market trades reported by the harness.

use serde::{Deserialize, Serialize};

/// A recent executed trade for a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    pub price: f64,
    #[serde(default)]
    pub quantity: i64,
}

impl Trade {
    pub fn new(price: f64, quantity: i64) -> Self {
        Self { price, quantity }
    }
}
