//! Bounded rolling price history.
//!
//! Each product keeps a ring buffer of recent observations (mid-prices, fair values,
//! or trade prices). Order is strictly chronological: every windowed computation
//! (first/last, slope, EMA recursion, run detection) depends on it.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Ring buffer of price observations with a fixed capacity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceHistory {
    capacity: usize,
    prices: VecDeque<f64>,
}

impl PriceHistory {
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 1, "history capacity must be >= 1");
        Self {
            capacity,
            prices: VecDeque::with_capacity(capacity),
        }
    }

    /// Append one observation, evicting the oldest when full. A decoded
    /// capacity of zero behaves as one.
    pub fn push(&mut self, price: f64) {
        while self.prices.len() >= self.capacity.max(1) {
            self.prices.pop_front();
        }
        self.prices.push_back(price);
    }

    /// The most recent `n` observations, oldest first. Shorter when history is short.
    pub fn window(&self, n: usize) -> Vec<f64> {
        let skip = self.prices.len().saturating_sub(n);
        self.prices.iter().skip(skip).copied().collect()
    }

    pub fn last(&self) -> Option<f64> {
        self.prices.back().copied()
    }

    pub fn len(&self) -> usize {
        self.prices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
