//! Order book snapshot.
//!
//! The exchange harness reports sell-side volumes as negative numbers. Inside the
//! engine every resting volume is a positive magnitude on both sides; direction
//! lives only in the sign of an `OrderIntent` quantity. `OrderBookSnapshot::from_depth`
//! is the single place where the harness convention is converted.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Order depth in the harness wire format: `sell_orders` volumes are negative.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDepth {
    #[serde(default)]
    pub buy_orders: BTreeMap<i64, i64>,
    #[serde(default)]
    pub sell_orders: BTreeMap<i64, i64>,
}

impl OrderDepth {
    /// Build a harness-format depth from positive magnitudes (sell side is negated).
    pub fn from_levels(bids: &[(i64, u64)], asks: &[(i64, u64)]) -> Self {
        Self {
            buy_orders: bids.iter().map(|&(p, v)| (p, v as i64)).collect(),
            sell_orders: asks.iter().map(|&(p, v)| (p, -(v as i64))).collect(),
        }
    }
}

/// Per-product book snapshot for one step. Volumes are positive magnitudes.
///
/// Either side may be empty, and best bid < best ask is not guaranteed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderBookSnapshot {
    pub bids: BTreeMap<i64, u64>,
    pub asks: BTreeMap<i64, u64>,
}

impl OrderBookSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Convert from the harness format. Volumes become absolute values and
    /// zero-volume levels are dropped.
    pub fn from_depth(depth: &OrderDepth) -> Self {
        let side = |levels: &BTreeMap<i64, i64>| {
            levels
                .iter()
                .filter(|(_, v)| **v != 0)
                .map(|(&p, &v)| (p, v.unsigned_abs()))
                .collect()
        };
        Self {
            bids: side(&depth.buy_orders),
            asks: side(&depth.sell_orders),
        }
    }

    pub fn with_bid(mut self, price: i64, volume: u64) -> Self {
        self.bids.insert(price, volume);
        self
    }

    pub fn with_ask(mut self, price: i64, volume: u64) -> Self {
        self.asks.insert(price, volume);
        self
    }

    pub fn best_bid(&self) -> Option<i64> {
        self.bids.keys().next_back().copied()
    }

    pub fn best_ask(&self) -> Option<i64> {
        self.asks.keys().next().copied()
    }

    /// Midpoint of the touch; `None` unless both sides are populated.
    pub fn mid(&self) -> Option<f64> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid as f64 + ask as f64) / 2.0),
            _ => None,
        }
    }

    pub fn is_two_sided(&self) -> bool {
        !self.bids.is_empty() && !self.asks.is_empty()
    }

    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }

    /// Total resting bid volume.
    pub fn bid_volume(&self) -> u64 {
        self.bids.values().fold(0, |total, &v| total.saturating_add(v))
    }

    /// Total resting ask volume.
    pub fn ask_volume(&self) -> u64 {
        self.asks.values().fold(0, |total, &v| total.saturating_add(v))
    }

    /// Best `n` bid levels, best (highest) first.
    pub fn top_bids(&self, n: usize) -> Vec<(i64, u64)> {
        self.bids.iter().rev().take(n).map(|(&p, &v)| (p, v)).collect()
    }

    /// Best `n` ask levels, best (lowest) first.
    pub fn top_asks(&self, n: usize) -> Vec<(i64, u64)> {
        self.asks.iter().take(n).map(|(&p, &v)| (p, v)).collect()
    }
}
