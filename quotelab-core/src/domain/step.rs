//! Per-step boundary with the exchange harness.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

use super::book::OrderDepth;
use super::order::OrderIntent;
use super::trade::Trade;

/// Everything the harness hands the engine for one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepInput {
    pub timestamp: u64,
    #[serde(default)]
    pub order_depths: BTreeMap<String, OrderDepth>,
    #[serde(default)]
    pub positions: HashMap<String, i64>,
    #[serde(default)]
    pub market_trades: HashMap<String, Vec<Trade>>,
    /// Opaque blob returned by the previous step.
    #[serde(default)]
    pub trader_data: String,
}

impl StepInput {
    pub fn new(timestamp: u64) -> Self {
        Self {
            timestamp,
            ..Self::default()
        }
    }

    pub fn with_depth(mut self, product: impl Into<String>, depth: OrderDepth) -> Self {
        self.order_depths.insert(product.into(), depth);
        self
    }

    pub fn with_position(mut self, product: impl Into<String>, position: i64) -> Self {
        self.positions.insert(product.into(), position);
        self
    }

    pub fn with_trades(mut self, product: impl Into<String>, trades: Vec<Trade>) -> Self {
        self.market_trades.insert(product.into(), trades);
        self
    }

    pub fn position(&self, product: &str) -> i64 {
        self.positions.get(product).copied().unwrap_or(0)
    }
}

/// The engine's answer for one step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StepOutput {
    pub timestamp: u64,
    pub orders: BTreeMap<String, Vec<OrderIntent>>,
    pub conversions: i64,
    pub trader_data: String,
}

impl StepOutput {
    /// All intents across products, in product order.
    pub fn all_orders(&self) -> impl Iterator<Item = &OrderIntent> {
        self.orders.values().flatten()
    }

    pub fn orders_for(&self, product: &str) -> &[OrderIntent] {
        self.orders.get(product).map(Vec::as_slice).unwrap_or(&[])
    }
}
