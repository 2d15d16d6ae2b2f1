//! Two-sided market-making quotes around fair value.
//!
//! Quotes are shifted against inventory and with the short-term trend, and the
//! half-spread widens with realized volatility:
//!
//! ```text
//! skew   = skew_sensitivity · position − trend_sensitivity · trend
//! spread = base_spread + volatility_mult · σ(Δprice)
//! bid    = floor(fair − skew − spread)
//! ask    = ceil(fair − skew + spread)        (forced above bid)
//! ```
//!
//! `trend` is the least-squares slope of the product's window. Sizes are capped
//! per side by the position limit, and a side with no room is dropped.

use serde::{Deserialize, Serialize};

use crate::domain::{OrderBookSnapshot, OrderIntent, Side};
use crate::indicators::{deltas, least_squares_slope, population_std};

use super::capacity;

fn default_base_spread() -> f64 {
    1.0
}

fn default_quote_size() -> u64 {
    10
}

/// Market-making parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuoteConfig {
    /// Half-spread in ticks before the volatility term.
    #[serde(default = "default_base_spread")]
    pub base_spread: f64,
    #[serde(default)]
    pub volatility_mult: f64,
    /// Ticks of skew per unit of inventory.
    #[serde(default)]
    pub skew_sensitivity: f64,
    #[serde(default)]
    pub trend_sensitivity: f64,
    #[serde(default = "default_quote_size")]
    pub quote_size: u64,
}

impl Default for QuoteConfig {
    fn default() -> Self {
        Self {
            base_spread: default_base_spread(),
            volatility_mult: 0.0,
            skew_sensitivity: 0.0,
            trend_sensitivity: 0.0,
            quote_size: default_quote_size(),
        }
    }
}

/// A computed bid/ask pair. A zero size means that side is not quoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotePair {
    pub bid_price: i64,
    pub bid_size: u64,
    pub ask_price: i64,
    pub ask_size: u64,
}

impl QuotePair {
    pub fn into_orders(self, product: &str) -> Vec<OrderIntent> {
        let mut orders = Vec::with_capacity(2);
        if self.bid_size > 0 {
            orders.push(OrderIntent::new(product, Side::Buy, self.bid_price, self.bid_size));
        }
        if self.ask_size > 0 {
            orders.push(OrderIntent::new(product, Side::Sell, self.ask_price, self.ask_size));
        }
        orders
    }
}

/// Quote generator bound to one product's limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quoter {
    pub config: QuoteConfig,
    pub max_position: i64,
}

impl Quoter {
    pub fn new(config: QuoteConfig, max_position: i64) -> Self {
        Self {
            config,
            max_position,
        }
    }

    pub fn skew(&self, position: i64, window: &[f64]) -> f64 {
        let trend = least_squares_slope(window).unwrap_or(0.0);
        self.config.skew_sensitivity * position as f64 - self.config.trend_sensitivity * trend
    }

    pub fn half_spread(&self, window: &[f64]) -> f64 {
        let vol = population_std(&deltas(window)).unwrap_or(0.0);
        self.config.base_spread + self.config.volatility_mult * vol
    }

    /// Quotes for this step, or `None` when the book is not two-sided.
    pub fn quote(
        &self,
        fair_value: f64,
        window: &[f64],
        position: i64,
        book: &OrderBookSnapshot,
    ) -> Option<QuotePair> {
        if !book.is_two_sided() {
            return None;
        }
        let center = fair_value - self.skew(position, window);
        let spread = self.half_spread(window);

        let bid_price = (center - spread).floor() as i64;
        let mut ask_price = (center + spread).ceil() as i64;
        if ask_price <= bid_price {
            ask_price = bid_price + 1;
        }

        let size = self.config.quote_size;
        Some(QuotePair {
            bid_price,
            bid_size: size.min(capacity(Side::Buy, position, self.max_position)),
            ask_price,
            ask_size: size.min(capacity(Side::Sell, position, self.max_position)),
        })
    }
}
