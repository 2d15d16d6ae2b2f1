//! Order sizing - turn a direction into a quantity that respects the position cap.
//!
//! Sizers are position-aware but signal-agnostic: they never decide direction,
//! only how much. The cap is hard. For every side-consistent fill outcome
//! (all buys fill, or all sells fill) `position + Σ quantity` stays inside
//! `[-max_position, +max_position]`.

pub mod placement;
pub mod quote;

pub use placement::{place_orders, Placement};
pub use quote::{QuoteConfig, QuotePair, Quoter};

use serde::{Deserialize, Serialize};

use crate::domain::{OrderBookSnapshot, Side};

/// How much to trade when a signal fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SizingConfig {
    /// A constant quantity per order.
    Fixed { size: u64 },
    /// Whatever rests on the opposite side of the book.
    BookVolume,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self::Fixed { size: 10 }
    }
}

/// Room left before `side` would breach the limit. Zero when already at or past it.
pub fn capacity(side: Side, position: i64, max_position: i64) -> u64 {
    let room = match side {
        Side::Buy => max_position.saturating_sub(position),
        Side::Sell => max_position.saturating_add(position),
    };
    room.max(0) as u64
}

/// Quantity to trade. `fixed_size` (or a signal's size hint) wins over the
/// available book volume; either is capped by the position limit.
pub fn size(
    side: Side,
    position: i64,
    max_position: i64,
    available_volume: u64,
    fixed_size: Option<u64>,
) -> u64 {
    fixed_size
        .unwrap_or(available_volume)
        .min(capacity(side, position, max_position))
}

/// Sizing policy bound to one product's limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrderSizer {
    pub config: SizingConfig,
    pub max_position: i64,
}

impl OrderSizer {
    pub fn new(config: SizingConfig, max_position: i64) -> Self {
        Self {
            config,
            max_position,
        }
    }

    /// Quantity for `side` given the book and an optional signal size hint.
    pub fn size_for(
        &self,
        side: Side,
        position: i64,
        book: &OrderBookSnapshot,
        size_hint: Option<u64>,
    ) -> u64 {
        let available = match side {
            Side::Buy => book.ask_volume(),
            Side::Sell => book.bid_volume(),
        };
        let wanted = match self.config {
            SizingConfig::Fixed { size } => Some(size_hint.unwrap_or(size)),
            SizingConfig::BookVolume => size_hint,
        };
        size(side, position, self.max_position, available, wanted)
    }
}
