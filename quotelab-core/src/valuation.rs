//! Fair-value estimation.
//!
//! One estimator per product, chosen by configuration. Fallback ordering is strict:
//! the live-data estimator first, then (trade-weighted only) the book midpoint,
//! and only when the data a rule needs is absent the product's configured
//! `fallback_price`.
//!
//! The EMA estimator is stateful. Its accumulator records the step at which it
//! last advanced and refuses a second update within the same step, so a double
//! computation surfaces as an error instead of silently skewing the average.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{OrderBookSnapshot, Trade};
use crate::indicators::alpha;

fn default_trade_window() -> usize {
    5
}

fn default_vwap_depth() -> usize {
    5
}

fn default_vwap_min_volume() -> u64 {
    10
}

/// Configured fair-value estimator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Estimator {
    /// Touch midpoint.
    Midpoint,
    /// Linearly recency-weighted average of the last `window` trade prices.
    TradeWeighted {
        #[serde(default = "default_trade_window")]
        window: usize,
    },
    /// Mean of the bid-side and ask-side VWAP over the top `depth` levels.
    Vwap {
        #[serde(default = "default_vwap_depth")]
        depth: usize,
        #[serde(default = "default_vwap_min_volume")]
        min_volume: u64,
    },
    /// Recursive EMA of the midpoint, advanced once per step.
    Ema { window: usize },
    /// Constant reference value; market data is ignored.
    FixedReference { value: f64 },
}

impl Estimator {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Midpoint => "midpoint",
            Self::TradeWeighted { .. } => "trade_weighted",
            Self::Vwap { .. } => "vwap",
            Self::Ema { .. } => "ema",
            Self::FixedReference { .. } => "fixed_reference",
        }
    }
}

/// Which rule actually produced a valuation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationSource {
    Midpoint,
    TradeWeighted,
    Vwap,
    Ema,
    FixedReference,
    /// The configured fallback constant.
    Fallback,
}

/// A fair value plus its provenance.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Valuation {
    pub price: f64,
    pub source: ValuationSource,
}

impl Valuation {
    fn new(price: f64, source: ValuationSource) -> Self {
        Self { price, source }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ValuationError {
    #[error("EMA already advanced at step {step}")]
    EmaAlreadyUpdated { step: u64 },
}

/// Stateful EMA of the midpoint.
///
/// `value == None` means uninitialized, which is distinct from an average of zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmaAccumulator {
    value: Option<f64>,
    last_step: Option<u64>,
}

impl EmaAccumulator {
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Step at which the accumulator last advanced.
    pub fn last_step(&self) -> Option<u64> {
        self.last_step
    }

    /// Advance the average for `step`. The first observation seeds the average.
    /// A missing observation marks the step as consumed without moving the value.
    pub fn update(
        &mut self,
        step: u64,
        observation: Option<f64>,
        window: usize,
    ) -> Result<Option<f64>, ValuationError> {
        if self.last_step == Some(step) {
            return Err(ValuationError::EmaAlreadyUpdated { step });
        }
        self.last_step = Some(step);
        if let Some(mid) = observation {
            let a = alpha(window);
            self.value = Some(match self.value {
                None => mid,
                Some(ema) => a * mid + (1.0 - a) * ema,
            });
        }
        Ok(self.value)
    }
}

/// Market data available to an estimator for one product and step.
#[derive(Debug, Clone, Copy)]
pub struct ValuationContext<'a> {
    pub step: u64,
    pub book: &'a OrderBookSnapshot,
    pub trades: &'a [Trade],
    pub fallback_price: f64,
}

/// Compute the product's fair value for this step.
///
/// Must be called exactly once per product per step: the EMA estimator
/// advances `ema` and errors on a second call with the same step.
pub fn fair_value(
    estimator: &Estimator,
    ctx: &ValuationContext<'_>,
    ema: &mut EmaAccumulator,
) -> Result<Valuation, ValuationError> {
    let valuation = match estimator {
        Estimator::Midpoint => midpoint(ctx),
        Estimator::TradeWeighted { window } => match trade_weighted(ctx.trades, *window) {
            Some(price) => Valuation::new(price, ValuationSource::TradeWeighted),
            None => midpoint(ctx),
        },
        Estimator::Vwap { depth, min_volume } => match vwap(ctx.book, *depth, *min_volume) {
            Some(price) => Valuation::new(price, ValuationSource::Vwap),
            None => Valuation::new(ctx.fallback_price, ValuationSource::Fallback),
        },
        Estimator::Ema { window } => match ema.update(ctx.step, ctx.book.mid(), *window)? {
            Some(price) => Valuation::new(price, ValuationSource::Ema),
            None => Valuation::new(ctx.fallback_price, ValuationSource::Fallback),
        },
        Estimator::FixedReference { value } => {
            Valuation::new(*value, ValuationSource::FixedReference)
        }
    };
    Ok(valuation)
}

fn midpoint(ctx: &ValuationContext<'_>) -> Valuation {
    match ctx.book.mid() {
        Some(mid) => Valuation::new(mid, ValuationSource::Midpoint),
        None => Valuation::new(ctx.fallback_price, ValuationSource::Fallback),
    }
}

/// Weights 1..=W from oldest to newest over the last `window` trades.
pub fn trade_weighted(trades: &[Trade], window: usize) -> Option<f64> {
    let recent = &trades[trades.len().saturating_sub(window)..];
    if recent.is_empty() {
        return None;
    }
    let (weighted, weights) = recent
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(sum, wsum), (i, t)| {
            let w = (i + 1) as f64;
            (sum + w * t.price, wsum + w)
        });
    Some(weighted / weights)
}

/// Mean of the two side VWAPs. `None` unless both sides are populated.
pub fn vwap(book: &OrderBookSnapshot, depth: usize, min_volume: u64) -> Option<f64> {
    let bid = side_vwap(&book.top_bids(depth), book.best_bid()?, min_volume);
    let ask = side_vwap(&book.top_asks(depth), book.best_ask()?, min_volume);
    Some((bid + ask) / 2.0)
}

/// VWAP over the given levels, or the touch price when their volume is thin.
fn side_vwap(levels: &[(i64, u64)], touch: i64, min_volume: u64) -> f64 {
    let volume: u64 = levels.iter().map(|(_, v)| v).sum();
    if volume == 0 || volume < min_volume {
        return touch as f64;
    }
    let notional: f64 = levels.iter().map(|&(p, v)| p as f64 * v as f64).sum();
    notional / volume as f64
}
