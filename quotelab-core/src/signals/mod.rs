//! Signal bank: statistical and order-book rules that turn a price window into
//! Buy / Sell / Hold.
//!
//! Signals read market data plus the small amount of per-product trading state
//! they need (position, entry price, trailing stop). They never mutate that
//! state directly. Instead each outcome carries a `StateUpdate` the step
//! controller commits once it knows whether orders were actually emitted.

pub mod bollinger;
pub mod book_imbalance;
pub mod breakout;
pub mod gate;
pub mod keltner;
pub mod ma_crossover;
pub mod momentum_run;
pub mod moving_average;
pub mod rate_of_change;
pub mod rsi;
pub mod trend_slope;
pub mod z_score;

use serde::{Deserialize, Serialize};

use crate::domain::{OrderBookSnapshot, Side};

pub use bollinger::BollingerReversion;
pub use book_imbalance::BookImbalance;
pub use breakout::RangeBreakout;
pub use gate::VolatilityGate;
pub use keltner::KeltnerReversion;
pub use ma_crossover::MaCrossover;
pub use momentum_run::MomentumRun;
pub use moving_average::MovingAverageTrend;
pub use rate_of_change::RateOfChange;
pub use rsi::RsiReversion;
pub use trend_slope::TrendSlope;
pub use z_score::ZScoreReversion;

// ─── Outcome types ───────────────────────────────────────────────────

/// Trading direction chosen by a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    Buy,
    Sell,
    Hold,
}

impl Decision {
    pub fn side(self) -> Option<Side> {
        match self {
            Decision::Buy => Some(Side::Buy),
            Decision::Sell => Some(Side::Sell),
            Decision::Hold => None,
        }
    }
}

/// Why a decision was reached. Distinguishes "not enough data" and "market too
/// volatile" from an ordinary Hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalStatus {
    Ready,
    Warmup,
    VolatilityGated,
}

/// Change to one optional state slot.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Update<T> {
    #[default]
    Keep,
    Set(T),
    Clear,
}

impl<T: Copy> Update<T> {
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            Update::Keep => {}
            Update::Set(v) => *slot = Some(v),
            Update::Clear => *slot = None,
        }
    }
}

/// Pending mutation of the product's entry price and trailing stop.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct StateUpdate {
    pub entry_price: Update<f64>,
    pub trailing_stop: Update<f64>,
}

impl StateUpdate {
    pub fn none() -> Self {
        Self::default()
    }

    /// Record a new long entry.
    pub fn enter(entry_price: f64, trailing_stop: Option<f64>) -> Self {
        Self {
            entry_price: Update::Set(entry_price),
            trailing_stop: match trailing_stop {
                Some(stop) => Update::Set(stop),
                None => Update::Keep,
            },
        }
    }

    /// Forget the entry price and any stop.
    pub fn exit() -> Self {
        Self {
            entry_price: Update::Clear,
            trailing_stop: Update::Clear,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Result of evaluating one signal for one product and step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalOutcome {
    pub decision: Decision,
    pub status: SignalStatus,
    /// Replaces the configured fixed size when set. Still capped by the sizer.
    pub size_hint: Option<u64>,
    pub state: StateUpdate,
}

impl SignalOutcome {
    fn with_decision(decision: Decision, status: SignalStatus) -> Self {
        Self {
            decision,
            status,
            size_hint: None,
            state: StateUpdate::none(),
        }
    }

    pub fn buy() -> Self {
        Self::with_decision(Decision::Buy, SignalStatus::Ready)
    }

    pub fn sell() -> Self {
        Self::with_decision(Decision::Sell, SignalStatus::Ready)
    }

    pub fn hold() -> Self {
        Self::with_decision(Decision::Hold, SignalStatus::Ready)
    }

    pub fn warmup() -> Self {
        Self::with_decision(Decision::Hold, SignalStatus::Warmup)
    }

    pub fn gated() -> Self {
        Self::with_decision(Decision::Hold, SignalStatus::VolatilityGated)
    }

    pub fn with_size_hint(mut self, size: u64) -> Self {
        self.size_hint = Some(size);
        self
    }

    pub fn with_state(mut self, state: StateUpdate) -> Self {
        self.state = state;
        self
    }
}

/// Everything a signal may read for one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct SignalContext<'a> {
    /// Chronological window, newest last. The newest entry is the current price.
    pub window: &'a [f64],
    pub position: i64,
    pub max_position: i64,
    pub book: &'a OrderBookSnapshot,
    pub entry_price: Option<f64>,
    pub trailing_stop: Option<f64>,
}

impl<'a> SignalContext<'a> {
    pub fn new(window: &'a [f64], book: &'a OrderBookSnapshot) -> Self {
        Self {
            window,
            position: 0,
            max_position: 0,
            book,
            entry_price: None,
            trailing_stop: None,
        }
    }

    pub fn with_position(mut self, position: i64, max_position: i64) -> Self {
        self.position = position;
        self.max_position = max_position;
        self
    }

    pub fn with_entry(mut self, entry_price: Option<f64>, trailing_stop: Option<f64>) -> Self {
        self.entry_price = entry_price;
        self.trailing_stop = trailing_stop;
        self
    }

    pub fn price(&self) -> Option<f64> {
        self.window.last().copied()
    }
}

// ─── Signal trait ────────────────────────────────────────────────────

/// A per-product trading rule.
pub trait Signal: Send + Sync {
    /// Human-readable name (e.g., "z_score_20").
    fn name(&self) -> &str;

    /// Observations needed before the rule can answer anything but Warmup.
    fn min_samples(&self) -> usize;

    /// Evaluate at the newest observation of `ctx.window`.
    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome;
}

/// Evaluate `signal` behind the product's volatility gate.
///
/// The gate is checked first and overrides every signal. Short windows answer
/// Warmup before the signal is consulted.
pub fn evaluate_gated(
    signal: &dyn Signal,
    gate: Option<&VolatilityGate>,
    ctx: &SignalContext<'_>,
) -> SignalOutcome {
    if gate.is_some_and(|g| g.blocks(ctx.window)) {
        return SignalOutcome::gated();
    }
    if ctx.window.len() < signal.min_samples() {
        return SignalOutcome::warmup();
    }
    signal.evaluate(ctx)
}

// ─── Configuration + factory ─────────────────────────────────────────

fn default_band_multiplier() -> f64 {
    2.0
}
fn default_rsi_period() -> usize {
    14
}
fn default_oversold() -> f64 {
    30.0
}
fn default_overbought() -> f64 {
    70.0
}
fn default_sensitivity() -> f64 {
    0.02
}
fn default_z_threshold() -> f64 {
    1.0
}
fn default_short() -> usize {
    3
}
fn default_long() -> usize {
    7
}
fn default_stop_fraction() -> f64 {
    0.8
}
fn default_imbalance() -> f64 {
    0.3
}
fn default_keltner_period() -> usize {
    10
}
fn default_keltner_multiplier() -> f64 {
    1.5
}
fn default_entry_slope() -> f64 {
    0.2
}
fn default_atr_multiplier() -> f64 {
    1.5
}

/// Serializable signal selection. Built into a trait object by [`SignalConfig::build`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SignalConfig {
    Bollinger {
        period: usize,
        #[serde(default = "default_band_multiplier")]
        multiplier: f64,
    },
    Rsi {
        #[serde(default = "default_rsi_period")]
        period: usize,
        #[serde(default = "default_oversold")]
        oversold: f64,
        #[serde(default = "default_overbought")]
        overbought: f64,
    },
    RateOfChange {
        period: usize,
        #[serde(default = "default_sensitivity")]
        sensitivity: f64,
    },
    ZScore {
        period: usize,
        #[serde(default = "default_z_threshold")]
        threshold: f64,
    },
    MaCrossover {
        #[serde(default = "default_short")]
        short: usize,
        #[serde(default = "default_long")]
        long: usize,
    },
    MomentumRun {
        #[serde(default = "default_stop_fraction")]
        stop_fraction: f64,
    },
    Breakout {
        period: usize,
    },
    BookImbalance {
        #[serde(default = "default_imbalance")]
        threshold: f64,
    },
    Keltner {
        #[serde(default = "default_keltner_period")]
        period: usize,
        #[serde(default = "default_keltner_multiplier")]
        multiplier: f64,
    },
    TrendSlope {
        period: usize,
        #[serde(default = "default_entry_slope")]
        entry_slope: f64,
        #[serde(default = "default_atr_multiplier")]
        atr_multiplier: f64,
    },
    MovingAverage {
        period: usize,
    },
}

impl SignalConfig {
    /// Type tag as written in configuration files.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bollinger { .. } => "bollinger",
            Self::Rsi { .. } => "rsi",
            Self::RateOfChange { .. } => "rate_of_change",
            Self::ZScore { .. } => "z_score",
            Self::MaCrossover { .. } => "ma_crossover",
            Self::MomentumRun { .. } => "momentum_run",
            Self::Breakout { .. } => "breakout",
            Self::BookImbalance { .. } => "book_imbalance",
            Self::Keltner { .. } => "keltner",
            Self::TrendSlope { .. } => "trend_slope",
            Self::MovingAverage { .. } => "moving_average",
        }
    }

    /// Largest window any part of the rule looks at.
    pub fn lookback(&self) -> usize {
        match *self {
            Self::Bollinger { period, .. }
            | Self::Rsi { period, .. }
            | Self::RateOfChange { period, .. }
            | Self::ZScore { period, .. }
            | Self::Breakout { period }
            | Self::Keltner { period, .. }
            | Self::TrendSlope { period, .. }
            | Self::MovingAverage { period } => period,
            Self::MaCrossover { short, long } => short.max(long),
            Self::MomentumRun { .. } => momentum_run::MIN_SAMPLES,
            Self::BookImbalance { .. } => 0,
        }
    }

    /// Smallest period the rule's indicators accept.
    pub fn min_period(&self) -> usize {
        match self {
            Self::Bollinger { .. } | Self::ZScore { .. } | Self::MovingAverage { .. } => 1,
            Self::Rsi { .. }
            | Self::RateOfChange { .. }
            | Self::Breakout { .. }
            | Self::Keltner { .. }
            | Self::TrendSlope { .. } => 2,
            Self::MaCrossover { .. } => 1,
            Self::MomentumRun { .. } | Self::BookImbalance { .. } => 0,
        }
    }

    /// Construct the runtime signal. Parameters are assumed validated.
    pub fn build(&self) -> Box<dyn Signal> {
        match *self {
            Self::Bollinger { period, multiplier } => {
                Box::new(BollingerReversion::new(period, multiplier))
            }
            Self::Rsi {
                period,
                oversold,
                overbought,
            } => Box::new(RsiReversion::new(period, oversold, overbought)),
            Self::RateOfChange {
                period,
                sensitivity,
            } => Box::new(RateOfChange::new(period, sensitivity)),
            Self::ZScore { period, threshold } => Box::new(ZScoreReversion::new(period, threshold)),
            Self::MaCrossover { short, long } => Box::new(MaCrossover::new(short, long)),
            Self::MomentumRun { stop_fraction } => Box::new(MomentumRun::new(stop_fraction)),
            Self::Breakout { period } => Box::new(RangeBreakout::new(period)),
            Self::BookImbalance { threshold } => Box::new(BookImbalance::new(threshold)),
            Self::Keltner { period, multiplier } => {
                Box::new(KeltnerReversion::new(period, multiplier))
            }
            Self::TrendSlope {
                period,
                entry_slope,
                atr_multiplier,
            } => Box::new(TrendSlope::new(period, entry_slope, atr_multiplier)),
            Self::MovingAverage { period } => Box::new(MovingAverageTrend::new(period)),
        }
    }
}
