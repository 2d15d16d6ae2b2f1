//! Static per-product strategy table.
//!
//! `StrategyConfig` is the immutable description of how one product is traded.
//! `StrategyTable` compiles every configured product once (signal factory, gate,
//! sizer, quoter) and answers lookups during the step loop. A product that is
//! not in the table is not traded.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{OrderBookSnapshot, Trade};
use crate::signals::{evaluate_gated, Signal, SignalConfig, SignalContext, SignalOutcome, VolatilityGate};
use crate::sizing::{OrderSizer, Placement, QuoteConfig, QuotePair, Quoter, SizingConfig};
use crate::valuation::{Estimator, Valuation};

fn default_estimator() -> Estimator {
    Estimator::Midpoint
}

fn default_history_capacity() -> usize {
    100
}

fn default_window() -> usize {
    20
}

/// The single trading rule of a product. Signal-driven and market-making rules
/// are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Signal(SignalConfig),
    Quote(QuoteConfig),
}

impl Rule {
    pub fn kind(&self) -> &'static str {
        match self {
            Rule::Signal(cfg) => cfg.kind(),
            Rule::Quote(_) => "quote",
        }
    }
}

/// What gets pushed into the product's price history each step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObservationSource {
    /// Book midpoint; skipped when the book is not two-sided.
    #[default]
    Mid,
    /// This step's valuation, fallback included.
    FairValue,
    /// Price of the newest market trade; skipped without trades.
    LastTrade,
}

impl ObservationSource {
    pub fn observe(
        self,
        book: &OrderBookSnapshot,
        valuation: &Valuation,
        trades: &[Trade],
    ) -> Option<f64> {
        match self {
            ObservationSource::Mid => book.mid(),
            ObservationSource::FairValue => Some(valuation.price),
            ObservationSource::LastTrade => trades.last().map(|t| t.price),
        }
    }
}

/// Immutable trading configuration for one product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_estimator")]
    pub estimator: Estimator,
    pub rule: Rule,
    pub max_position: i64,
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,
    /// Observations handed to the rule each step.
    #[serde(default = "default_window")]
    pub window: usize,
    /// Valuation when market data is missing.
    pub fallback_price: f64,
    #[serde(default)]
    pub volatility_threshold: Option<f64>,
    #[serde(default)]
    pub sizing: SizingConfig,
    #[serde(default)]
    pub placement: Placement,
    /// Silent steps after an exit.
    #[serde(default)]
    pub cooldown_steps: u32,
    #[serde(default)]
    pub observation: ObservationSource,
}

impl StrategyConfig {
    /// Minimal config around a rule; everything else takes its default.
    pub fn new(rule: Rule, max_position: i64, fallback_price: f64) -> Self {
        Self {
            estimator: default_estimator(),
            rule,
            max_position,
            history_capacity: default_history_capacity(),
            window: default_window(),
            fallback_price,
            volatility_threshold: None,
            sizing: SizingConfig::default(),
            placement: Placement::default(),
            cooldown_steps: 0,
            observation: ObservationSource::default(),
        }
    }
}

/// Per-step inputs shared by both rule kinds.
#[derive(Debug, Clone, Copy)]
pub struct RuleContext<'a> {
    pub window: &'a [f64],
    pub valuation: Valuation,
    pub position: i64,
    pub book: &'a OrderBookSnapshot,
    pub entry_price: Option<f64>,
    pub trailing_stop: Option<f64>,
}

/// A signal outcome and the price orders should reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalDecision {
    pub outcome: SignalOutcome,
    pub reference_price: f64,
}

/// Result of evaluating a product's rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Evaluation {
    Signal(SignalDecision),
    /// `None` when the book cannot support two-sided quotes.
    Quote(Option<QuotePair>),
}

enum CompiledRule {
    Signal(Box<dyn Signal>),
    Quote(Quoter),
}

impl fmt::Debug for CompiledRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompiledRule::Signal(signal) => f.debug_tuple("Signal").field(&signal.name()).finish(),
            CompiledRule::Quote(quoter) => f.debug_tuple("Quote").field(quoter).finish(),
        }
    }
}

/// A product's configuration together with its runtime components.
#[derive(Debug)]
pub struct CompiledStrategy {
    pub config: StrategyConfig,
    rule: CompiledRule,
    gate: Option<VolatilityGate>,
    sizer: OrderSizer,
}

impl CompiledStrategy {
    pub fn compile(config: StrategyConfig) -> Self {
        let rule = match &config.rule {
            Rule::Signal(signal) => CompiledRule::Signal(signal.build()),
            Rule::Quote(quote) => CompiledRule::Quote(Quoter::new(*quote, config.max_position)),
        };
        Self {
            gate: config.volatility_threshold.map(VolatilityGate::new),
            sizer: OrderSizer::new(config.sizing, config.max_position),
            rule,
            config,
        }
    }

    /// Name of the runtime rule (e.g., "z_score_20" or "quote").
    pub fn rule_name(&self) -> &str {
        match &self.rule {
            CompiledRule::Signal(signal) => signal.name(),
            CompiledRule::Quote(_) => "quote",
        }
    }

    pub fn sizer(&self) -> &OrderSizer {
        &self.sizer
    }

    pub fn evaluate(&self, ctx: &RuleContext<'_>) -> Evaluation {
        match &self.rule {
            CompiledRule::Signal(signal) => {
                let signal_ctx = SignalContext::new(ctx.window, ctx.book)
                    .with_position(ctx.position, self.config.max_position)
                    .with_entry(ctx.entry_price, ctx.trailing_stop);
                let outcome = evaluate_gated(signal.as_ref(), self.gate.as_ref(), &signal_ctx);
                Evaluation::Signal(SignalDecision {
                    outcome,
                    reference_price: ctx.valuation.price,
                })
            }
            CompiledRule::Quote(quoter) => Evaluation::Quote(quoter.quote(
                ctx.valuation.price,
                ctx.window,
                ctx.position,
                ctx.book,
            )),
        }
    }
}

/// Product → compiled strategy.
#[derive(Debug, Default)]
pub struct StrategyTable {
    entries: BTreeMap<String, CompiledStrategy>,
}

impl StrategyTable {
    pub fn new(products: &BTreeMap<String, StrategyConfig>) -> Self {
        let entries = products
            .iter()
            .map(|(product, cfg)| (product.clone(), CompiledStrategy::compile(cfg.clone())))
            .collect();
        Self { entries }
    }

    pub fn get(&self, product: &str) -> Option<&CompiledStrategy> {
        self.entries.get(product)
    }

    /// Evaluate the product's configured rule. `None` for unconfigured products.
    pub fn select_and_evaluate(&self, product: &str, ctx: &RuleContext<'_>) -> Option<Evaluation> {
        self.get(product).map(|strategy| strategy.evaluate(ctx))
    }
}
