//! Step controller.
//!
//! One `step` call per exchange step. Per configured product present in the
//! step's books, in product order:
//!
//! 1. cooldown: decrement and stay silent
//! 2. valuation, exactly once (the EMA estimator is stateful)
//! 3. observation pushed into the price history
//! 4. rule evaluation through the strategy table
//! 5. sizing and placement
//! 6. state commit: Hold outcomes always commit (stop ratchet); Buy/Sell outcomes
//!    commit only when orders were emitted; an emitted Sell starts the cooldown
//!
//! Configured products missing from a step's books are left alone, cooldown
//! included: a cooldown counts quoted steps, not wall-clock steps.
//!
//! The engine owns all mutable state. `trader_data` carries it between
//! processes; it is restored on the first step and rewritten after every step.

pub mod state;

pub use state::{EngineState, PersistedState, ProductState, StateError};

use std::collections::BTreeMap;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::domain::{OrderBookSnapshot, OrderIntent, StepInput, StepOutput, Trade};
use crate::history::PriceHistory;
use crate::signals::Decision;
use crate::sizing::place_orders;
use crate::strategy::{Evaluation, RuleContext, StrategyTable};
use crate::valuation::{fair_value, ValuationContext, ValuationError};

#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("valuation for {product}: {source}")]
    Valuation {
        product: String,
        #[source]
        source: ValuationError,
    },
    #[error(transparent)]
    State(#[from] StateError),
}

/// The trading agent: static strategy table plus mutable per-product state.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    table: StrategyTable,
    state: EngineState,
    fingerprint: String,
    /// Steps processed, including those before a restore.
    steps: u64,
    started: bool,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, EngineError> {
        config.validate()?;
        let fingerprint = config.fingerprint();
        info!(
            products = config.products.len(),
            fingerprint = %fingerprint,
            "engine configured"
        );
        Ok(Self {
            table: StrategyTable::new(&config.products),
            state: EngineState::for_config(&config),
            config,
            fingerprint,
            steps: 0,
            started: false,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn table(&self) -> &StrategyTable {
        &self.table
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Serialize all product state for `trader_data`.
    pub fn encode_state(&self) -> Result<String, StateError> {
        PersistedState {
            fingerprint: self.fingerprint.clone(),
            step: self.steps,
            products: self.state.products.clone(),
        }
        .encode()
    }

    /// Replace state with a previously encoded blob. Products that are not
    /// configured are dropped; configured products missing from the blob keep
    /// their current state. Histories are rebuilt at the configured capacity,
    /// whatever capacity the blob claims.
    pub fn restore_state(&mut self, data: &str) -> Result<(), StateError> {
        let persisted = PersistedState::decode_for(data, &self.fingerprint)?;
        self.steps = persisted.step;
        for (product, restored) in persisted.products {
            let Some(slot) = self.state.product_mut(&product) else {
                continue;
            };
            let mut history = PriceHistory::with_capacity(slot.history.capacity());
            for price in restored.history.window(restored.history.len()) {
                history.push(price);
            }
            *slot = ProductState { history, ..restored };
        }
        Ok(())
    }

    /// Process one exchange step.
    pub fn step(&mut self, input: StepInput) -> Result<StepOutput, EngineError> {
        if !self.started {
            self.started = true;
            if !input.trader_data.is_empty() {
                match self.restore_state(&input.trader_data) {
                    Ok(()) => info!(steps = self.steps, "restored trader data"),
                    Err(e) => warn!(error = %e, "ignoring trader data, starting fresh"),
                }
            }
        }

        let step = self.steps;
        let mut orders = BTreeMap::new();
        for (product, depth) in &input.order_depths {
            let Some(state) = self.state.products.get_mut(product) else {
                debug!(product = %product, "not configured, skipped");
                continue;
            };
            let book = OrderBookSnapshot::from_depth(depth);
            let trades = input
                .market_trades
                .get(product)
                .map(Vec::as_slice)
                .unwrap_or(&[]);
            let market = Market {
                step,
                book: &book,
                trades,
                position: input.position(product),
            };
            let product_orders = step_product(&self.table, product, state, &market)?;
            if !product_orders.is_empty() {
                orders.insert(product.clone(), product_orders);
            }
        }
        self.steps += 1;

        Ok(StepOutput {
            timestamp: input.timestamp,
            orders,
            conversions: self.config.conversions,
            trader_data: self.encode_state()?,
        })
    }
}

/// Market inputs for one product in one step.
struct Market<'a> {
    step: u64,
    book: &'a OrderBookSnapshot,
    trades: &'a [Trade],
    position: i64,
}

fn step_product(
    table: &StrategyTable,
    product: &str,
    state: &mut ProductState,
    market: &Market<'_>,
) -> Result<Vec<OrderIntent>, EngineError> {
    let Some(strategy) = table.get(product) else {
        return Ok(Vec::new());
    };
    let cfg = &strategy.config;

    if state.cooldown > 0 {
        state.cooldown -= 1;
        debug!(product, remaining = state.cooldown, "cooling down");
        return Ok(Vec::new());
    }

    let valuation = fair_value(
        &cfg.estimator,
        &ValuationContext {
            step: market.step,
            book: market.book,
            trades: market.trades,
            fallback_price: cfg.fallback_price,
        },
        &mut state.ema,
    )
    .map_err(|source| EngineError::Valuation {
        product: product.to_string(),
        source,
    })?;

    if let Some(observation) = cfg.observation.observe(market.book, &valuation, market.trades) {
        state.history.push(observation);
    }
    let window = state.history.window(cfg.window);

    let ctx = RuleContext {
        window: &window,
        valuation,
        position: market.position,
        book: market.book,
        entry_price: state.entry_price,
        trailing_stop: state.trailing_stop,
    };
    let Some(evaluation) = table.select_and_evaluate(product, &ctx) else {
        return Ok(Vec::new());
    };

    let orders = match evaluation {
        Evaluation::Quote(pair) => {
            let orders = pair.map(|p| p.into_orders(product)).unwrap_or_default();
            debug!(
                product,
                fair = valuation.price,
                source = ?valuation.source,
                orders = orders.len(),
                "quoted"
            );
            orders
        }
        Evaluation::Signal(decision) => {
            let outcome = decision.outcome;
            let orders = match outcome.decision.side() {
                Some(side) => {
                    let quantity = strategy.sizer().size_for(
                        side,
                        market.position,
                        market.book,
                        outcome.size_hint,
                    );
                    place_orders(
                        product,
                        side,
                        quantity,
                        decision.reference_price,
                        market.book,
                        cfg.placement,
                    )
                }
                None => Vec::new(),
            };

            match outcome.decision {
                Decision::Hold => state.apply(outcome.state),
                Decision::Buy | Decision::Sell if !orders.is_empty() => {
                    state.apply(outcome.state);
                    if outcome.decision == Decision::Sell {
                        state.cooldown = cfg.cooldown_steps;
                    }
                }
                Decision::Buy | Decision::Sell => {}
            }

            debug!(
                product,
                rule = strategy.rule_name(),
                fair = valuation.price,
                source = ?valuation.source,
                decision = ?outcome.decision,
                status = ?outcome.status,
                orders = orders.len(),
                "evaluated"
            );
            orders
        }
    };
    Ok(orders)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{StrategyPreset, KELP};
    use crate::domain::OrderDepth;
    use crate::signals::SignalConfig;
    use crate::strategy::{Rule, StrategyConfig};

    fn engine_with(product: &str, cfg: StrategyConfig) -> Engine {
        let mut products = BTreeMap::new();
        products.insert(product.to_string(), cfg);
        Engine::new(EngineConfig::new(products)).unwrap()
    }

    fn input(mid: i64) -> StepInput {
        StepInput::new(0).with_depth(KELP, OrderDepth::from_levels(&[(mid - 1, 20)], &[(mid + 1, 20)]))
    }

    #[test]
    fn rejects_invalid_config() {
        let cfg = EngineConfig::new(BTreeMap::new());
        assert!(matches!(
            Engine::new(cfg),
            Err(EngineError::Config(ConfigError::NoProducts))
        ));
    }

    #[test]
    fn unconfigured_products_are_ignored() {
        let mut engine = engine_with(
            KELP,
            StrategyConfig::new(Rule::Signal(SignalConfig::Breakout { period: 3 }), 50, 2028.0),
        );
        let step = StepInput::new(0).with_depth(
            "SQUID_INK",
            OrderDepth::from_levels(&[(99, 5)], &[(101, 5)]),
        );
        let out = engine.step(step).unwrap();
        assert!(out.orders.is_empty());
        assert!(engine.state().product("SQUID_INK").is_none());
    }

    #[test]
    fn absent_products_are_untouched() {
        let mut engine = engine_with(
            KELP,
            StrategyConfig::new(Rule::Signal(SignalConfig::Breakout { period: 3 }), 50, 2028.0),
        );
        engine.step(StepInput::new(0)).unwrap();
        assert!(engine.state().product(KELP).unwrap().history.is_empty());
        assert_eq!(engine.steps(), 1);
    }

    #[test]
    fn cooldown_ticks_only_on_quoted_steps() {
        let mut engine = engine_with(
            KELP,
            StrategyConfig::new(Rule::Signal(SignalConfig::Breakout { period: 3 }), 50, 2028.0),
        );
        engine.state.product_mut(KELP).unwrap().cooldown = 2;

        engine.step(StepInput::new(0)).unwrap();
        assert_eq!(engine.state().product(KELP).unwrap().cooldown, 2);

        let out = engine.step(input(100)).unwrap();
        let kelp = engine.state().product(KELP).unwrap();
        assert!(out.orders.is_empty());
        assert_eq!(kelp.cooldown, 1);
        assert!(kelp.history.is_empty());
    }

    #[test]
    fn breakout_buys_at_fair_value() {
        let mut engine = engine_with(
            KELP,
            StrategyConfig::new(Rule::Signal(SignalConfig::Breakout { period: 3 }), 50, 2028.0),
        );
        for mid in [100, 101] {
            assert!(engine.step(input(mid)).unwrap().orders.is_empty());
        }
        let out = engine.step(input(105)).unwrap();
        assert_eq!(
            out.orders_for(KELP),
            &[OrderIntent::new(KELP, crate::domain::Side::Buy, 105, 10)]
        );
    }

    #[test]
    fn conversions_pass_through() {
        let mut cfg = StrategyPreset::MarketMaking.to_config();
        cfg.conversions = 3;
        let mut engine = Engine::new(cfg).unwrap();
        assert_eq!(engine.step(StepInput::new(0)).unwrap().conversions, 3);
    }

    #[test]
    fn trader_data_resumes_in_new_process() {
        let cfg = StrategyPreset::MeanReversion.to_config();
        let mut first = Engine::new(cfg.clone()).unwrap();
        let mut data = String::new();
        for mid in [100, 102, 101] {
            let mut step = input(mid);
            step.trader_data = data;
            data = first.step(step).unwrap().trader_data;
        }

        let mut second = Engine::new(cfg).unwrap();
        let mut step = input(103);
        step.trader_data = data;
        second.step(step).unwrap();

        assert_eq!(second.steps(), 4);
        assert_eq!(
            second.state().window(KELP, 10),
            vec![100.0, 102.0, 101.0, 103.0]
        );
    }

    #[test]
    fn restored_history_keeps_configured_capacity() {
        let cfg = StrategyPreset::MeanReversion.to_config();
        let capacity = cfg.products[KELP].history_capacity;
        let mut first = Engine::new(cfg.clone()).unwrap();
        let data = first.step(input(100)).unwrap().trader_data;

        for claimed in [0, capacity + 7] {
            let tampered = data.replace(
                &format!("\"capacity\":{capacity}"),
                &format!("\"capacity\":{claimed}"),
            );
            assert_ne!(tampered, data);

            let mut second = Engine::new(cfg.clone()).unwrap();
            let mut step = input(101);
            step.trader_data = tampered;
            second.step(step).unwrap();

            let history = &second.state().product(KELP).unwrap().history;
            assert_eq!(history.capacity(), capacity);
            assert_eq!(history.window(10), vec![100.0, 101.0]);
            assert_eq!(second.steps(), 2);
        }
    }

    #[test]
    fn bad_trader_data_starts_fresh() {
        let mut engine = Engine::new(StrategyPreset::MeanReversion.to_config()).unwrap();
        let mut step = input(100);
        step.trader_data = "definitely not json".into();
        let out = engine.step(step).unwrap();
        assert_eq!(engine.state().window(KELP, 10), vec![100.0]);
        assert!(!out.trader_data.is_empty());
    }

    #[test]
    fn foreign_trader_data_is_rejected() {
        let mut other = Engine::new(StrategyPreset::TrendFollowing.to_config()).unwrap();
        let data = other.step(input(100)).unwrap().trader_data;

        let mut engine = Engine::new(StrategyPreset::MeanReversion.to_config()).unwrap();
        assert!(matches!(
            engine.restore_state(&data),
            Err(StateError::FingerprintMismatch { .. })
        ));
    }
}
