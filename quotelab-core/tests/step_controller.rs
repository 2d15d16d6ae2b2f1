//! End-to-end tests for the step controller.
//!
//! Each test drives `Engine::step` with hand-built books and checks the
//! emitted orders together with the per-product state left behind.

use std::collections::BTreeMap;

use quotelab_core::domain::{OrderDepth, OrderIntent, Side, StepInput};
use quotelab_core::engine::Engine;
use quotelab_core::signals::SignalConfig;
use quotelab_core::sizing::QuoteConfig;
use quotelab_core::strategy::{ObservationSource, Rule, StrategyConfig};
use quotelab_core::valuation::Estimator;
use quotelab_core::{EngineConfig, StrategyPreset};

const KELP: &str = "KELP";

// ── Helpers ──────────────────────────────────────────────────────────

fn engine(cfg: StrategyConfig) -> Engine {
    let mut products = BTreeMap::new();
    products.insert(KELP.to_string(), cfg);
    Engine::new(EngineConfig::new(products)).unwrap()
}

/// A one-tick-wide book around `mid` with 20 lots per side.
fn step_at(mid: i64, position: i64) -> StepInput {
    StepInput::new(0)
        .with_depth(KELP, OrderDepth::from_levels(&[(mid - 1, 20)], &[(mid + 1, 20)]))
        .with_position(KELP, position)
}

fn signal_config(signal: SignalConfig, window: usize) -> StrategyConfig {
    StrategyConfig {
        window,
        ..StrategyConfig::new(Rule::Signal(signal), 50, 2028.0)
    }
}

// ── Bounded history ──────────────────────────────────────────────────

#[test]
fn history_never_exceeds_capacity() {
    let mut e = engine(StrategyConfig {
        history_capacity: 5,
        window: 5,
        ..StrategyConfig::new(Rule::Signal(SignalConfig::MovingAverage { period: 3 }), 50, 2028.0)
    });
    for mid in 100..120 {
        e.step(step_at(mid, 0)).unwrap();
        assert!(e.state().product(KELP).unwrap().history.len() <= 5);
    }
    assert_eq!(
        e.state().window(KELP, 10),
        vec![115.0, 116.0, 117.0, 118.0, 119.0]
    );
}

// ── EMA exactly once per step ────────────────────────────────────────

#[test]
fn ema_follows_closed_form_recursion() {
    let window = 4;
    let mut e = engine(StrategyConfig {
        estimator: Estimator::Ema { window },
        ..signal_config(SignalConfig::MovingAverage { period: 3 }, 5)
    });
    let mids = [100, 104, 98, 101, 107, 103];
    for mid in mids {
        e.step(step_at(mid, 0)).unwrap();
    }

    let alpha = 2.0 / (window as f64 + 1.0);
    let expected = mids[1..]
        .iter()
        .fold(mids[0] as f64, |ema, &m| alpha * m as f64 + (1.0 - alpha) * ema);

    let ema = &e.state().product(KELP).unwrap().ema;
    assert!((ema.value().unwrap() - expected).abs() < 1e-9);
    assert_eq!(ema.last_step(), Some(mids.len() as u64 - 1));
}

// ── Z-score boundary example ─────────────────────────────────────────

#[test]
fn z_score_jump_sells_capped_quantity() {
    let mut e = engine(signal_config(
        SignalConfig::ZScore {
            period: 14,
            threshold: 1.0,
        },
        14,
    ));
    for _ in 0..13 {
        assert!(e.step(step_at(10, -45)).unwrap().orders.is_empty());
    }
    let out = e.step(step_at(12, -45)).unwrap();
    // fixed size 10, room to sell = 50 + (-45) = 5
    assert_eq!(out.orders_for(KELP), &[OrderIntent::new(KELP, Side::Sell, 12, 5)]);
}

// ── Volatility gate ──────────────────────────────────────────────────

#[test]
fn volatility_gate_silences_firing_signal() {
    let gated = StrategyConfig {
        volatility_threshold: Some(5.0),
        ..signal_config(SignalConfig::Breakout { period: 3 }, 3)
    };
    let mut e = engine(gated.clone());
    for mid in [100, 101] {
        e.step(step_at(mid, 0)).unwrap();
    }
    // 110 breaks out of [100, 101] but the window range is 10 > 5
    assert!(e.step(step_at(110, 0)).unwrap().orders.is_empty());

    let mut ungated = engine(StrategyConfig {
        volatility_threshold: None,
        ..gated
    });
    for mid in [100, 101] {
        ungated.step(step_at(mid, 0)).unwrap();
    }
    assert!(!ungated.step(step_at(110, 0)).unwrap().orders.is_empty());
}

// ── Cooldown ─────────────────────────────────────────────────────────

#[test]
fn cooldown_suppresses_three_steps_then_evaluates() {
    let mut e = engine(StrategyConfig {
        cooldown_steps: 3,
        ..signal_config(SignalConfig::Breakout { period: 3 }, 3)
    });
    e.step(step_at(100, 10)).unwrap();
    e.step(step_at(100, 10)).unwrap();
    let exit = e.step(step_at(95, 10)).unwrap();
    assert_eq!(exit.orders_for(KELP)[0].side(), Side::Sell);
    assert_eq!(e.state().product(KELP).unwrap().cooldown, 3);

    for expected in [2, 1, 0] {
        // 80 would break down again, but the product is cooling down
        let out = e.step(step_at(80, 10)).unwrap();
        assert!(out.orders.is_empty());
        assert_eq!(e.state().product(KELP).unwrap().cooldown, expected);
    }
    assert_eq!(e.state().window(KELP, 3), vec![100.0, 100.0, 95.0]);

    let out = e.step(step_at(90, 10)).unwrap();
    assert_eq!(out.orders_for(KELP)[0].side(), Side::Sell);
}

// ── Trailing stop ────────────────────────────────────────────────────

#[test]
fn trailing_stop_ratchets_then_exits() {
    let mut e = engine(signal_config(
        SignalConfig::TrendSlope {
            period: 4,
            entry_slope: 0.2,
            atr_multiplier: 1.5,
        },
        4,
    ));
    for mid in [100, 101, 102] {
        e.step(step_at(mid, 0)).unwrap();
    }
    let entry = e.step(step_at(103, 0)).unwrap();
    assert_eq!(entry.orders_for(KELP)[0].side(), Side::Buy);

    let stop = |e: &Engine| e.state().product(KELP).unwrap().trailing_stop;
    assert_eq!(stop(&e), Some(101.5));

    let mut stops = vec![101.5];
    for mid in [104, 103] {
        assert!(e.step(step_at(mid, 10)).unwrap().orders.is_empty());
        stops.push(stop(&e).unwrap());
    }
    assert_eq!(stops, vec![101.5, 102.5, 102.5]);
    assert!(stops.windows(2).all(|w| w[1] >= w[0]));

    // 102 < 102.5 → exit the whole long
    let exit = e.step(step_at(102, 10)).unwrap();
    assert_eq!(exit.orders_for(KELP), &[OrderIntent::new(KELP, Side::Sell, 102, 10)]);
    let state = e.state().product(KELP).unwrap();
    assert_eq!(state.trailing_stop, None);
    assert_eq!(state.entry_price, None);
}

// ── Degraded books ───────────────────────────────────────────────────

#[test]
fn empty_sell_side_values_at_fallback() {
    let mut e = engine(StrategyConfig {
        observation: ObservationSource::FairValue,
        ..signal_config(SignalConfig::MovingAverage { period: 3 }, 3)
    });
    let bids_only = StepInput::new(0).with_depth(KELP, OrderDepth::from_levels(&[(99, 20)], &[]));
    let out = e.step(bids_only).unwrap();
    assert!(out.orders.is_empty());
    assert_eq!(e.state().window(KELP, 3), vec![2028.0]);
}

#[test]
fn one_sided_book_skips_mid_observation() {
    let mut e = engine(signal_config(SignalConfig::MovingAverage { period: 3 }, 3));
    let asks_only = StepInput::new(0).with_depth(KELP, OrderDepth::from_levels(&[], &[(101, 20)]));
    e.step(asks_only).unwrap();
    assert!(e.state().product(KELP).unwrap().history.is_empty());
}

// ── Market making ────────────────────────────────────────────────────

#[test]
fn market_maker_quotes_inside_limit() {
    let mut e = engine(StrategyConfig::new(
        Rule::Quote(QuoteConfig::default()),
        20,
        10_000.0,
    ));
    let out = e.step(step_at(10_000, 15)).unwrap();
    assert_eq!(
        out.orders_for(KELP),
        &[
            OrderIntent::new(KELP, Side::Buy, 9_999, 5),
            OrderIntent::new(KELP, Side::Sell, 10_001, 10),
        ]
    );
}

#[test]
fn presets_run_on_synthetic_steps() {
    use quotelab_core::synthetic::{generate_steps, WalkParams};

    for preset in StrategyPreset::all() {
        let cfg = preset.to_config();
        let steps = generate_steps(&cfg, &WalkParams::default(), 200, 11);
        let mut e = Engine::new(cfg.clone()).unwrap();
        let mut data = String::new();
        for (i, mut step) in steps.into_iter().enumerate() {
            // sweep the position across the whole [-50, 50] range
            let position = (i as i64 % 21 - 10) * 5;
            for product in cfg.products.keys() {
                step = step.with_position(product.clone(), position);
            }
            step.trader_data = data;
            let out = e.step(step).unwrap();
            for (product, orders) in &out.orders {
                let max = cfg.products[product].max_position;
                let bought: i64 = orders.iter().filter(|o| o.quantity > 0).map(|o| o.quantity).sum();
                let sold: i64 = orders.iter().filter(|o| o.quantity < 0).map(|o| -o.quantity).sum();
                assert!(orders.iter().all(|o| o.quantity != 0));
                assert!(bought <= max - position, "{product} bought {bought} at {position}");
                assert!(sold <= max + position, "{product} sold {sold} at {position}");
            }
            data = out.trader_data;
        }
        assert_eq!(e.steps(), 200);
    }
}
