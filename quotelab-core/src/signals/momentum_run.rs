//! Momentum run - ride short runs of rising prices, bail on a falling run or a
//! drawdown from entry.

use crate::indicators::{deltas, tail};

use super::{Signal, SignalContext, SignalOutcome, StateUpdate};

/// Observations needed to see three consecutive changes.
pub const MIN_SAMPLES: usize = 4;

/// Buys after two consecutive rises while below the long limit. Sells the whole
/// long after three consecutive drops, or once price falls under
/// `stop_fraction · entry_price`.
#[derive(Debug, Clone)]
pub struct MomentumRun {
    pub stop_fraction: f64,
}

impl MomentumRun {
    pub fn new(stop_fraction: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&stop_fraction),
            "stop_fraction must be within [0, 1]"
        );
        Self { stop_fraction }
    }
}

impl Signal for MomentumRun {
    fn name(&self) -> &str {
        "momentum_run"
    }

    fn min_samples(&self) -> usize {
        MIN_SAMPLES
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let changes = deltas(tail(ctx.window, MIN_SAMPLES));
        let (Some(price), [c1, c2, c3]) = (ctx.price(), changes.as_slice()) else {
            return SignalOutcome::warmup();
        };

        if *c2 > 0.0 && *c3 > 0.0 && ctx.position < ctx.max_position {
            return SignalOutcome::buy().with_state(StateUpdate::enter(price, None));
        }

        let falling = *c1 < 0.0 && *c2 < 0.0 && *c3 < 0.0;
        let stopped = ctx
            .entry_price
            .is_some_and(|entry| price < self.stop_fraction * entry);
        if (falling || stopped) && ctx.position > 0 {
            return SignalOutcome::sell()
                .with_size_hint(ctx.position.unsigned_abs())
                .with_state(StateUpdate::exit());
        }

        SignalOutcome::hold()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderBookSnapshot;
    use crate::signals::{Decision, Update};

    fn eval_at(window: &[f64], position: i64, entry: Option<f64>) -> SignalOutcome {
        let book = OrderBookSnapshot::new();
        let ctx = SignalContext::new(window, &book)
            .with_position(position, 20)
            .with_entry(entry, None);
        MomentumRun::new(0.8).evaluate(&ctx)
    }

    #[test]
    fn two_rises_buy_and_record_entry() {
        let out = eval_at(&[10.0, 9.0, 10.0, 11.0], 0, None);
        assert_eq!(out.decision, Decision::Buy);
        assert_eq!(out.state.entry_price, Update::Set(11.0));
    }

    #[test]
    fn no_buy_at_limit() {
        let out = eval_at(&[10.0, 9.0, 10.0, 11.0], 20, None);
        assert_eq!(out.decision, Decision::Hold);
    }

    #[test]
    fn three_drops_sell_whole_long() {
        let out = eval_at(&[13.0, 12.0, 11.0, 10.0], 7, Some(12.0));
        assert_eq!(out.decision, Decision::Sell);
        assert_eq!(out.size_hint, Some(7));
        assert_eq!(out.state, StateUpdate::exit());
    }

    #[test]
    fn drawdown_from_entry_sells() {
        // one drop only, but 7.9 < 0.8 * 10
        let out = eval_at(&[8.0, 8.0, 8.0, 7.9], 3, Some(10.0));
        assert_eq!(out.decision, Decision::Sell);
    }

    #[test]
    fn nothing_to_sell_when_flat() {
        let out = eval_at(&[13.0, 12.0, 11.0, 10.0], 0, None);
        assert_eq!(out.decision, Decision::Hold);
    }
}
