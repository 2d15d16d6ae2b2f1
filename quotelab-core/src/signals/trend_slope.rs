//! Trend following with an ATR trailing stop.
//!
//! Entry: least-squares slope of the window above `entry_slope` while flat or
//! short. The stop starts at `price - atr_multiplier·ATR` and afterwards only
//! ratchets up. The ratchet is applied before the exit check, so the exit
//! compares the price with the stop as it stands after this step's update.

use crate::indicators::{atr, slope};

use super::{Signal, SignalContext, SignalOutcome, StateUpdate, Update};

#[derive(Debug, Clone)]
pub struct TrendSlope {
    pub period: usize,
    pub entry_slope: f64,
    pub atr_multiplier: f64,
    name: String,
}

impl TrendSlope {
    pub fn new(period: usize, entry_slope: f64, atr_multiplier: f64) -> Self {
        assert!(period >= 2, "trend period must be >= 2");
        assert!(atr_multiplier >= 0.0, "atr_multiplier must be >= 0");
        Self {
            period,
            entry_slope,
            atr_multiplier,
            name: format!("trend_slope_{period}"),
        }
    }
}

impl Signal for TrendSlope {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        self.period
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let (Some(price), Some(slope), Some(atr)) = (
            ctx.price(),
            slope(ctx.window, self.period),
            atr(ctx.window, self.period),
        ) else {
            return SignalOutcome::warmup();
        };
        let proposal = price - self.atr_multiplier * atr;

        if ctx.position > 0 {
            if let Some(stop) = ctx.trailing_stop {
                let ratcheted = stop.max(proposal);
                if price < ratcheted {
                    return SignalOutcome::sell()
                        .with_size_hint(ctx.position.unsigned_abs())
                        .with_state(StateUpdate::exit());
                }
                let mut state = StateUpdate::none();
                if ratcheted > stop {
                    state.trailing_stop = Update::Set(ratcheted);
                }
                return SignalOutcome::hold().with_state(state);
            }
        }

        if slope > self.entry_slope && ctx.position <= 0 {
            return SignalOutcome::buy().with_state(StateUpdate::enter(price, Some(proposal)));
        }
        SignalOutcome::hold()
    }
}
