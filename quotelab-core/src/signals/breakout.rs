//! Range breakout - trade in the direction of a break of the prior range.

use crate::indicators::tail;

use super::{Signal, SignalContext, SignalOutcome};

/// Compares the current price with the high and low of the preceding
/// `period - 1` observations.
#[derive(Debug, Clone)]
pub struct RangeBreakout {
    pub period: usize,
    name: String,
}

impl RangeBreakout {
    pub fn new(period: usize) -> Self {
        assert!(period >= 2, "breakout period must be >= 2");
        Self {
            period,
            name: format!("breakout_{period}"),
        }
    }
}

impl Signal for RangeBreakout {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        self.period
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let window = tail(ctx.window, self.period);
        let Some((&price, prior)) = window.split_last() else {
            return SignalOutcome::warmup();
        };
        if window.len() < self.period {
            return SignalOutcome::warmup();
        }
        let high = prior.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let low = prior.iter().copied().fold(f64::INFINITY, f64::min);

        if price > high {
            SignalOutcome::buy()
        } else if price < low {
            SignalOutcome::sell()
        } else {
            SignalOutcome::hold()
        }
    }
}
