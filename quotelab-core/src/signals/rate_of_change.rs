//! Rate-of-change trend signal.

use crate::indicators::rate_of_change;

use super::{Signal, SignalContext, SignalOutcome};

/// Buys when the fractional change over `period` exceeds `sensitivity`,
/// sells when it falls below `-sensitivity`.
#[derive(Debug, Clone)]
pub struct RateOfChange {
    pub period: usize,
    pub sensitivity: f64,
    name: String,
}

impl RateOfChange {
    pub fn new(period: usize, sensitivity: f64) -> Self {
        assert!(period >= 2, "rate of change period must be >= 2");
        Self {
            period,
            sensitivity,
            name: format!("rate_of_change_{period}"),
        }
    }
}

impl Signal for RateOfChange {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        2
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        match rate_of_change(ctx.window, self.period) {
            None => SignalOutcome::warmup(),
            Some(roc) if roc > self.sensitivity => SignalOutcome::buy(),
            Some(roc) if roc < -self.sensitivity => SignalOutcome::sell(),
            Some(_) => SignalOutcome::hold(),
        }
    }
}
