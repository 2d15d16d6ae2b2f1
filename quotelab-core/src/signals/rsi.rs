//! RSI reversion - buy oversold, sell overbought.

use crate::indicators::rsi;

use super::{Signal, SignalContext, SignalOutcome};

#[derive(Debug, Clone)]
pub struct RsiReversion {
    pub period: usize,
    pub oversold: f64,
    pub overbought: f64,
    name: String,
}

impl RsiReversion {
    pub fn new(period: usize, oversold: f64, overbought: f64) -> Self {
        assert!(period >= 2, "RSI period must be >= 2");
        assert!(oversold < overbought, "RSI oversold must be below overbought");
        Self {
            period,
            oversold,
            overbought,
            name: format!("rsi_{period}"),
        }
    }
}

impl Signal for RsiReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        2
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        match rsi(ctx.window, self.period) {
            None => SignalOutcome::warmup(),
            Some(rsi) if rsi < self.oversold => SignalOutcome::buy(),
            Some(rsi) if rsi > self.overbought => SignalOutcome::sell(),
            Some(_) => SignalOutcome::hold(),
        }
    }
}
