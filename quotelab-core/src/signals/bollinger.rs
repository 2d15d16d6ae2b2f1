//! Bollinger mean reversion - buy below the lower band, sell above the upper.

use crate::indicators::bollinger_bands;

use super::{Signal, SignalContext, SignalOutcome};

/// Fades moves outside `mean ± multiplier·σ` of the last `period` observations.
#[derive(Debug, Clone)]
pub struct BollingerReversion {
    pub period: usize,
    pub multiplier: f64,
    name: String,
}

impl BollingerReversion {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 1, "Bollinger period must be >= 1");
        Self {
            period,
            multiplier,
            name: format!("bollinger_{period}"),
        }
    }
}

impl Signal for BollingerReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        self.period
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let (Some(price), Some((lower, upper))) = (
            ctx.price(),
            bollinger_bands(ctx.window, self.period, self.multiplier),
        ) else {
            return SignalOutcome::warmup();
        };

        if price < lower {
            SignalOutcome::buy()
        } else if price > upper {
            SignalOutcome::sell()
        } else {
            SignalOutcome::hold()
        }
    }
}
