//! Keltner channel reversion.

use crate::indicators::keltner_bands;

use super::{Signal, SignalContext, SignalOutcome};

/// Buys below `EMA - multiplier·ATR`, sells above `EMA + multiplier·ATR`.
#[derive(Debug, Clone)]
pub struct KeltnerReversion {
    pub period: usize,
    pub multiplier: f64,
    name: String,
}

impl KeltnerReversion {
    pub fn new(period: usize, multiplier: f64) -> Self {
        assert!(period >= 2, "Keltner period must be >= 2");
        Self {
            period,
            multiplier,
            name: format!("keltner_{period}"),
        }
    }
}

impl Signal for KeltnerReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        self.period
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let (Some(price), Some((lower, upper))) = (
            ctx.price(),
            keltner_bands(ctx.window, self.period, self.multiplier),
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
