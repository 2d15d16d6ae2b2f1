//! Price versus its moving average.

use crate::indicators::sma;

use super::{Signal, SignalContext, SignalOutcome};

#[derive(Debug, Clone)]
pub struct MovingAverageTrend {
    pub period: usize,
    name: String,
}

impl MovingAverageTrend {
    pub fn new(period: usize) -> Self {
        assert!(period >= 1, "moving average period must be >= 1");
        Self {
            period,
            name: format!("moving_average_{period}"),
        }
    }
}

impl Signal for MovingAverageTrend {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        self.period
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let (Some(price), Some(avg)) = (ctx.price(), sma(ctx.window, self.period)) else {
            return SignalOutcome::warmup();
        };
        if price > avg {
            SignalOutcome::buy()
        } else if price < avg {
            SignalOutcome::sell()
        } else {
            SignalOutcome::hold()
        }
    }
}
