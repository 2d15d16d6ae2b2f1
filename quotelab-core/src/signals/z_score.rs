//! Z-score mean reversion.

use crate::indicators::z_score;

use super::{Signal, SignalContext, SignalOutcome};

/// Buys when the current price sits more than `threshold` deviations below the
/// window mean, sells when it sits more than `threshold` above.
#[derive(Debug, Clone)]
pub struct ZScoreReversion {
    pub period: usize,
    pub threshold: f64,
    name: String,
}

impl ZScoreReversion {
    pub fn new(period: usize, threshold: f64) -> Self {
        assert!(period >= 1, "z-score period must be >= 1");
        Self {
            period,
            threshold,
            name: format!("z_score_{period}"),
        }
    }
}

impl Signal for ZScoreReversion {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        self.period
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        match z_score(ctx.window, self.period) {
            None => SignalOutcome::warmup(),
            Some(z) if z < -self.threshold => SignalOutcome::buy(),
            Some(z) if z > self.threshold => SignalOutcome::sell(),
            Some(_) => SignalOutcome::hold(),
        }
    }
}
