//! Short/long moving-average crossover.

use crate::indicators::sma;

use super::{Signal, SignalContext, SignalOutcome};

/// Buys while the short mean is above the long mean, sells while below.
#[derive(Debug, Clone)]
pub struct MaCrossover {
    pub short: usize,
    pub long: usize,
    name: String,
}

impl MaCrossover {
    pub fn new(short: usize, long: usize) -> Self {
        assert!(short >= 1 && short < long, "need 1 <= short period < long period");
        Self {
            short,
            long,
            name: format!("ma_crossover_{short}_{long}"),
        }
    }
}

impl Signal for MaCrossover {
    fn name(&self) -> &str {
        &self.name
    }

    fn min_samples(&self) -> usize {
        self.long
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let (Some(short), Some(long)) = (sma(ctx.window, self.short), sma(ctx.window, self.long))
        else {
            return SignalOutcome::warmup();
        };
        if short > long {
            SignalOutcome::buy()
        } else if short < long {
            SignalOutcome::sell()
        } else {
            SignalOutcome::hold()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signals::test_support::eval;
    use crate::signals::{Decision, SignalStatus};

    #[test]
    fn uptrend_buys_downtrend_sells() {
        let up: Vec<f64> = (0..7).map(|i| 100.0 + i as f64).collect();
        let down: Vec<f64> = up.iter().rev().copied().collect();
        let signal = MaCrossover::new(3, 7);
        assert_eq!(eval(&signal, &up).decision, Decision::Buy);
        assert_eq!(eval(&signal, &down).decision, Decision::Sell);
        assert_eq!(eval(&signal, &[5.0; 7]).decision, Decision::Hold);
    }

    #[test]
    fn needs_long_window() {
        assert_eq!(eval(&MaCrossover::new(3, 7), &[1.0; 6]).status, SignalStatus::Warmup);
    }
}
