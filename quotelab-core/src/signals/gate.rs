//! Volatility gate - suppresses trading when the window's range is too wide.
//!
//! Applies to every signal type. A gated product answers Hold regardless of
//! what its rule would have said.

/// Range-based volatility gate.
///
/// Blocks when `max(window) - min(window) > threshold`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityGate {
    pub threshold: f64,
}

impl VolatilityGate {
    pub fn new(threshold: f64) -> Self {
        assert!(threshold >= 0.0, "volatility threshold must be >= 0");
        Self { threshold }
    }

    /// Range of the window, `None` when empty.
    pub fn range(window: &[f64]) -> Option<f64> {
        let first = *window.first()?;
        let (lo, hi) = window
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Some(hi - lo)
    }

    pub fn blocks(&self, window: &[f64]) -> bool {
        Self::range(window).is_some_and(|r| r > self.threshold)
    }
}
