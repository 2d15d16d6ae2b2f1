//! Windowed indicator functions.
//!
//! Every indicator is a pure function of a chronological price window (oldest
//! first, newest last) and answers for the newest observation only. They return
//! `None` until enough observations exist; insufficient history is never an error.

/// Substitute for a zero average gain or loss in `rsi`.
pub const RSI_EPSILON: f64 = 1e-5;

/// The trailing `n` elements of a window (all of it when shorter).
pub fn tail(prices: &[f64], n: usize) -> &[f64] {
    &prices[prices.len().saturating_sub(n)..]
}

/// The trailing `period` elements, or `None` while the window is shorter.
fn full_tail(prices: &[f64], period: usize) -> Option<&[f64]> {
    (prices.len() >= period).then(|| tail(prices, period))
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(prices: &[f64]) -> Option<f64> {
    if prices.is_empty() {
        return None;
    }
    Some(prices.iter().sum::<f64>() / prices.len() as f64)
}

/// Population standard deviation (divide by N); `None` for an empty slice.
pub fn population_std(prices: &[f64]) -> Option<f64> {
    let m = mean(prices)?;
    let variance = prices
        .iter()
        .map(|p| {
            let d = p - m;
            d * d
        })
        .sum::<f64>()
        / prices.len() as f64;
    Some(variance.sqrt())
}

/// Consecutive differences `p[i] - p[i-1]`.
pub fn deltas(prices: &[f64]) -> Vec<f64> {
    prices.windows(2).map(|w| w[1] - w[0]).collect()
}

// ─── Averages ───────────────────────────────────────────────────────

/// Smoothing factor for an EMA of the given period.
pub fn alpha(period: usize) -> f64 {
    2.0 / (period as f64 + 1.0)
}

/// EMA across the whole slice, seeded with its first value.
///
/// The stateful per-step fair-value EMA lives in `valuation::EmaAccumulator`.
pub fn ema_of_window(prices: &[f64], period: usize) -> Option<f64> {
    let (first, rest) = prices.split_first()?;
    let a = alpha(period);
    Some(rest.iter().fold(*first, |ema, p| a * p + (1.0 - a) * ema))
}

/// Simple moving average of the last `period` observations.
pub fn sma(prices: &[f64], period: usize) -> Option<f64> {
    mean(full_tail(prices, period)?)
}

// ─── Bands ──────────────────────────────────────────────────────────

/// `(lower, upper)` at `mean ± multiplier·σ` of the last `period` observations.
pub fn bollinger_bands(prices: &[f64], period: usize, multiplier: f64) -> Option<(f64, f64)> {
    let window = full_tail(prices, period)?;
    let m = mean(window)?;
    let width = multiplier * population_std(window)?;
    Some((m - width, m + width))
}

/// `(lower, upper)` at `EMA ± multiplier·ATR`, both over the last `period` observations.
pub fn keltner_bands(prices: &[f64], period: usize, multiplier: f64) -> Option<(f64, f64)> {
    let window = full_tail(prices, period)?;
    let center = ema_of_window(window, period)?;
    let width = multiplier * mean_abs_change(window)?;
    Some((center - width, center + width))
}

// ─── Oscillators ────────────────────────────────────────────────────

/// Z-score of the newest observation against the last `period`. A flat window reads 0.
pub fn z_score(prices: &[f64], period: usize) -> Option<f64> {
    let window = full_tail(prices, period)?;
    let price = *window.last()?;
    let std = population_std(window)?;
    if std == 0.0 {
        return Some(0.0);
    }
    Some((price - mean(window)?) / std)
}

/// `(last - first) / first` over up to `period` observations. Needs two; a zero
/// first price yields `None`.
pub fn rate_of_change(prices: &[f64], period: usize) -> Option<f64> {
    if prices.len() < 2 {
        return None;
    }
    let window = tail(prices, period);
    let first = *window.first()?;
    let last = *window.last()?;
    if first == 0.0 {
        return None;
    }
    Some((last - first) / first)
}

/// RSI over up to `period` observations: `100 - 100 / (1 + avg_gain / avg_loss)`.
///
/// Gains and losses are averaged across all changes, zeros included. A zero
/// average is replaced by `RSI_EPSILON`, so a flat window reads 50 and a
/// one-directional window reads close to 0 or 100. Needs two observations.
pub fn rsi(prices: &[f64], period: usize) -> Option<f64> {
    if prices.len() < 2 {
        return None;
    }
    let changes = deltas(tail(prices, period));
    let n = changes.len() as f64;
    let gain = changes.iter().filter(|c| **c > 0.0).sum::<f64>() / n;
    let loss = -changes.iter().filter(|c| **c < 0.0).sum::<f64>() / n;
    let avg_gain = if gain > 0.0 { gain } else { RSI_EPSILON };
    let avg_loss = if loss > 0.0 { loss } else { RSI_EPSILON };
    Some(100.0 - 100.0 / (1.0 + avg_gain / avg_loss))
}

// ─── Trend and range ────────────────────────────────────────────────

/// Ordinary least-squares slope of `prices` against 0..n. `None` below two points.
pub fn least_squares_slope(prices: &[f64]) -> Option<f64> {
    let n = prices.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = prices.iter().sum::<f64>() / n as f64;
    let (num, den) = prices
        .iter()
        .enumerate()
        .fold((0.0, 0.0), |(num, den), (i, &y)| {
            let dx = i as f64 - x_mean;
            (num + dx * (y - y_mean), den + dx * dx)
        });
    Some(num / den)
}

/// Slope of the last `period` observations, in price units per step.
pub fn slope(prices: &[f64], period: usize) -> Option<f64> {
    least_squares_slope(full_tail(prices, period)?)
}

/// Mean absolute consecutive change across the whole slice.
pub fn mean_abs_change(prices: &[f64]) -> Option<f64> {
    let changes = deltas(prices);
    if changes.is_empty() {
        return None;
    }
    Some(changes.iter().map(|c| c.abs()).sum::<f64>() / changes.len() as f64)
}

/// Average true range on a single series: mean absolute change over the last
/// `period` observations (which yields `period - 1` changes).
pub fn atr(prices: &[f64], period: usize) -> Option<f64> {
    mean_abs_change(full_tail(prices, period)?)
}

/// Assert two f64 values are approximately equal (within epsilon).
#[cfg(test)]
pub fn assert_approx(actual: f64, expected: f64, epsilon: f64) {
    assert!(
        (actual - expected).abs() < epsilon,
        "assert_approx failed: actual={actual}, expected={expected}, diff={}, epsilon={epsilon}",
        (actual - expected).abs()
    );
}

/// Default epsilon for indicator tests.
#[cfg(test)]
pub const DEFAULT_EPSILON: f64 = 1e-10;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_population_std() {
        let prices = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        assert_approx(mean(&prices).unwrap(), 5.0, DEFAULT_EPSILON);
        assert_approx(population_std(&prices).unwrap(), 2.0, DEFAULT_EPSILON);
    }

    #[test]
    fn empty_inputs() {
        assert!(mean(&[]).is_none());
        assert!(population_std(&[]).is_none());
        assert!(deltas(&[1.0]).is_empty());
        assert!(ema_of_window(&[], 3).is_none());
    }

    #[test]
    fn tail_clamps() {
        let prices = [1.0, 2.0, 3.0];
        assert_eq!(tail(&prices, 2), &[2.0, 3.0]);
        assert_eq!(tail(&prices, 10), &[1.0, 2.0, 3.0]);
    }

    #[test]
    fn ema_recursion() {
        // alpha 0.5: seed 10, then 11, then 12.5
        assert_approx(ema_of_window(&[10.0, 12.0, 14.0], 3).unwrap(), 12.5, DEFAULT_EPSILON);
        assert_approx(alpha(1), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn windowed_indicators_wait_for_period() {
        let short = [1.0; 3];
        assert!(sma(&short, 4).is_none());
        assert!(z_score(&short, 4).is_none());
        assert!(slope(&short, 4).is_none());
        assert!(atr(&short, 4).is_none());
        assert!(bollinger_bands(&short, 4, 2.0).is_none());
        assert!(keltner_bands(&short, 4, 1.5).is_none());
        // two observations are enough for the change-based oscillators
        assert!(rate_of_change(&[1.0], 5).is_none());
        assert!(rate_of_change(&[1.0, 2.0], 5).is_some());
        assert!(rsi(&[1.0], 5).is_none());
        assert!(rsi(&[1.0, 2.0], 5).is_some());
    }

    #[test]
    fn sma_uses_newest_window() {
        assert_approx(sma(&[1.0, 2.0, 3.0, 4.0], 2).unwrap(), 3.5, DEFAULT_EPSILON);
    }

    #[test]
    fn bands_are_symmetric_and_collapse_when_flat() {
        let prices = [10.0, 11.0, 12.0, 13.0, 14.0];
        let (lower, upper) = bollinger_bands(&prices, 3, 2.0).unwrap();
        assert_approx(upper - 13.0, 13.0 - lower, DEFAULT_EPSILON);
        assert_eq!(bollinger_bands(&[100.0; 4], 3, 2.0), Some((100.0, 100.0)));
        assert_eq!(keltner_bands(&[50.0; 10], 10, 1.5), Some((50.0, 50.0)));
    }

    #[test]
    fn keltner_width_is_atr_multiple() {
        // changes +2, -1, +3: ATR 2
        let (lower, upper) = keltner_bands(&[10.0, 12.0, 11.0, 14.0], 4, 1.5).unwrap();
        assert_approx(upper - lower, 6.0, DEFAULT_EPSILON);
    }

    #[test]
    fn z_score_of_flat_window_is_zero() {
        assert_eq!(z_score(&[5.0; 4], 4), Some(0.0));
        assert_approx(z_score(&[1.0, 3.0], 2).unwrap(), 1.0, DEFAULT_EPSILON);
    }

    #[test]
    fn rate_of_change_over_window() {
        assert_approx(rate_of_change(&[50.0, 100.0, 110.0], 2).unwrap(), 0.1, DEFAULT_EPSILON);
        assert!(rate_of_change(&[0.0, 1.0], 2).is_none());
    }

    #[test]
    fn rsi_extremes() {
        assert_approx(rsi(&[5.0; 6], 5).unwrap(), 50.0, DEFAULT_EPSILON);
        assert!(rsi(&[1.0, 2.0, 3.0, 4.0], 4).unwrap() > 99.0);
        assert!(rsi(&[4.0, 3.0, 2.0, 1.0], 4).unwrap() < 1.0);
    }

    #[test]
    fn slope_and_atr() {
        let line: Vec<f64> = (0..6).map(|i| 100.0 + 0.5 * i as f64).collect();
        assert_approx(slope(&line, 6).unwrap(), 0.5, DEFAULT_EPSILON);
        assert_approx(least_squares_slope(&[10.0, 8.0, 6.0]).unwrap(), -2.0, DEFAULT_EPSILON);
        // last 3: 11, 14, 14 → changes +3, 0
        assert_approx(atr(&[10.0, 12.0, 11.0, 14.0, 14.0], 3).unwrap(), 1.5, DEFAULT_EPSILON);
        assert!(mean_abs_change(&[1.0]).is_none());
    }
}
