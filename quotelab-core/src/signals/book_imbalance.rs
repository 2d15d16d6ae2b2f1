//! Order-book imbalance - lean with the heavier side of the book.

use super::{Signal, SignalContext, SignalOutcome};

/// `imbalance = (bid_volume - ask_volume) / (bid_volume + ask_volume)`, zero for
/// an empty book. Reads only the current snapshot, so it needs no history.
#[derive(Debug, Clone)]
pub struct BookImbalance {
    pub threshold: f64,
}

impl BookImbalance {
    pub fn new(threshold: f64) -> Self {
        assert!(threshold >= 0.0, "imbalance threshold must be >= 0");
        Self { threshold }
    }
}

/// Signed volume imbalance of the whole book, in `[-1, 1]`.
pub fn imbalance(bid_volume: u64, ask_volume: u64) -> f64 {
    let total = bid_volume + ask_volume;
    if total == 0 {
        return 0.0;
    }
    (bid_volume as f64 - ask_volume as f64) / total as f64
}

impl Signal for BookImbalance {
    fn name(&self) -> &str {
        "book_imbalance"
    }

    fn min_samples(&self) -> usize {
        0
    }

    fn evaluate(&self, ctx: &SignalContext<'_>) -> SignalOutcome {
        let book = ctx.book;
        let imb = imbalance(book.bid_volume(), book.ask_volume());
        if imb > self.threshold && !book.asks.is_empty() {
            SignalOutcome::buy()
        } else if imb < -self.threshold && !book.bids.is_empty() {
            SignalOutcome::sell()
        } else {
            SignalOutcome::hold()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::OrderBookSnapshot;
    use crate::signals::Decision;

    fn decide(book: &OrderBookSnapshot) -> Decision {
        BookImbalance::new(0.3)
            .evaluate(&SignalContext::new(&[], book))
            .decision
    }

    #[test]
    fn heavy_bids_buy() {
        let book = OrderBookSnapshot::new().with_bid(99, 30).with_ask(101, 10);
        assert_eq!(decide(&book), Decision::Buy);
    }

    #[test]
    fn heavy_asks_sell() {
        let book = OrderBookSnapshot::new().with_bid(99, 10).with_ask(101, 30);
        assert_eq!(decide(&book), Decision::Sell);
    }

    #[test]
    fn one_sided_book_cannot_take_missing_side() {
        let bids_only = OrderBookSnapshot::new().with_bid(99, 30);
        assert_eq!(decide(&bids_only), Decision::Hold);
        assert_eq!(decide(&OrderBookSnapshot::new()), Decision::Hold);
    }

    #[test]
    fn imbalance_bounds() {
        assert_eq!(imbalance(0, 0), 0.0);
        assert_eq!(imbalance(10, 0), 1.0);
        assert_eq!(imbalance(0, 10), -1.0);
    }
}
