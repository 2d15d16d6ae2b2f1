//! Order placement - where a sized order goes in the book.

use serde::{Deserialize, Serialize};

use crate::domain::{OrderBookSnapshot, OrderIntent, Side};

/// Price selection for signal-driven orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// One order at the fair value truncated to a whole tick.
    #[default]
    FairValue,
    /// One order at the opposite touch: best ask for buys, best bid for sells.
    Touch,
    /// Take opposite levels best-first while they are no worse than fair value,
    /// one order per level, until the quantity is used up.
    Sweep,
}

/// Orders for `quantity` on `side`. Never emits zero-quantity orders; the total
/// never exceeds `quantity`.
pub fn place_orders(
    product: &str,
    side: Side,
    quantity: u64,
    fair_value: f64,
    book: &OrderBookSnapshot,
    placement: Placement,
) -> Vec<OrderIntent> {
    if quantity == 0 {
        return Vec::new();
    }
    match placement {
        Placement::FairValue => {
            vec![OrderIntent::new(product, side, fair_value.trunc() as i64, quantity)]
        }
        Placement::Touch => {
            let touch = match side {
                Side::Buy => book.best_ask(),
                Side::Sell => book.best_bid(),
            };
            touch
                .map(|price| OrderIntent::new(product, side, price, quantity))
                .into_iter()
                .collect()
        }
        Placement::Sweep => sweep(product, side, quantity, fair_value, book),
    }
}

fn sweep(
    product: &str,
    side: Side,
    quantity: u64,
    fair_value: f64,
    book: &OrderBookSnapshot,
) -> Vec<OrderIntent> {
    let levels: Box<dyn Iterator<Item = (&i64, &u64)>> = match side {
        Side::Buy => Box::new(book.asks.iter()),
        Side::Sell => Box::new(book.bids.iter().rev()),
    };
    let acceptable = |price: i64| match side {
        Side::Buy => price as f64 <= fair_value,
        Side::Sell => price as f64 >= fair_value,
    };

    let mut remaining = quantity;
    let mut orders = Vec::new();
    for (&price, &volume) in levels {
        if remaining == 0 || !acceptable(price) {
            break;
        }
        let take = volume.min(remaining);
        if take > 0 {
            orders.push(OrderIntent::new(product, side, price, take));
            remaining -= take;
        }
    }
    orders
}
