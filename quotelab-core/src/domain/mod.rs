//! Domain types for QuoteLab.

pub mod book;
pub mod order;
pub mod step;
pub mod trade;

pub use book::{OrderBookSnapshot, OrderDepth};
pub use order::{OrderIntent, Side};
pub use step::{StepInput, StepOutput};
pub use trade::Trade;
