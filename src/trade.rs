//! Trade representation produced by the matching engine.
//!
//! Every matching step pairs the head of the best bid queue with the head of
//! the best ask queue and yields exactly one Trade. Each leg reports its own
//! resting price, so the two legs of one trade may differ when the aggressor
//! priced through the passive side.

use crate::order;
use time::OffsetDateTime;

/// One side of an execution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct TradeLeg {
    pub order_id: order::Id,
    /// The resting price of this leg's order.
    pub price: order::Price,
    pub quantity: order::Quantity,
}

/// A single execution between a bid and an ask.
#[derive(Debug, Clone)]
pub struct Trade {
    pub bid: TradeLeg,
    pub ask: TradeLeg,
    /// UTC timestamp when the trade was generated.
    pub timestamp: OffsetDateTime,
}

impl Trade {
    pub fn new(bid: TradeLeg, ask: TradeLeg) -> Self {
        Trade {
            bid,
            ask,
            timestamp: OffsetDateTime::now_utc(),
        }
    }
}
