//! The order book core: admission, matching, and depth.
//!
//! [`OrderBook`] owns the coupled representations of the same market: the
//! price [`ladder`] (price-time ordering plus the O(1) id index) and the
//! [`levels`] aggregate (per-price count/quantity for feasibility checks and
//! depth). Every mutation flows through `insert_resting` / `remove_resting` /
//! the match loop, which are the only call sites of the aggregate hooks.
//!
//! The struct itself is single-threaded; [`crate::matcher::Matcher`] wraps it
//! in the process-wide mutex.

pub mod ladder;
pub mod levels;

use crate::book::ladder::Ladder;
use crate::book::levels::{LevelData, LevelIndex};
use crate::order::{Id, Lifecycle, Order, OrderModify, Price, Quantity, Side};
use crate::trade::{Trade, TradeLeg};
use std::cmp;
use std::collections::BTreeMap;
use thiserror::Error;

/// Aggregated depth at a single price level.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DepthItem {
    pub price: Price,
    /// Total resting quantity at this price.
    pub quantity: u64,
}

/// A consistent point-in-time view of the aggregated book.
#[derive(Debug, Clone)]
pub struct Depth {
    /// Bids in descending price order.
    pub bids: Vec<DepthItem>,
    /// Asks in ascending price order.
    pub asks: Vec<DepthItem>,
}

/// Soft admission rejections. None of these leave any side effect on the book.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("another order with id #{0} already exists")]
    DuplicateOrderId(Id),
    #[error("order #{0} must have a positive quantity")]
    ZeroQuantity(Id),
    #[error("market order #{0} has no opposite liquidity to sweep")]
    NoOppositeLiquidity(Id),
    #[error("order #{0} cannot match immediately")]
    CannotMatch(Id),
    #[error("order #{0} cannot be filled completely")]
    CannotFullyFill(Id),
}

#[derive(Debug, Default)]
pub struct OrderBook {
    ladder: Ladder,
    levels: LevelIndex,
}

impl OrderBook {
    pub fn new() -> Self {
        OrderBook::default()
    }

    /// Admit an order, classifying it by lifecycle, and run the match loop.
    ///
    /// Returns the trades the order produced, possibly none. Rejections per
    /// lifecycle: a duplicate id is always rejected; a market order needs a
    /// non-empty opposite book and is re-priced at its far end (then treated
    /// as GoodTillCancel, so it sweeps everything and may rest); an
    /// immediate-or-cancel order must cross at arrival; an all-or-none order
    /// must be completely fillable at arrival.
    pub fn add(&mut self, mut order: Order) -> Result<Vec<Trade>, Error> {
        if order.initial_quantity == 0 {
            return Err(Error::ZeroQuantity(order.id));
        }
        if self.ladder.contains(order.id) {
            return Err(Error::DuplicateOrderId(order.id));
        }

        match order.lifecycle {
            Lifecycle::Market => {
                let Some(worst) = self.ladder.worst_price(order.side.opposite()) else {
                    return Err(Error::NoOppositeLiquidity(order.id));
                };
                order.to_good_till_cancel(worst);
            }
            Lifecycle::ImmediateOrCancel => {
                if !self.can_match(order.side, order.price) {
                    return Err(Error::CannotMatch(order.id));
                }
            }
            Lifecycle::AllOrNone => {
                if !self
                    .levels
                    .can_fully_fill(order.side, order.price, order.initial_quantity)
                {
                    return Err(Error::CannotFullyFill(order.id));
                }
            }
            Lifecycle::GoodTillCancel | Lifecycle::GoodForDay => {}
        }

        self.insert_resting(order);
        Ok(self.match_orders())
    }

    /// Cancel a resting order. Unknown ids are a silent no-op so clients can
    /// race their own fills without error handling.
    pub fn cancel(&mut self, id: Id) -> Option<Order> {
        self.remove_resting(id)
    }

    /// Cancel-and-replace. The replacement keeps the original's effective
    /// lifecycle, may change side, and joins the tail of its new price queue
    /// (priority is deliberately lost). Unknown ids are a no-op.
    pub fn amend(&mut self, modify: OrderModify) -> Result<Vec<Trade>, Error> {
        let Some(existing) = self.remove_resting(modify.id) else {
            return Ok(Vec::new());
        };
        self.add(modify.to_order(existing.lifecycle))
    }

    /// Number of resting orders.
    pub fn size(&self) -> usize {
        self.ladder.len()
    }

    /// Aggregated depth of the whole book, bids descending and asks ascending.
    pub fn snapshot(&self) -> Depth {
        let item = |(&price, level): (&Price, &LevelData)| DepthItem {
            price,
            quantity: level.quantity,
        };
        Depth {
            bids: self.levels.bids().iter().rev().map(item).collect(),
            asks: self.levels.asks().iter().map(item).collect(),
        }
    }

    /// Whether an order on `side` limited at `price` crosses the best
    /// opposite level.
    pub fn can_match(&self, side: Side, price: Price) -> bool {
        match side {
            Side::Buy => self
                .ladder
                .best(Side::Sell)
                .is_some_and(|(best_ask, _)| price >= best_ask),
            Side::Sell => self
                .ladder
                .best(Side::Buy)
                .is_some_and(|(best_bid, _)| price <= best_bid),
        }
    }

    /// Whether `quantity` on `side` limited at `price` could fill completely
    /// against current resting liquidity. Answered from the level aggregates.
    pub fn can_fully_fill(&self, side: Side, price: Price, quantity: Quantity) -> bool {
        self.levels.can_fully_fill(side, price, quantity)
    }

    /// Cancel every resting good-for-day order, returning them. Invoked by
    /// the expiry worker at the daily cutoff.
    pub fn expire_day_orders(&mut self) -> Vec<Order> {
        let expired: Vec<Id> = self
            .ladder
            .orders()
            .filter(|order| order.lifecycle == Lifecycle::GoodForDay)
            .map(|order| order.id)
            .collect();
        expired
            .into_iter()
            .filter_map(|id| self.remove_resting(id))
            .collect()
    }

    // Chokepoint for ladder insertion; the only caller of on_added.
    fn insert_resting(&mut self, order: Order) {
        self.levels
            .on_added(order.side, order.price, order.remaining_quantity);
        self.ladder.insert(order);
    }

    // Chokepoint for non-match removal; the only caller of on_cancelled.
    fn remove_resting(&mut self, id: Id) -> Option<Order> {
        let order = self.ladder.remove(id)?;
        self.levels
            .on_cancelled(order.side, order.price, order.remaining_quantity);
        Some(order)
    }

    /// Drain crossable liquidity: while the best bid meets the best ask, fill
    /// head against head for the smaller remainder, one trade per step, each
    /// leg at its own resting price. Afterwards, a head-of-book order whose
    /// lifecycle demands immediate execution is cancelled rather than left
    /// resting.
    fn match_orders(&mut self) -> Vec<Trade> {
        let mut trades = Vec::new();

        loop {
            let (Some((bid_price, bid_idx)), Some((ask_price, ask_idx))) =
                (self.ladder.best(Side::Buy), self.ladder.best(Side::Sell))
            else {
                break;
            };
            if bid_price < ask_price {
                break;
            }

            let quantity = cmp::min(
                self.ladder.order(bid_idx).remaining_quantity,
                self.ladder.order(ask_idx).remaining_quantity,
            );

            let legs = [(Side::Buy, bid_idx), (Side::Sell, ask_idx)].map(|(side, idx)| {
                let order = self.ladder.order_mut(idx);
                order.fill(quantity);
                let leg = TradeLeg {
                    order_id: order.id,
                    price: order.price,
                    quantity,
                };
                let fully_filled = order.is_filled();
                self.levels.on_matched(side, leg.price, quantity, fully_filled);
                if fully_filled {
                    self.ladder.remove_at(idx);
                }
                leg
            });
            let [bid_leg, ask_leg] = legs;
            trades.push(Trade::new(bid_leg, ask_leg));
        }

        self.cancel_if_immediate(Side::Buy);
        self.cancel_if_immediate(Side::Sell);

        trades
    }

    // Immediate-or-cancel housekeeping observed at the top of book: a resting
    // remainder of such an order is cancelled after the drain.
    fn cancel_if_immediate(&mut self, side: Side) {
        if let Some((_, head)) = self.ladder.best(side) {
            let order = self.ladder.order(head);
            if order.lifecycle == Lifecycle::ImmediateOrCancel {
                let id = order.id;
                self.remove_resting(id);
            }
        }
    }

    /// Recompute every derived structure from the ladder and abort on any
    /// divergence. Test and debugging aid: a failure here means the book is
    /// corrupt and must not keep trading.
    pub fn assert_invariants(&self) {
        self.ladder.assert_consistent();

        if let (Some((best_bid, _)), Some((best_ask, _))) =
            (self.ladder.best(Side::Buy), self.ladder.best(Side::Sell))
        {
            assert!(
                best_bid < best_ask,
                "book crossed at rest: {best_bid} >= {best_ask}"
            );
        }

        let mut bids: BTreeMap<Price, LevelData> = BTreeMap::new();
        let mut asks: BTreeMap<Price, LevelData> = BTreeMap::new();
        for order in self.ladder.orders() {
            let level = match order.side {
                Side::Buy => bids.entry(order.price).or_default(),
                Side::Sell => asks.entry(order.price).or_default(),
            };
            level.count += 1;
            level.quantity += u64::from(order.remaining_quantity);
        }
        assert_eq!(&bids, self.levels.bids(), "bid aggregates diverged");
        assert_eq!(&asks, self.levels.asks(), "ask aggregates diverged");
    }
}
