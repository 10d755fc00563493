//! Synchronised entry point to the order book.
//!
//! One process-wide mutex serialises every mutation; each operation is
//! linearisable and takes effect at the moment its critical section runs.
//! The facade also records throughput metrics, which the API layer exposes
//! through its Prometheus recorder.

use crate::book::{Depth, Error, OrderBook};
use crate::order::{Id, Order, OrderModify};
use crate::trade::Trade;
use metrics::{counter, gauge};
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
pub struct Matcher {
    book: Mutex<OrderBook>,
}

impl Matcher {
    pub fn new() -> Self {
        Matcher::default()
    }

    /// Admit an order and return the trades it produced; see
    /// [`OrderBook::add`] for the per-lifecycle rejection rules.
    pub fn add_order(&self, order: Order) -> Result<Vec<Trade>, Error> {
        let mut book = self.lock();
        let result = book.add(order);
        match &result {
            Ok(trades) => {
                counter!("matchbook_orders_accepted_total").increment(1);
                counter!("matchbook_trades_total").increment(trades.len() as u64);
            }
            Err(_) => counter!("matchbook_orders_rejected_total").increment(1),
        }
        gauge!("matchbook_resting_orders").set(book.size() as f64);
        result
    }

    /// Cancel a resting order; unknown ids are accepted silently.
    pub fn cancel_order(&self, id: Id) -> Option<Order> {
        let mut book = self.lock();
        let cancelled = book.cancel(id);
        if cancelled.is_some() {
            counter!("matchbook_orders_cancelled_total").increment(1);
        }
        gauge!("matchbook_resting_orders").set(book.size() as f64);
        cancelled
    }

    /// Cancel-and-replace; returns the replacement's trades.
    pub fn amend_order(&self, modify: OrderModify) -> Result<Vec<Trade>, Error> {
        let mut book = self.lock();
        let result = book.amend(modify);
        if let Ok(trades) = &result {
            counter!("matchbook_trades_total").increment(trades.len() as u64);
        }
        gauge!("matchbook_resting_orders").set(book.size() as f64);
        result
    }

    /// Number of resting orders.
    pub fn size(&self) -> usize {
        self.lock().size()
    }

    /// Consistent point-in-time view of the aggregated book.
    pub fn snapshot(&self) -> Depth {
        self.lock().snapshot()
    }

    /// Cancel all resting good-for-day orders in one critical section.
    pub fn expire_day_orders(&self) -> Vec<Order> {
        let mut book = self.lock();
        let expired = book.expire_day_orders();
        counter!("matchbook_orders_expired_total").increment(expired.len() as u64);
        gauge!("matchbook_resting_orders").set(book.size() as f64);
        expired
    }

    fn lock(&self) -> MutexGuard<'_, OrderBook> {
        // A poisoned mutex means a panic mid-mutation; the book may be
        // corrupt, so propagate the abort instead of trading on.
        self.book.lock().expect("order book mutex poisoned")
    }
}
