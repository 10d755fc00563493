use matchbook::book::OrderBook;
use matchbook::order::{Id, Lifecycle, Order, OrderModify, Price, Quantity, Side};
use proptest::prelude::*;

#[derive(Debug, Clone)]
enum Op {
    Add {
        lifecycle: Lifecycle,
        id: Id,
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Market {
        id: Id,
        side: Side,
        quantity: Quantity,
    },
    Cancel {
        id: Id,
    },
    Amend {
        id: Id,
        side: Side,
        price: Price,
        quantity: Quantity,
    },
    Expire,
}

fn any_side() -> impl Strategy<Value = Side> {
    prop_oneof![Just(Side::Buy), Just(Side::Sell)]
}

fn any_limit_lifecycle() -> impl Strategy<Value = Lifecycle> {
    prop_oneof![
        Just(Lifecycle::GoodTillCancel),
        Just(Lifecycle::ImmediateOrCancel),
        Just(Lifecycle::AllOrNone),
        Just(Lifecycle::GoodForDay),
    ]
}

// Small id and price ranges on purpose: collisions exercise the duplicate-id
// rejection and crossing prices keep the matcher busy.
fn any_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any_limit_lifecycle(), 1u64..40, any_side(), 90i32..110, 0u32..15).prop_map(
            |(lifecycle, id, side, price, quantity)| Op::Add {
                lifecycle,
                id,
                side,
                price,
                quantity,
            }
        ),
        (1u64..40, any_side(), 1u32..15).prop_map(|(id, side, quantity)| Op::Market {
            id,
            side,
            quantity
        }),
        (1u64..40).prop_map(|id| Op::Cancel { id }),
        (1u64..40, any_side(), 90i32..110, 1u32..15).prop_map(|(id, side, price, quantity)| {
            Op::Amend {
                id,
                side,
                price,
                quantity,
            }
        }),
        Just(Op::Expire),
    ]
}

fn apply(book: &mut OrderBook, op: &Op) {
    match *op {
        Op::Add {
            lifecycle,
            id,
            side,
            price,
            quantity,
        } => {
            let _ = book.add(Order::new(lifecycle, id, side, price, quantity));
        }
        Op::Market { id, side, quantity } => {
            let _ = book.add(Order::market(id, side, quantity));
        }
        Op::Cancel { id } => {
            book.cancel(id);
        }
        Op::Amend {
            id,
            side,
            price,
            quantity,
        } => {
            let _ = book.amend(OrderModify {
                id,
                side,
                price,
                quantity,
            });
        }
        Op::Expire => {
            book.expire_day_orders();
        }
    }
}

fn live_quantity(book: &OrderBook) -> u64 {
    let depth = book.snapshot();
    depth
        .bids
        .iter()
        .chain(depth.asks.iter())
        .map(|level| level.quantity)
        .sum()
}

proptest! {
    // The book is never crossed at rest, aggregates always equal a live
    // recomputation from the ladder, and no structural link ever dangles.
    #[test]
    fn invariants_hold_after_any_operation_sequence(
        ops in prop::collection::vec(any_op(), 1..200)
    ) {
        let mut book = OrderBook::new();
        for op in &ops {
            apply(&mut book, op);
            book.assert_invariants();
        }
    }

    // Every admitted lot is accounted for: traded twice (once per side),
    // still resting, or carried out by a cancellation. Amends are excluded
    // here because a replacement re-admits the same lots under the same id.
    #[test]
    fn quantity_is_conserved(
        ops in prop::collection::vec(any_op(), 1..200)
    ) {
        let mut book = OrderBook::new();
        let mut admitted: u64 = 0;
        let mut traded_both_sides: u64 = 0;
        let mut cancelled: u64 = 0;

        for op in &ops {
            match *op {
                Op::Add { lifecycle, id, side, price, quantity } => {
                    if let Ok(trades) = book.add(Order::new(lifecycle, id, side, price, quantity)) {
                        admitted += u64::from(quantity);
                        let own_fill: u64 = trades
                            .iter()
                            .map(|trade| match side {
                                Side::Buy => &trade.bid,
                                Side::Sell => &trade.ask,
                            })
                            .filter(|leg| leg.order_id == id)
                            .map(|leg| u64::from(leg.quantity))
                            .sum();
                        traded_both_sides += trades
                            .iter()
                            .map(|trade| 2 * u64::from(trade.bid.quantity))
                            .sum::<u64>();
                        // An immediate-or-cancel residual never rests.
                        if lifecycle == Lifecycle::ImmediateOrCancel {
                            cancelled += u64::from(quantity) - own_fill;
                        }
                    }
                }
                Op::Market { id, side, quantity } => {
                    if let Ok(trades) = book.add(Order::market(id, side, quantity)) {
                        admitted += u64::from(quantity);
                        traded_both_sides += trades
                            .iter()
                            .map(|trade| 2 * u64::from(trade.bid.quantity))
                            .sum::<u64>();
                    }
                }
                Op::Cancel { id } => {
                    if let Some(order) = book.cancel(id) {
                        cancelled += u64::from(order.remaining_quantity);
                    }
                }
                Op::Expire => {
                    cancelled += book
                        .expire_day_orders()
                        .iter()
                        .map(|order| u64::from(order.remaining_quantity))
                        .sum::<u64>();
                }
                Op::Amend { .. } => {}
            }
        }

        prop_assert_eq!(admitted, traded_both_sides + cancelled + live_quantity(&book));
    }

    // Cancelling an unknown id changes nothing; cancelling a known id
    // removes exactly that order and keeps the aggregates coherent.
    #[test]
    fn cancel_is_idempotent_and_exact(
        ops in prop::collection::vec(any_op(), 1..100)
    ) {
        let mut book = OrderBook::new();
        for op in &ops {
            apply(&mut book, op);
        }

        let size = book.size();
        prop_assert!(book.cancel(u64::MAX).is_none());
        prop_assert_eq!(book.size(), size);
        book.assert_invariants();

        for id in 1u64..40 {
            if book.cancel(id).is_some() {
                prop_assert_eq!(book.size(), size - 1);
                break;
            }
        }
        book.assert_invariants();
    }

    // Within a price level the earliest arrival fills first: an aggressor
    // consumes resting orders exactly in id (arrival) order.
    #[test]
    fn time_priority_within_a_level(
        quantities in prop::collection::vec(1u32..10, 2..6),
        take in 1u32..60,
    ) {
        let mut book = OrderBook::new();
        for (i, &quantity) in quantities.iter().enumerate() {
            book.add(Order::new(
                Lifecycle::GoodTillCancel,
                i as Id + 1,
                Side::Buy,
                100,
                quantity,
            ))
            .unwrap();
        }

        let trades = book
            .add(Order::new(Lifecycle::GoodTillCancel, 999, Side::Sell, 100, take))
            .unwrap();

        let mut expected = Vec::new();
        let mut remaining = take;
        for (i, &quantity) in quantities.iter().enumerate() {
            if remaining == 0 {
                break;
            }
            expected.push(i as Id + 1);
            remaining = remaining.saturating_sub(quantity);
        }
        let filled: Vec<Id> = trades.iter().map(|trade| trade.bid.order_id).collect();
        prop_assert_eq!(filled, expected);
        book.assert_invariants();
    }
}
