//! Order representation and lifecycle policies.

/// Client-chosen order identifier, unique for the lifetime of the book.
pub type Id = u64;
/// Integer price in ticks. Signed so spread-like instruments can quote below zero.
pub type Price = i32;
/// Order quantity in lots.
pub type Quantity = u32;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Time/fill policy of an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Lifecycle {
    /// Rests until filled or cancelled.
    GoodTillCancel,
    /// Fill what is immediately crossable, cancel the rest (FillAndKill).
    ImmediateOrCancel,
    /// Admit only if the whole quantity can fill right away (FillOrKill).
    AllOrNone,
    /// Rests until filled, cancelled, or the daily cutoff.
    GoodForDay,
    /// No limit price; admission imputes one and promotes to GoodTillCancel.
    Market,
}

/// A single order and its fill state.
///
/// `price` and `lifecycle` are effective values: a market order is re-priced
/// and promoted to [`Lifecycle::GoodTillCancel`] at admission, before it can
/// ever rest in the book.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: Id,
    pub side: Side,
    pub lifecycle: Lifecycle,
    pub price: Price,
    pub initial_quantity: Quantity,
    pub remaining_quantity: Quantity,
}

impl Order {
    pub fn new(lifecycle: Lifecycle, id: Id, side: Side, price: Price, quantity: Quantity) -> Self {
        Order {
            id,
            side,
            lifecycle,
            price,
            initial_quantity: quantity,
            remaining_quantity: quantity,
        }
    }

    /// A market order carries no meaningful price until admission imputes one.
    pub fn market(id: Id, side: Side, quantity: Quantity) -> Self {
        Order::new(Lifecycle::Market, id, side, 0, quantity)
    }

    pub fn filled_quantity(&self) -> Quantity {
        self.initial_quantity - self.remaining_quantity
    }

    pub fn is_filled(&self) -> bool {
        self.remaining_quantity == 0
    }

    /// Consume `quantity` lots of the remainder.
    ///
    /// Over-filling is a logic fault in the caller; the matcher never asks for
    /// more than the remainder, so this aborts rather than corrupt the book.
    pub fn fill(&mut self, quantity: Quantity) {
        assert!(
            quantity <= self.remaining_quantity,
            "cannot fill {} lots of order #{}: only {} remaining",
            quantity,
            self.id,
            self.remaining_quantity
        );
        self.remaining_quantity -= quantity;
    }

    /// Re-price a market order and promote it to GoodTillCancel.
    ///
    /// Only market orders may be re-priced; anything else is a logic fault.
    pub fn to_good_till_cancel(&mut self, price: Price) {
        assert!(
            self.lifecycle == Lifecycle::Market,
            "only market orders can be re-priced, not order #{}",
            self.id
        );
        self.price = price;
        self.lifecycle = Lifecycle::GoodTillCancel;
    }
}

/// Cancel-and-replace request for an existing order.
///
/// Amend needs less than a full order: the id locates the original, the rest
/// describes the replacement. Side may change. The replacement inherits the
/// original's effective lifecycle and goes to the tail of its new price queue.
#[derive(Debug, Copy, Clone)]
pub struct OrderModify {
    pub id: Id,
    pub side: Side,
    pub price: Price,
    pub quantity: Quantity,
}

impl OrderModify {
    pub fn to_order(self, lifecycle: Lifecycle) -> Order {
        Order::new(lifecycle, self.id, self.side, self.price, self.quantity)
    }
}
