//! Order entry, cancellation, amendment and depth endpoints.
//!
//! The wire schema speaks the client's dialect: lifecycle names
//! `FillAndKill`/`FillOrKill` for the immediate-or-cancel and all-or-none
//! policies, case-insensitive sides, and decimal prices which this layer
//! converts to integer ticks (cents). The core never sees any of that.

use crate::api::error::Error;
use crate::api::validation::ValidatedJson;
use crate::api::SharedMatcher;
use crate::order::{self, Lifecycle, Order, OrderModify};
use crate::trade::{Trade, TradeLeg};
use axum::extract::{Path, State};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};
use validify::{Payload, Validify};

/// Ticks per unit of the client-facing decimal price.
const PRICE_SCALE: f64 = 100.0;

fn to_ticks(price: f64) -> order::Price {
    (price * PRICE_SCALE).round() as order::Price
}

fn to_decimal(price: order::Price) -> f64 {
    f64::from(price) / PRICE_SCALE
}

/// Lifecycle names accepted on the wire.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, ToSchema)]
pub enum LifecycleName {
    GoodTillCancel,
    FillAndKill,
    FillOrKill,
    GoodForDay,
    Market,
}

impl From<LifecycleName> for Lifecycle {
    fn from(value: LifecycleName) -> Self {
        match value {
            LifecycleName::GoodTillCancel => Lifecycle::GoodTillCancel,
            LifecycleName::FillAndKill => Lifecycle::ImmediateOrCancel,
            LifecycleName::FillOrKill => Lifecycle::AllOrNone,
            LifecycleName::GoodForDay => Lifecycle::GoodForDay,
            LifecycleName::Market => Lifecycle::Market,
        }
    }
}

/// Order side, case-insensitive on the wire.
#[derive(Debug, Copy, Clone, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "String")]
pub enum SideName {
    Buy,
    Sell,
}

impl TryFrom<String> for SideName {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.to_ascii_lowercase().as_str() {
            "buy" => Ok(SideName::Buy),
            "sell" => Ok(SideName::Sell),
            other => Err(format!("invalid side {other:?}, expected buy or sell")),
        }
    }
}

impl From<SideName> for order::Side {
    fn from(value: SideName) -> Self {
        match value {
            SideName::Buy => order::Side::Buy,
            SideName::Sell => order::Side::Sell,
        }
    }
}

#[derive(Debug, Deserialize, Validify, Payload, ToSchema)]
pub struct PlaceOrderRequest {
    /// Client-chosen order id, unique for the lifetime of the book.
    pub id: order::Id,
    pub lifecycle: LifecycleName,
    pub side: SideName,
    /// Decimal limit price. Required for every lifecycle except Market.
    pub price: Option<f64>,
    #[validate(range(min = 1.0))]
    pub quantity: order::Quantity,
}

impl PlaceOrderRequest {
    fn into_order(self) -> Result<Order, Error> {
        let side = self.side.into();
        match self.lifecycle {
            LifecycleName::Market => Ok(Order::market(self.id, side, self.quantity)),
            lifecycle => {
                let price = self.price.ok_or_else(|| {
                    Error::BadRequest(
                        "PRICE_REQUIRED".into(),
                        format!("a limit price is required for {lifecycle:?} orders"),
                    )
                })?;
                Ok(Order::new(
                    lifecycle.into(),
                    self.id,
                    side,
                    to_ticks(price),
                    self.quantity,
                ))
            }
        }
    }
}

#[derive(Debug, Deserialize, Validify, Payload, ToSchema)]
pub struct AmendOrderRequest {
    pub side: SideName,
    /// New decimal limit price.
    pub price: f64,
    #[validate(range(min = 1.0))]
    pub quantity: order::Quantity,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TradeLegView {
    pub order_id: order::Id,
    pub price: f64,
    pub quantity: order::Quantity,
}

impl From<&TradeLeg> for TradeLegView {
    fn from(leg: &TradeLeg) -> Self {
        TradeLegView {
            order_id: leg.order_id,
            price: to_decimal(leg.price),
            quantity: leg.quantity,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TradeView {
    pub bid: TradeLegView,
    pub ask: TradeLegView,
}

impl From<&Trade> for TradeView {
    fn from(trade: &Trade) -> Self {
        TradeView {
            bid: (&trade.bid).into(),
            ask: (&trade.ask).into(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaceOrderResponse {
    pub message: String,
    pub trades: Vec<TradeView>,
}

impl PlaceOrderResponse {
    fn from_trades(trades: &[Trade]) -> Self {
        let message = if trades.is_empty() {
            "order added"
        } else {
            "order matched and executed"
        };
        PlaceOrderResponse {
            message: message.to_string(),
            trades: trades.iter().map(TradeView::from).collect(),
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CancelOrderResponse {
    pub message: String,
}

/// One aggregated price level.
#[derive(Debug, Serialize, ToSchema)]
pub struct LevelView {
    pub price: f64,
    pub quantity: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderBookResponse {
    /// Best bid first.
    pub bids: Vec<LevelView>,
    /// Best ask first.
    pub asks: Vec<LevelView>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SizeResponse {
    pub size: usize,
}

#[derive(OpenApi)]
#[openapi(
    paths(place_order, cancel_order, amend_order, order_book, book_size),
    components(schemas())
)]
pub struct OrdersApi;

pub fn router() -> Router<SharedMatcher> {
    Router::new()
        .route("/orders", post(place_order))
        .route("/orders/{id}", put(amend_order).delete(cancel_order))
        .route("/book", get(order_book))
        .route("/book/size", get(book_size))
}

/// Place a new order
#[utoipa::path(
    post,
    path = "/orders",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Order admitted; any trades it produced", body = PlaceOrderResponse),
        (status = 400, description = "Validation error or order rejected"),
    )
)]
async fn place_order(
    State(matcher): State<SharedMatcher>,
    ValidatedJson(request): ValidatedJson<PlaceOrderRequest>,
) -> Result<Json<PlaceOrderResponse>, Error> {
    let order = request.into_order()?;
    let trades = matcher.add_order(order)?;
    Ok(Json(PlaceOrderResponse::from_trades(&trades)))
}

/// Cancel an order by id
#[utoipa::path(
    delete,
    path = "/orders/{id}",
    params(
        ("id" = u64, Path, description = "Client assigned order id"),
    ),
    responses(
        (status = 200, description = "Cancelled, or already gone; the call is idempotent", body = CancelOrderResponse),
    )
)]
async fn cancel_order(
    State(matcher): State<SharedMatcher>,
    Path(id): Path<order::Id>,
) -> Json<CancelOrderResponse> {
    matcher.cancel_order(id);
    Json(CancelOrderResponse {
        message: "order cancelled".to_string(),
    })
}

/// Amend an order: cancel-and-replace, losing time priority
#[utoipa::path(
    put,
    path = "/orders/{id}",
    params(
        ("id" = u64, Path, description = "Client assigned order id"),
    ),
    request_body = AmendOrderRequest,
    responses(
        (status = 200, description = "Trades produced by the replacement; empty for an unknown id", body = PlaceOrderResponse),
        (status = 400, description = "Validation error or replacement rejected"),
    )
)]
async fn amend_order(
    State(matcher): State<SharedMatcher>,
    Path(id): Path<order::Id>,
    ValidatedJson(request): ValidatedJson<AmendOrderRequest>,
) -> Result<Json<PlaceOrderResponse>, Error> {
    let modify = OrderModify {
        id,
        side: request.side.into(),
        price: to_ticks(request.price),
        quantity: request.quantity,
    };
    let trades = matcher.amend_order(modify)?;
    Ok(Json(PlaceOrderResponse::from_trades(&trades)))
}

/// Aggregated depth of book
#[utoipa::path(
    get,
    path = "/book",
    responses(
        (status = 200, description = "Bids descending and asks ascending", body = OrderBookResponse),
    )
)]
async fn order_book(State(matcher): State<SharedMatcher>) -> Json<OrderBookResponse> {
    let depth = matcher.snapshot();
    let level = |item: &crate::book::DepthItem| LevelView {
        price: to_decimal(item.price),
        quantity: item.quantity,
    };
    Json(OrderBookResponse {
        bids: depth.bids.iter().map(level).collect(),
        asks: depth.asks.iter().map(level).collect(),
    })
}

/// Number of resting orders
#[utoipa::path(
    get,
    path = "/book/size",
    responses(
        (status = 200, description = "Resting order count", body = SizeResponse),
    )
)]
async fn book_size(State(matcher): State<SharedMatcher>) -> Json<SizeResponse> {
    Json(SizeResponse {
        size: matcher.size(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn side_names_parse_case_insensitively() {
        assert!(matches!(
            SideName::try_from("buy".to_string()),
            Ok(SideName::Buy)
        ));
        assert!(matches!(
            SideName::try_from("SELL".to_string()),
            Ok(SideName::Sell)
        ));
        assert!(matches!(
            SideName::try_from("Buy".to_string()),
            Ok(SideName::Buy)
        ));
        assert!(SideName::try_from("hold".to_string()).is_err());
    }

    #[test]
    fn decimal_prices_convert_to_cent_ticks() {
        assert_eq!(to_ticks(100.25), 10025);
        assert_eq!(to_ticks(0.01), 1);
        assert_eq!(to_ticks(-1.5), -150);
        assert_eq!(to_decimal(10025), 100.25);
    }

    #[test]
    fn market_orders_ignore_price_and_limits_require_one() {
        let market = PlaceOrderRequest {
            id: 1,
            lifecycle: LifecycleName::Market,
            side: SideName::Buy,
            price: None,
            quantity: 5,
        };
        let order = market.into_order().unwrap();
        assert_eq!(order.lifecycle, Lifecycle::Market);

        let limit = PlaceOrderRequest {
            id: 2,
            lifecycle: LifecycleName::FillOrKill,
            side: SideName::Sell,
            price: None,
            quantity: 5,
        };
        assert!(limit.into_order().is_err());

        let limit = PlaceOrderRequest {
            id: 3,
            lifecycle: LifecycleName::FillAndKill,
            side: SideName::Sell,
            price: Some(99.5),
            quantity: 5,
        };
        let order = limit.into_order().unwrap();
        assert_eq!(order.lifecycle, Lifecycle::ImmediateOrCancel);
        assert_eq!(order.price, 9950);
    }
}
