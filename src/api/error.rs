//! Error types and conversions used by the public API layer.
//!
//! Maps domain rejections and request validation failures into HTTP
//! responses with a consistent JSON body shape.

use crate::book;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use validify::ValidationErrors;

/// Machine-readable error code used in API responses.
pub type Code = String;
/// Human-readable error message used in API responses.
pub type Message = String;

/// API error which can be converted into an HTTP response.
#[derive(Debug)]
pub enum Error {
    /// Client error, including soft order rejections. Returns 400.
    BadRequest(Code, Message),
    /// Validation error containing field-level errors. Returns 400 with structured payload.
    Validation(ValidationErrors),
}

/// Convert book-level rejections into API errors.
///
/// Every rejection is soft: the book is untouched, so the client can simply
/// correct and resubmit.
impl From<book::Error> for Error {
    fn from(value: book::Error) -> Self {
        let code = match value {
            book::Error::DuplicateOrderId(_) => "ORDER_ALREADY_EXISTS",
            book::Error::ZeroQuantity(_) => "ZERO_QUANTITY",
            book::Error::NoOppositeLiquidity(_) => "NO_OPPOSITE_LIQUIDITY",
            book::Error::CannotMatch(_) => "CANNOT_MATCH_IMMEDIATELY",
            book::Error::CannotFullyFill(_) => "CANNOT_FILL_COMPLETELY",
        };
        Error::BadRequest(code.into(), value.to_string())
    }
}

impl IntoResponse for Error {
    /// Convert Error into an Axum Response with JSON body of shape:
    /// { "error": { "code": <code>, "message"?: <message>, "errors"?: <validation> } }
    fn into_response(self) -> Response {
        match self {
            Error::BadRequest(code, message) => {
                let body = Json(serde_json::json!({
                    "error": { "code": code, "message": message }
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
            Error::Validation(validation_errors) => {
                let body = Json(serde_json::json!({
                    "error": { "code": "VALIDATION_ERROR", "errors": validation_errors }
                }));
                (StatusCode::BAD_REQUEST, body).into_response()
            }
        }
    }
}
