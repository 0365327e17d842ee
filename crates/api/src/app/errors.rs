use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use brewpos_core::StockError;

/// Maps a domain error onto the HTTP error envelope.
///
/// `RecipeNotFound` never reaches clients from the order flow (lines without
/// a recipe are treated as untracked), so seeing it here means a direct
/// recipe lookup missed.
pub fn stock_error_to_response(err: StockError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        StockError::InsufficientStock { .. } => {
            json_error(StatusCode::CONFLICT, "insufficient_stock", message)
        }
        StockError::RecipeNotFound { .. } => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StockError::ReservationNotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StockError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
        StockError::InvalidState(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_state", message)
        }
        StockError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        StockError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        StockError::Unavailable(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "unavailable", message)
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
