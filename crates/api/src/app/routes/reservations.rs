use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use brewpos_core::{OrderId, ReservationId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_reservation))
        .route("/:id", get(get_reservation))
        .route("/:id/commit", post(commit_reservation))
        .route("/:id/release", post(release_reservation))
}

pub async fn create_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateReservationRequest>,
) -> axum::response::Response {
    let order_id: OrderId = match body.order_id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id");
        }
    };

    let lines = match dto::order_lines_from(&body.lines) {
        Ok(lines) => lines,
        Err(response) => return response,
    };

    match services.manager.reserve(order_id, &lines) {
        Ok(reservation) => (
            StatusCode::CREATED,
            Json(dto::reservation_to_json(&reservation)),
        )
            .into_response(),
        Err(err) => errors::stock_error_to_response(err),
    }
}

pub async fn get_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let reservation_id: ReservationId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid reservation id",
            );
        }
    };

    match services.manager.get(reservation_id) {
        Ok(reservation) => {
            (StatusCode::OK, Json(dto::reservation_to_json(&reservation))).into_response()
        }
        Err(err) => errors::stock_error_to_response(err),
    }
}

pub async fn commit_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let reservation_id: ReservationId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid reservation id",
            );
        }
    };

    match services.manager.commit(reservation_id) {
        Ok(reservation) => {
            (StatusCode::OK, Json(dto::reservation_to_json(&reservation))).into_response()
        }
        Err(err) => errors::stock_error_to_response(err),
    }
}

pub async fn release_reservation(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let reservation_id: ReservationId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid reservation id",
            );
        }
    };

    match services.manager.release(reservation_id) {
        Ok(reservation) => {
            (StatusCode::OK, Json(dto::reservation_to_json(&reservation))).into_response()
        }
        Err(err) => errors::stock_error_to_response(err),
    }
}
