use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use brewpos_core::InventoryItemId;
use brewpos_inventory::{InventoryItem, build_report, low_stock_alerts};

use crate::app::routes::reservations;
use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id", get(get_item))
        .route("/items/:id/adjust", post(adjust_stock))
        .route("/alerts", get(get_alerts))
        .route("/reports", get(get_report))
        .nest("/reservations", reservations::router())
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateInventoryItemRequest>,
) -> axum::response::Response {
    let item = match InventoryItem::new(body.name, body.unit, body.minimum_stock, Utc::now()) {
        Ok(item) => item,
        Err(err) => return errors::stock_error_to_response(err),
    };

    match services
        .ledger
        .create_item(item, body.initial_stock, Utc::now())
    {
        Ok(record) => (
            StatusCode::CREATED,
            Json(dto::stock_record_to_json(&record)),
        )
            .into_response(),
        Err(err) => errors::stock_error_to_response(err),
    }
}

pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let records = match services.ledger.list() {
        Ok(records) => records,
        Err(err) => return errors::stock_error_to_response(err),
    };

    let items: Vec<_> = records.iter().map(dto::stock_record_to_json).collect();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "items": items,
            "count": items.len(),
        })),
    )
        .into_response()
}

pub async fn get_item(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let item_id: InventoryItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id");
        }
    };

    match services.ledger.record(item_id) {
        Ok(record) => (StatusCode::OK, Json(dto::stock_record_to_json(&record))).into_response(),
        Err(err) => errors::stock_error_to_response(err),
    }
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    let item_id: InventoryItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid item id");
        }
    };

    match services.ledger.adjust(item_id, body.delta, Utc::now()) {
        Ok(levels) => (StatusCode::OK, Json(dto::levels_to_json(&id, levels))).into_response(),
        Err(err) => errors::stock_error_to_response(err),
    }
}

pub async fn get_alerts(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let records = match services.ledger.list() {
        Ok(records) => records,
        Err(err) => return errors::stock_error_to_response(err),
    };

    let alerts = low_stock_alerts(&records);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "alerts": alerts,
            "count": alerts.len(),
        })),
    )
        .into_response()
}

pub async fn get_report(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let records = match services.ledger.list() {
        Ok(records) => records,
        Err(err) => return errors::stock_error_to_response(err),
    };
    let movements = match services.ledger.movements() {
        Ok(movements) => movements,
        Err(err) => return errors::stock_error_to_response(err),
    };
    let reservations = match services.manager.list() {
        Ok(reservations) => reservations,
        Err(err) => return errors::stock_error_to_response(err),
    };

    let report = build_report(&records, &movements, &reservations, Utc::now());
    (StatusCode::OK, Json(report)).into_response()
}
