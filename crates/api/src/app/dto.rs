use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Value, json};

use brewpos_core::{CupSize, MenuItemId};
use brewpos_inventory::{
    AvailabilityReport, OrderLine, Reservation, StockLevels, StockRecord, UnitOfMeasure,
};
use brewpos_menu::{MenuItem, Recipe};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateMenuItemRequest {
    pub name: String,
    pub price_cents: u64,
    #[serde(default)]
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct SetRecipeRequest {
    #[serde(default)]
    pub size: Option<CupSize>,
    pub lines: Vec<RecipeLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeLineRequest {
    pub inventory_item_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub tolerance: i64,
}

#[derive(Debug, Deserialize)]
pub struct CreateInventoryItemRequest {
    pub name: String,
    pub unit: UnitOfMeasure,
    pub minimum_stock: i64,
    #[serde(default)]
    pub initial_stock: i64,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub menu_item_id: String,
    #[serde(default)]
    pub size: Option<CupSize>,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct CheckAvailabilityRequest {
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub order_id: String,
    pub lines: Vec<OrderLineRequest>,
}

/// Parses order line DTOs into domain lines.
///
/// Ids arrive as strings so a malformed uuid maps to the `invalid_id`
/// envelope instead of a serde rejection. A missing size means `Regular`.
pub fn order_lines_from(
    requests: &[OrderLineRequest],
) -> Result<Vec<OrderLine>, axum::response::Response> {
    let mut lines = Vec::with_capacity(requests.len());
    for request in requests {
        let menu_item_id: MenuItemId = match request.menu_item_id.parse() {
            Ok(id) => id,
            Err(_) => {
                return Err(errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid menu item id",
                ));
            }
        };
        lines.push(OrderLine {
            menu_item_id,
            size: request.size.unwrap_or_default(),
            quantity: request.quantity,
        });
    }
    Ok(lines)
}

// -------------------------
// Response mapping
// -------------------------

pub fn menu_item_to_json(item: &MenuItem, recipe_sizes: &[&'static str]) -> Value {
    json!({
        "id": item.id.to_string(),
        "name": item.name,
        "price_cents": item.price_cents,
        "active": item.active,
        "recipe_sizes": recipe_sizes,
        "created_at": item.created_at,
    })
}

pub fn recipe_to_json(recipe: &Recipe) -> Value {
    json!({
        "menu_item_id": recipe.menu_item_id.to_string(),
        "size": recipe.size.as_str(),
        "lines": recipe
            .lines
            .iter()
            .map(|line| {
                json!({
                    "inventory_item_id": line.inventory_item_id.to_string(),
                    "quantity": line.quantity,
                    "tolerance": line.tolerance,
                })
            })
            .collect::<Vec<_>>(),
        "updated_at": recipe.updated_at,
    })
}

pub fn stock_record_to_json(record: &StockRecord) -> Value {
    json!({
        "id": record.item.id.to_string(),
        "name": record.item.name,
        "unit": record.item.unit.as_str(),
        "minimum_stock": record.item.minimum_stock,
        "on_hand": record.levels.on_hand,
        "held": record.levels.held,
        "free": record.levels.free(),
        "low_stock": record.is_low(),
        "created_at": record.item.created_at,
    })
}

pub fn levels_to_json(record_id: &str, levels: StockLevels) -> Value {
    json!({
        "id": record_id,
        "on_hand": levels.on_hand,
        "held": levels.held,
        "free": levels.free(),
    })
}

pub fn reservation_to_json(reservation: &Reservation) -> Value {
    json!({
        "id": reservation.id.to_string(),
        "order_id": reservation.order_id.to_string(),
        "status": reservation.status.as_str(),
        "holds": reservation
            .holds
            .iter()
            .map(|hold| {
                json!({
                    "inventory_item_id": hold.item_id.to_string(),
                    "quantity": hold.quantity,
                })
            })
            .collect::<Vec<_>>(),
        "created_at": reservation.created_at,
        "expires_at": reservation.expires_at,
        "closed_at": reservation.closed_at,
    })
}

pub fn availability_to_json(report: &AvailabilityReport) -> Value {
    json!({
        "is_available": report.is_available,
        "has_ingredient_tracking": report.has_ingredient_tracking,
        "checked_at": report.checked_at,
        "lines": report
            .lines
            .iter()
            .map(|line| {
                json!({
                    "menu_item_id": line.line.menu_item_id.to_string(),
                    "size": line.line.size.as_str(),
                    "quantity": line.line.quantity,
                    "tracked": line.tracked,
                    "available": line.available,
                    "shortages": line
                        .shortages
                        .iter()
                        .map(|shortage| {
                            json!({
                                "inventory_item_id": shortage.item_id.to_string(),
                                "required": shortage.required,
                                "free": shortage.free,
                            })
                        })
                        .collect::<Vec<_>>(),
                })
            })
            .collect::<Vec<_>>(),
    })
}
