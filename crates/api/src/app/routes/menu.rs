use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use brewpos_core::{InventoryItemId, MenuItemId};
use brewpos_menu::{MenuItem, MenuStore, Recipe, RecipeLine, RecipeStore};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/items", get(list_items).post(create_item))
        .route("/items/:id/recipe", post(set_recipe))
        .route("/check-availability", post(check_availability))
}

/// Lists the catalog with the sizes each item has a recipe for.
///
/// The response body is cached as one snapshot; create/recipe mutations
/// invalidate it, so a cache hit is never staler than the last mutation
/// through this process.
pub async fn list_items(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    if let Some(snapshot) = services.menu_cache.get() {
        return (StatusCode::OK, Json((*snapshot).clone())).into_response();
    }

    let mut items = match services.menu.list() {
        Ok(items) => items,
        Err(err) => return errors::stock_error_to_response(err.into()),
    };
    items.sort_by_key(|item| *item.id.as_uuid().as_bytes());

    let mut entries = Vec::with_capacity(items.len());
    for item in &items {
        let recipes = match services.recipes.list_for_item(item.id) {
            Ok(recipes) => recipes,
            Err(err) => return errors::stock_error_to_response(err.into()),
        };
        let mut sizes: Vec<&'static str> = recipes.iter().map(|r| r.size.as_str()).collect();
        sizes.sort_unstable();
        entries.push(dto::menu_item_to_json(item, &sizes));
    }

    let body = serde_json::json!({
        "items": entries,
        "count": entries.len(),
    });
    let snapshot = services.menu_cache.put(body);
    (StatusCode::OK, Json((*snapshot).clone())).into_response()
}

pub async fn create_item(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CreateMenuItemRequest>,
) -> axum::response::Response {
    let mut item = match MenuItem::new(body.name, body.price_cents, Utc::now()) {
        Ok(item) => item,
        Err(err) => return errors::stock_error_to_response(err),
    };
    if let Some(active) = body.active {
        item.active = active;
    }

    if let Err(err) = services.menu.upsert(item.clone()) {
        return errors::stock_error_to_response(err.into());
    }
    services.menu_cache.invalidate();

    (StatusCode::CREATED, Json(dto::menu_item_to_json(&item, &[]))).into_response()
}

/// Creates or replaces the recipe for one (menu item, size) pair.
pub async fn set_recipe(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Json(body): Json<dto::SetRecipeRequest>,
) -> axum::response::Response {
    let menu_item_id: MenuItemId = match id.parse() {
        Ok(v) => v,
        Err(_) => {
            return errors::json_error(
                StatusCode::BAD_REQUEST,
                "invalid_id",
                "invalid menu item id",
            );
        }
    };

    match services.menu.get(menu_item_id) {
        Ok(Some(_)) => {}
        Ok(None) => {
            return errors::json_error(StatusCode::NOT_FOUND, "not_found", "menu item not found");
        }
        Err(err) => return errors::stock_error_to_response(err.into()),
    }

    let mut lines = Vec::with_capacity(body.lines.len());
    for line in &body.lines {
        let inventory_item_id: InventoryItemId = match line.inventory_item_id.parse() {
            Ok(v) => v,
            Err(_) => {
                return errors::json_error(
                    StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid inventory item id",
                );
            }
        };
        lines.push(RecipeLine {
            inventory_item_id,
            quantity: line.quantity,
            tolerance: line.tolerance,
        });
    }

    let recipe = match Recipe::new(menu_item_id, body.size.unwrap_or_default(), lines, Utc::now()) {
        Ok(recipe) => recipe,
        Err(err) => return errors::stock_error_to_response(err),
    };

    if let Err(err) = services.recipes.upsert(recipe.clone()) {
        return errors::stock_error_to_response(err.into());
    }
    services.menu_cache.invalidate();

    (StatusCode::OK, Json(dto::recipe_to_json(&recipe))).into_response()
}

/// Advisory availability projection for a prospective order.
pub async fn check_availability(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::CheckAvailabilityRequest>,
) -> axum::response::Response {
    let lines = match dto::order_lines_from(&body.lines) {
        Ok(lines) => lines,
        Err(response) => return response,
    };

    match services.checker.check(&lines) {
        Ok(report) => (StatusCode::OK, Json(dto::availability_to_json(&report))).into_response(),
        Err(err) => errors::stock_error_to_response(err),
    }
}
