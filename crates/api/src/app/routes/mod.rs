use axum::Router;

pub mod inventory;
pub mod menu;
pub mod reservations;
pub mod system;

/// Router for all storefront and back-office endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/menu", menu::router())
        .nest("/inventory", inventory::router())
}
