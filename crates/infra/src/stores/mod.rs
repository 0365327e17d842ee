//! In-memory store backends.
//!
//! One `RwLock<HashMap>` per resource. All stores hand out clones, so a
//! caller never observes another request's half-finished mutation. A
//! poisoned lock surfaces as `StoreError::Unavailable` rather than a panic.

mod menu;
mod reservations;
mod stock;

pub use menu::{InMemoryMenuStore, InMemoryRecipeStore};
pub use reservations::InMemoryReservationStore;
pub use stock::InMemoryStockStore;

use brewpos_core::StoreError;

fn poisoned(what: &str) -> StoreError {
    StoreError::unavailable(format!("{what} lock poisoned"))
}
