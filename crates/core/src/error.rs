//! Domain error model.

use thiserror::Error;

use crate::id::{InventoryItemId, MenuItemId};
use crate::size::CupSize;

/// Result type used across the domain layer.
pub type StockResult<T> = Result<T, StockError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// invariants, state machine violations). `Unavailable` is the one transient
/// kind; it means the persistence boundary failed and the operation left no
/// partial mutation behind.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StockError {
    /// A requested quantity exceeds free stock. Retrying does not help until
    /// stock changes.
    #[error("insufficient stock for item {item_id}: requested {requested}, available {available}")]
    InsufficientStock {
        item_id: InventoryItemId,
        requested: i64,
        available: i64,
    },

    /// No recipe exists for a (menu item, size) pair. Callers in the order
    /// flow treat the item as untracked rather than failing.
    #[error("no recipe for menu item {menu_item_id} at size {size}")]
    RecipeNotFound {
        menu_item_id: MenuItemId,
        size: CupSize,
    },

    /// A reservation id did not match any reservation.
    #[error("reservation not found")]
    ReservationNotFound,

    /// A requested resource was not found (item, menu item, recipe lookup).
    #[error("not found")]
    NotFound,

    /// An operation was applied in a state that forbids it (e.g. committing
    /// a released reservation).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The persistence boundary was unreachable. Transient; safe to retry
    /// with backoff.
    #[error("persistence unavailable: {0}")]
    Unavailable(String),
}

impl StockError {
    pub fn insufficient_stock(item_id: InventoryItemId, requested: i64, available: i64) -> Self {
        Self::InsufficientStock {
            item_id,
            requested,
            available,
        }
    }

    pub fn recipe_not_found(menu_item_id: MenuItemId, size: CupSize) -> Self {
        Self::RecipeNotFound { menu_item_id, size }
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

/// Error from the persistence boundary.
///
/// Stores expose single-record atomic reads and writes; anything that stops
/// them from doing so (backend down, poisoned state) surfaces here.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }
}

impl From<StoreError> for StockError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => StockError::Unavailable(msg),
        }
    }
}
