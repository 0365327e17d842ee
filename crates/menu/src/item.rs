use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brewpos_core::{MenuItemId, StockError, StockResult, StoreError};

/// A sellable menu item.
///
/// Pricing lives here; what the item consumes lives in its recipes. An item
/// without recipes is untracked and never blocks an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    pub name: String,
    /// Price in the smallest currency unit (cents).
    pub price_cents: u64,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl MenuItem {
    pub fn new(
        name: impl Into<String>,
        price_cents: u64,
        now: DateTime<Utc>,
    ) -> StockResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StockError::validation("name cannot be empty"));
        }
        if price_cents == 0 {
            return Err(StockError::validation("price must be positive"));
        }

        Ok(Self {
            id: MenuItemId::new(),
            name,
            price_cents,
            active: true,
            created_at: now,
        })
    }

    /// Check if the item can be sold (inactive items are hidden from ordering).
    pub fn can_be_sold(&self) -> bool {
        self.active
    }
}

/// Menu catalog persistence boundary.
pub trait MenuStore: Send + Sync {
    fn get(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError>;
    fn upsert(&self, item: MenuItem) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<MenuItem>, StoreError>;
}

impl<S> MenuStore for Arc<S>
where
    S: MenuStore + ?Sized,
{
    fn get(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError> {
        (**self).get(id)
    }

    fn upsert(&self, item: MenuItem) -> Result<(), StoreError> {
        (**self).upsert(item)
    }

    fn list(&self) -> Result<Vec<MenuItem>, StoreError> {
        (**self).list()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_menu_item_starts_active() {
        let item = MenuItem::new("Flat White", 450, Utc::now()).unwrap();
        assert!(item.active);
        assert!(item.can_be_sold());
        assert_eq!(item.price_cents, 450);
    }

    #[test]
    fn rejects_empty_name() {
        let err = MenuItem::new("   ", 450, Utc::now()).unwrap_err();
        match err {
            StockError::Validation(msg) if msg.contains("name") => {}
            _ => panic!("Expected Validation error for empty name"),
        }
    }

    #[test]
    fn rejects_zero_price() {
        let err = MenuItem::new("Flat White", 0, Utc::now()).unwrap_err();
        match err {
            StockError::Validation(msg) if msg.contains("price") => {}
            _ => panic!("Expected Validation error for zero price"),
        }
    }
}
