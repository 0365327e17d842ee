use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brewpos_core::{InventoryItemId, StockError, StockResult};

/// Base unit for ledger quantities of one item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitOfMeasure {
    /// Weight in grams (beans, powders).
    Grams,
    /// Volume in milliliters (milk, syrups).
    Milliliters,
    /// Discrete count (cups, lids, pastries).
    Each,
}

impl UnitOfMeasure {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitOfMeasure::Grams => "grams",
            UnitOfMeasure::Milliliters => "milliliters",
            UnitOfMeasure::Each => "each",
        }
    }
}

impl core::fmt::Display for UnitOfMeasure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An ingredient tracked by the stock ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: InventoryItemId,
    pub name: String,
    pub unit: UnitOfMeasure,
    /// Low-stock alert threshold, in base units.
    pub minimum_stock: i64,
    pub created_at: DateTime<Utc>,
}

impl InventoryItem {
    pub fn new(
        name: impl Into<String>,
        unit: UnitOfMeasure,
        minimum_stock: i64,
        now: DateTime<Utc>,
    ) -> StockResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(StockError::validation("name cannot be empty"));
        }
        if minimum_stock < 0 {
            return Err(StockError::validation("minimum stock cannot be negative"));
        }

        Ok(Self {
            id: InventoryItemId::new(),
            name,
            unit,
            minimum_stock,
            created_at: now,
        })
    }
}

/// Point-in-time stock quantities for one item.
///
/// `on_hand` is physical stock; only adjustments and committed reservations
/// change it. `held` is the total promised to Active reservations.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockLevels {
    pub on_hand: i64,
    pub held: i64,
}

impl StockLevels {
    /// Stock available to new reservations.
    pub fn free(&self) -> i64 {
        self.on_hand - self.held
    }
}

/// Ledger record: an item plus its current levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockRecord {
    pub item: InventoryItem,
    pub levels: StockLevels,
}

impl StockRecord {
    pub fn item_id(&self) -> InventoryItemId {
        self.item.id
    }

    /// Free stock at or below the item's alert threshold.
    pub fn is_low(&self) -> bool {
        self.levels.free() <= self.item.minimum_stock
    }
}
