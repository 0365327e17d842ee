use std::collections::HashMap;
use std::sync::RwLock;

use brewpos_core::{InventoryItemId, StoreError};
use brewpos_inventory::{StockMovement, StockRecord, StockStore};

use super::poisoned;

/// In-memory stock records plus the append-only movement journal.
#[derive(Debug, Default)]
pub struct InMemoryStockStore {
    records: RwLock<HashMap<InventoryItemId, StockRecord>>,
    movements: RwLock<Vec<StockMovement>>,
}

impl InMemoryStockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StockStore for InMemoryStockStore {
    fn get(&self, item_id: InventoryItemId) -> Result<Option<StockRecord>, StoreError> {
        let map = self.records.read().map_err(|_| poisoned("stock records"))?;
        Ok(map.get(&item_id).cloned())
    }

    fn upsert(&self, record: StockRecord) -> Result<(), StoreError> {
        let mut map = self.records.write().map_err(|_| poisoned("stock records"))?;
        map.insert(record.item.id, record);
        Ok(())
    }

    fn list(&self) -> Result<Vec<StockRecord>, StoreError> {
        let map = self.records.read().map_err(|_| poisoned("stock records"))?;
        Ok(map.values().cloned().collect())
    }

    fn append_movement(&self, movement: StockMovement) -> Result<(), StoreError> {
        let mut journal = self
            .movements
            .write()
            .map_err(|_| poisoned("movement journal"))?;
        journal.push(movement);
        Ok(())
    }

    fn movements(&self) -> Result<Vec<StockMovement>, StoreError> {
        let journal = self
            .movements
            .read()
            .map_err(|_| poisoned("movement journal"))?;
        Ok(journal.clone())
    }
}
