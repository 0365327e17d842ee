use std::sync::Arc;

use chrono::{DateTime, Utc};

use brewpos_core::{
    InventoryItemId, LockTable, OrderId, ReservationId, StockError, StockResult, StoreError,
    lock_all,
};

use crate::item::{InventoryItem, StockLevels, StockRecord};
use crate::movement::{MovementKind, StockMovement};
use crate::reservation::Hold;

/// Stock persistence boundary.
///
/// Implementations provide atomic single-record reads and writes; the ledger
/// serializes mutations per item, so get-then-upsert under an item lock is
/// race-free. The movement journal is append-only and advisory (reports);
/// ledger records stay authoritative.
pub trait StockStore: Send + Sync {
    fn get(&self, item_id: InventoryItemId) -> Result<Option<StockRecord>, StoreError>;
    fn upsert(&self, record: StockRecord) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<StockRecord>, StoreError>;
    fn append_movement(&self, movement: StockMovement) -> Result<(), StoreError>;
    fn movements(&self) -> Result<Vec<StockMovement>, StoreError>;
}

impl<S> StockStore for Arc<S>
where
    S: StockStore + ?Sized,
{
    fn get(&self, item_id: InventoryItemId) -> Result<Option<StockRecord>, StoreError> {
        (**self).get(item_id)
    }

    fn upsert(&self, record: StockRecord) -> Result<(), StoreError> {
        (**self).upsert(record)
    }

    fn list(&self) -> Result<Vec<StockRecord>, StoreError> {
        (**self).list()
    }

    fn append_movement(&self, movement: StockMovement) -> Result<(), StoreError> {
        (**self).append_movement(movement)
    }

    fn movements(&self) -> Result<Vec<StockMovement>, StoreError> {
        (**self).movements()
    }
}

/// Per-item quantity tracking.
///
/// Every stock mutation passes through the ledger under that item's lock;
/// multi-item operations take all affected locks in canonical order, so
/// overlapping claims serialize without a global lock and can never
/// deadlock. Reads are lock-free and may observe a slightly stale view.
#[derive(Debug)]
pub struct StockLedger<S> {
    store: S,
    locks: LockTable<InventoryItemId>,
}

impl<S: StockStore> StockLedger<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            locks: LockTable::new(),
        }
    }

    /// Register a new item with its opening stock.
    pub fn create_item(
        &self,
        item: InventoryItem,
        initial_stock: i64,
        now: DateTime<Utc>,
    ) -> StockResult<StockRecord> {
        if initial_stock < 0 {
            return Err(StockError::validation("initial stock cannot be negative"));
        }

        let handle = self.locks.handle(item.id);
        let _guards = lock_all(core::slice::from_ref(&handle));

        if self.store.get(item.id)?.is_some() {
            return Err(StockError::invalid_state(format!(
                "item {} already exists",
                item.id
            )));
        }

        let record = StockRecord {
            item,
            levels: StockLevels {
                on_hand: initial_stock,
                held: 0,
            },
        };
        self.store.upsert(record.clone())?;
        if initial_stock > 0 {
            self.journal(StockMovement::new(
                record.item.id,
                initial_stock,
                MovementKind::Restock,
                now,
            ));
        }
        Ok(record)
    }

    /// Current on-hand quantity.
    pub fn get_stock(&self, item_id: InventoryItemId) -> StockResult<i64> {
        Ok(self.record(item_id)?.levels.on_hand)
    }

    pub fn levels(&self, item_id: InventoryItemId) -> StockResult<StockLevels> {
        Ok(self.record(item_id)?.levels)
    }

    pub fn record(&self, item_id: InventoryItemId) -> StockResult<StockRecord> {
        self.store.get(item_id)?.ok_or(StockError::NotFound)
    }

    /// All records, oldest item first (UUIDv7 ids are time-ordered).
    pub fn list(&self) -> StockResult<Vec<StockRecord>> {
        let mut records = self.store.list()?;
        records.sort_by_key(|r| *r.item.id.as_uuid().as_bytes());
        Ok(records)
    }

    pub fn movements(&self) -> StockResult<Vec<StockMovement>> {
        Ok(self.store.movements()?)
    }

    /// Manual restock, correction or waste.
    ///
    /// A negative delta may not eat into quantities promised to Active
    /// reservations: the resulting free stock must stay non-negative.
    pub fn adjust(
        &self,
        item_id: InventoryItemId,
        delta: i64,
        now: DateTime<Utc>,
    ) -> StockResult<StockLevels> {
        if delta == 0 {
            return Err(StockError::validation("delta cannot be zero"));
        }

        let handle = self.locks.handle(item_id);
        let _guards = lock_all(core::slice::from_ref(&handle));

        let mut record = self.record(item_id)?;
        let on_hand = record
            .levels
            .on_hand
            .checked_add(delta)
            .ok_or_else(|| StockError::validation("stock quantity overflow"))?;
        if on_hand < record.levels.held {
            // saturating_neg: `requested` must not overflow for i64::MIN.
            return Err(StockError::insufficient_stock(
                item_id,
                delta.saturating_neg(),
                record.levels.free(),
            ));
        }

        record.levels.on_hand = on_hand;
        self.store.upsert(record.clone())?;

        let kind = if delta > 0 {
            MovementKind::Restock
        } else {
            MovementKind::Adjustment
        };
        self.journal(StockMovement::new(item_id, delta, kind, now));
        Ok(record.levels)
    }

    /// Atomically place holds across items: either every hold fits within
    /// free stock or nothing changes.
    ///
    /// `holds` must carry one entry per item (merged upstream). An item with
    /// no ledger record counts as zero free stock.
    pub(crate) fn claim(&self, holds: &[Hold]) -> StockResult<()> {
        if holds.is_empty() {
            return Ok(());
        }

        let handles = self.locks.handles(holds.iter().map(|h| h.item_id));
        let _guards = lock_all(&handles);

        let mut before = Vec::with_capacity(holds.len());
        let mut after = Vec::with_capacity(holds.len());
        for hold in holds {
            let record = match self.store.get(hold.item_id)? {
                Some(record) => record,
                None => {
                    return Err(StockError::insufficient_stock(hold.item_id, hold.quantity, 0));
                }
            };
            if record.levels.free() < hold.quantity {
                return Err(StockError::insufficient_stock(
                    hold.item_id,
                    hold.quantity,
                    record.levels.free(),
                ));
            }
            let mut updated = record.clone();
            updated.levels.held += hold.quantity;
            before.push(record);
            after.push(updated);
        }

        self.upsert_all_or_rollback(&before, after)
    }

    /// Convert holds into permanent deductions, journalled as committed
    /// sales.
    pub(crate) fn settle(
        &self,
        holds: &[Hold],
        reservation_id: ReservationId,
        order_id: OrderId,
        now: DateTime<Utc>,
    ) -> StockResult<()> {
        if holds.is_empty() {
            return Ok(());
        }

        let handles = self.locks.handles(holds.iter().map(|h| h.item_id));
        let _guards = lock_all(&handles);

        let mut before = Vec::with_capacity(holds.len());
        let mut after = Vec::with_capacity(holds.len());
        for hold in holds {
            let record = self.record(hold.item_id)?;
            if record.levels.held < hold.quantity || record.levels.on_hand < hold.quantity {
                return Err(StockError::invalid_state(format!(
                    "ledger out of sync for item {}",
                    hold.item_id
                )));
            }
            let mut updated = record.clone();
            updated.levels.held -= hold.quantity;
            updated.levels.on_hand -= hold.quantity;
            before.push(record);
            after.push(updated);
        }

        self.upsert_all_or_rollback(&before, after)?;

        for hold in holds {
            self.journal(StockMovement::new(
                hold.item_id,
                -hold.quantity,
                MovementKind::CommittedSale {
                    reservation_id,
                    order_id,
                },
                now,
            ));
        }
        Ok(())
    }

    /// Return held quantities to free stock.
    pub(crate) fn release_holds(&self, holds: &[Hold]) -> StockResult<()> {
        if holds.is_empty() {
            return Ok(());
        }

        let handles = self.locks.handles(holds.iter().map(|h| h.item_id));
        let _guards = lock_all(&handles);

        let mut before = Vec::with_capacity(holds.len());
        let mut after = Vec::with_capacity(holds.len());
        for hold in holds {
            let record = self.record(hold.item_id)?;
            if record.levels.held < hold.quantity {
                return Err(StockError::invalid_state(format!(
                    "ledger out of sync for item {}",
                    hold.item_id
                )));
            }
            let mut updated = record.clone();
            updated.levels.held -= hold.quantity;
            before.push(record);
            after.push(updated);
        }

        self.upsert_all_or_rollback(&before, after)
    }

    /// Write every updated record; on a store failure, restore the records
    /// written so far. Callers hold all affected item locks.
    fn upsert_all_or_rollback(
        &self,
        before: &[StockRecord],
        after: Vec<StockRecord>,
    ) -> StockResult<()> {
        for (index, record) in after.into_iter().enumerate() {
            if let Err(err) = self.store.upsert(record) {
                for original in &before[..index] {
                    if let Err(undo_err) = self.store.upsert(original.clone()) {
                        tracing::error!(
                            item = %original.item.id,
                            error = %undo_err,
                            "failed to roll back stock record"
                        );
                    }
                }
                return Err(err.into());
            }
        }
        Ok(())
    }

    fn journal(&self, movement: StockMovement) {
        if let Err(err) = self.store.append_movement(movement) {
            tracing::error!(error = %err, "failed to journal stock movement");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::UnitOfMeasure;
    use std::collections::HashMap;
    use std::sync::RwLock;

    #[derive(Default)]
    struct MapStore {
        records: RwLock<HashMap<InventoryItemId, StockRecord>>,
        movements: RwLock<Vec<StockMovement>>,
    }

    impl StockStore for MapStore {
        fn get(&self, item_id: InventoryItemId) -> Result<Option<StockRecord>, StoreError> {
            let map = self
                .records
                .read()
                .map_err(|_| StoreError::unavailable("stock map poisoned"))?;
            Ok(map.get(&item_id).cloned())
        }

        fn upsert(&self, record: StockRecord) -> Result<(), StoreError> {
            let mut map = self
                .records
                .write()
                .map_err(|_| StoreError::unavailable("stock map poisoned"))?;
            map.insert(record.item.id, record);
            Ok(())
        }

        fn list(&self) -> Result<Vec<StockRecord>, StoreError> {
            let map = self
                .records
                .read()
                .map_err(|_| StoreError::unavailable("stock map poisoned"))?;
            Ok(map.values().cloned().collect())
        }

        fn append_movement(&self, movement: StockMovement) -> Result<(), StoreError> {
            let mut journal = self
                .movements
                .write()
                .map_err(|_| StoreError::unavailable("movement journal poisoned"))?;
            journal.push(movement);
            Ok(())
        }

        fn movements(&self) -> Result<Vec<StockMovement>, StoreError> {
            let journal = self
                .movements
                .read()
                .map_err(|_| StoreError::unavailable("movement journal poisoned"))?;
            Ok(journal.clone())
        }
    }

    fn test_item(name: &str) -> InventoryItem {
        InventoryItem::new(name, UnitOfMeasure::Grams, 100, Utc::now()).unwrap()
    }

    #[test]
    fn create_item_sets_opening_stock_and_journals_it() {
        let ledger = StockLedger::new(MapStore::default());
        let item = test_item("Espresso Beans");
        let item_id = item.id;

        let record = ledger.create_item(item, 5000, Utc::now()).unwrap();
        assert_eq!(record.levels.on_hand, 5000);
        assert_eq!(record.levels.held, 0);
        assert_eq!(ledger.get_stock(item_id).unwrap(), 5000);

        let movements = ledger.movements().unwrap();
        assert_eq!(movements.len(), 1);
        assert_eq!(movements[0].delta, 5000);
        assert_eq!(movements[0].kind, MovementKind::Restock);
    }

    #[test]
    fn create_item_rejects_duplicate_id() {
        let ledger = StockLedger::new(MapStore::default());
        let item = test_item("Espresso Beans");
        ledger.create_item(item.clone(), 0, Utc::now()).unwrap();

        let err = ledger.create_item(item, 0, Utc::now()).unwrap_err();
        match err {
            StockError::InvalidState(msg) if msg.contains("already exists") => {}
            _ => panic!("Expected InvalidState for duplicate item"),
        }
    }

    #[test]
    fn adjust_applies_delta_and_picks_movement_kind() {
        let ledger = StockLedger::new(MapStore::default());
        let item = test_item("Whole Milk");
        let item_id = item.id;
        ledger.create_item(item, 1000, Utc::now()).unwrap();

        let levels = ledger.adjust(item_id, 500, Utc::now()).unwrap();
        assert_eq!(levels.on_hand, 1500);
        let levels = ledger.adjust(item_id, -200, Utc::now()).unwrap();
        assert_eq!(levels.on_hand, 1300);

        let kinds: Vec<&'static str> = ledger
            .movements()
            .unwrap()
            .iter()
            .map(|m| m.kind.kind_name())
            .collect();
        assert_eq!(kinds, vec!["restock", "restock", "adjustment"]);
    }

    #[test]
    fn adjust_cannot_take_free_stock_negative() {
        let ledger = StockLedger::new(MapStore::default());
        let item = test_item("Whole Milk");
        let item_id = item.id;
        ledger.create_item(item, 1000, Utc::now()).unwrap();

        // Hold 800, leaving 200 free.
        ledger
            .claim(&[Hold {
                item_id,
                quantity: 800,
            }])
            .unwrap();

        let err = ledger.adjust(item_id, -300, Utc::now()).unwrap_err();
        match err {
            StockError::InsufficientStock {
                item_id: id,
                requested,
                available,
            } => {
                assert_eq!(id, item_id);
                assert_eq!(requested, 300);
                assert_eq!(available, 200);
            }
            _ => panic!("Expected InsufficientStock for adjustment into holds"),
        }

        // The free portion can still be taken.
        let levels = ledger.adjust(item_id, -200, Utc::now()).unwrap();
        assert_eq!(levels.on_hand, 800);
        assert_eq!(levels.free(), 0);
    }

    #[test]
    fn adjust_with_extreme_negative_delta_errors_cleanly() {
        let ledger = StockLedger::new(MapStore::default());
        let item = test_item("Espresso Beans");
        let item_id = item.id;
        ledger.create_item(item, 150, Utc::now()).unwrap();

        // i64::MIN survives parsing as a JSON delta, so the error path must
        // not negate it into an overflow.
        let err = ledger.adjust(item_id, i64::MIN, Utc::now()).unwrap_err();
        match err {
            StockError::InsufficientStock {
                item_id: id,
                requested,
                available,
            } => {
                assert_eq!(id, item_id);
                assert_eq!(requested, i64::MAX);
                assert_eq!(available, 150);
            }
            _ => panic!("Expected InsufficientStock for an unpayable write-off"),
        }
        assert_eq!(ledger.get_stock(item_id).unwrap(), 150);
    }

    #[test]
    fn adjust_unknown_item_is_not_found() {
        let ledger = StockLedger::new(MapStore::default());
        let err = ledger
            .adjust(InventoryItemId::new(), 10, Utc::now())
            .unwrap_err();
        match err {
            StockError::NotFound => {}
            _ => panic!("Expected NotFound for unknown item"),
        }
    }

    #[test]
    fn claim_is_all_or_nothing_across_items() {
        let ledger = StockLedger::new(MapStore::default());
        let beans = test_item("Espresso Beans");
        let milk = test_item("Whole Milk");
        let (beans_id, milk_id) = (beans.id, milk.id);
        ledger.create_item(beans, 100, Utc::now()).unwrap();
        ledger.create_item(milk, 50, Utc::now()).unwrap();

        let err = ledger
            .claim(&[
                Hold {
                    item_id: beans_id,
                    quantity: 80,
                },
                Hold {
                    item_id: milk_id,
                    quantity: 60,
                },
            ])
            .unwrap_err();
        match err {
            StockError::InsufficientStock {
                item_id, available, ..
            } => {
                assert_eq!(item_id, milk_id);
                assert_eq!(available, 50);
            }
            _ => panic!("Expected InsufficientStock for the short item"),
        }

        // Nothing was held on either item.
        assert_eq!(ledger.levels(beans_id).unwrap().held, 0);
        assert_eq!(ledger.levels(milk_id).unwrap().held, 0);
    }

    #[test]
    fn claim_missing_item_counts_as_zero_free() {
        let ledger = StockLedger::new(MapStore::default());
        let ghost = InventoryItemId::new();

        let err = ledger
            .claim(&[Hold {
                item_id: ghost,
                quantity: 1,
            }])
            .unwrap_err();
        match err {
            StockError::InsufficientStock {
                item_id,
                requested,
                available,
            } => {
                assert_eq!(item_id, ghost);
                assert_eq!(requested, 1);
                assert_eq!(available, 0);
            }
            _ => panic!("Expected InsufficientStock for missing item"),
        }
    }

    #[test]
    fn settle_reduces_on_hand_and_held_together() {
        let ledger = StockLedger::new(MapStore::default());
        let item = test_item("Espresso Beans");
        let item_id = item.id;
        ledger.create_item(item, 100, Utc::now()).unwrap();

        let holds = vec![Hold {
            item_id,
            quantity: 36,
        }];
        ledger.claim(&holds).unwrap();
        assert_eq!(ledger.levels(item_id).unwrap().free(), 64);

        ledger
            .settle(&holds, ReservationId::new(), OrderId::new(), Utc::now())
            .unwrap();

        let levels = ledger.levels(item_id).unwrap();
        assert_eq!(levels.on_hand, 64);
        assert_eq!(levels.held, 0);
        assert_eq!(levels.free(), 64);

        let sale = ledger
            .movements()
            .unwrap()
            .into_iter()
            .find(|m| m.kind.kind_name() == "committed_sale")
            .unwrap();
        assert_eq!(sale.delta, -36);
    }

    #[test]
    fn release_restores_free_stock_exactly() {
        let ledger = StockLedger::new(MapStore::default());
        let item = test_item("Whole Milk");
        let item_id = item.id;
        ledger.create_item(item, 1000, Utc::now()).unwrap();

        let holds = vec![Hold {
            item_id,
            quantity: 440,
        }];
        ledger.claim(&holds).unwrap();
        assert_eq!(ledger.levels(item_id).unwrap().free(), 560);

        ledger.release_holds(&holds).unwrap();
        let levels = ledger.levels(item_id).unwrap();
        assert_eq!(levels.on_hand, 1000);
        assert_eq!(levels.held, 0);
    }
}
