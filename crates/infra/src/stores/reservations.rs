use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};

use brewpos_core::{OrderId, ReservationId, StoreError};
use brewpos_inventory::{Reservation, ReservationStatus, ReservationStore};

use super::poisoned;

#[derive(Debug, Default)]
pub struct InMemoryReservationStore {
    reservations: RwLock<HashMap<ReservationId, Reservation>>,
}

impl InMemoryReservationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ReservationStore for InMemoryReservationStore {
    fn get(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        let map = self
            .reservations
            .read()
            .map_err(|_| poisoned("reservations"))?;
        Ok(map.get(&id).cloned())
    }

    fn upsert(&self, reservation: Reservation) -> Result<(), StoreError> {
        let mut map = self
            .reservations
            .write()
            .map_err(|_| poisoned("reservations"))?;
        map.insert(reservation.id, reservation);
        Ok(())
    }

    fn active_for_order(&self, order_id: OrderId) -> Result<Option<Reservation>, StoreError> {
        let map = self
            .reservations
            .read()
            .map_err(|_| poisoned("reservations"))?;
        Ok(map
            .values()
            .find(|r| r.order_id == order_id && r.status == ReservationStatus::Active)
            .cloned())
    }

    fn list(&self) -> Result<Vec<Reservation>, StoreError> {
        let map = self
            .reservations
            .read()
            .map_err(|_| poisoned("reservations"))?;
        Ok(map.values().cloned().collect())
    }

    fn due_for_expiry(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>, StoreError> {
        let map = self
            .reservations
            .read()
            .map_err(|_| poisoned("reservations"))?;
        Ok(map
            .values()
            .filter(|r| r.is_past_expiry(now))
            .cloned()
            .collect())
    }
}
