use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use brewpos_core::{
    CupSize, InventoryItemId, MenuItemId, OrderId, ReservationId, StockError, StockResult,
    StoreError,
};

/// One line of an order as submitted by the ordering flow.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderLine {
    pub menu_item_id: MenuItemId,
    pub size: CupSize,
    pub quantity: i64,
}

/// Quantity of one inventory item held by a reservation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hold {
    pub item_id: InventoryItemId,
    pub quantity: i64,
}

/// Reservation lifecycle. `Active` is the only non-terminal state.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReservationStatus {
    /// Holding stock; counts toward each item's held quantity.
    Active,
    /// Holds were converted into permanent deductions.
    Committed,
    /// Holds were returned to free stock by the caller.
    Released,
    /// Holds were returned to free stock by the TTL sweep.
    Expired,
}

impl ReservationStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ReservationStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationStatus::Active => "active",
            ReservationStatus::Committed => "committed",
            ReservationStatus::Released => "released",
            ReservationStatus::Expired => "expired",
        }
    }
}

impl core::fmt::Display for ReservationStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A short-lived claim on stock for one in-flight order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reservation {
    pub id: ReservationId,
    pub order_id: OrderId,
    /// One hold per item, sorted by item id. Empty when every order line is
    /// untracked.
    pub holds: Vec<Hold>,
    pub status: ReservationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    /// When the reservation left `Active`.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Reservation {
    pub fn new(order_id: OrderId, holds: Vec<Hold>, created_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            id: ReservationId::new(),
            order_id,
            holds,
            status: ReservationStatus::Active,
            created_at,
            expires_at: created_at + ttl,
            closed_at: None,
        }
    }

    /// Still Active but past its TTL, so due for expiry.
    pub fn is_past_expiry(&self, now: DateTime<Utc>) -> bool {
        self.status == ReservationStatus::Active && now >= self.expires_at
    }

    fn ensure_active(&self, action: &str) -> StockResult<()> {
        if self.status != ReservationStatus::Active {
            return Err(StockError::invalid_state(format!(
                "cannot {action} a {} reservation",
                self.status
            )));
        }
        Ok(())
    }

    pub fn mark_committed(&mut self, now: DateTime<Utc>) -> StockResult<()> {
        self.ensure_active("commit")?;
        self.status = ReservationStatus::Committed;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn mark_released(&mut self, now: DateTime<Utc>) -> StockResult<()> {
        self.ensure_active("release")?;
        self.status = ReservationStatus::Released;
        self.closed_at = Some(now);
        Ok(())
    }

    pub fn mark_expired(&mut self, now: DateTime<Utc>) -> StockResult<()> {
        self.ensure_active("expire")?;
        self.status = ReservationStatus::Expired;
        self.closed_at = Some(now);
        Ok(())
    }
}

/// Reservation persistence boundary.
pub trait ReservationStore: Send + Sync {
    fn get(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError>;
    fn upsert(&self, reservation: Reservation) -> Result<(), StoreError>;
    /// The Active reservation for an order, if any. At most one exists.
    fn active_for_order(&self, order_id: OrderId) -> Result<Option<Reservation>, StoreError>;
    fn list(&self) -> Result<Vec<Reservation>, StoreError>;
    /// Active reservations whose expiry is at or before `now`.
    fn due_for_expiry(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>, StoreError>;
}

impl<S> ReservationStore for Arc<S>
where
    S: ReservationStore + ?Sized,
{
    fn get(&self, id: ReservationId) -> Result<Option<Reservation>, StoreError> {
        (**self).get(id)
    }

    fn upsert(&self, reservation: Reservation) -> Result<(), StoreError> {
        (**self).upsert(reservation)
    }

    fn active_for_order(&self, order_id: OrderId) -> Result<Option<Reservation>, StoreError> {
        (**self).active_for_order(order_id)
    }

    fn list(&self) -> Result<Vec<Reservation>, StoreError> {
        (**self).list()
    }

    fn due_for_expiry(&self, now: DateTime<Utc>) -> Result<Vec<Reservation>, StoreError> {
        (**self).due_for_expiry(now)
    }
}
