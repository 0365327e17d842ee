use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use brewpos_core::{
    Clock, LockTable, OrderId, ReservationId, StockError, StockResult, lock_all,
};
use brewpos_menu::{RecipeResolver, RecipeStore, merge_requirements};

use crate::ledger::{StockLedger, StockStore};
use crate::reservation::{Hold, OrderLine, Reservation, ReservationStatus, ReservationStore};

const DEFAULT_TTL_SECS: i64 = 900;

/// Orchestrates the reservation lifecycle against the ledger.
///
/// Lifecycle operations serialize per order through `order_locks`, which
/// enforces at most one Active reservation per order and keeps status
/// read-check-writes atomic. The order lock is always taken before any item
/// lock; `expire_locked` runs with the order lock already held and must not
/// take it again.
pub struct ReservationManager<S, V, R> {
    ledger: Arc<StockLedger<S>>,
    reservations: V,
    resolver: RecipeResolver<R>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
    order_locks: LockTable<OrderId>,
}

impl<S, V, R> ReservationManager<S, V, R>
where
    S: StockStore,
    V: ReservationStore,
    R: RecipeStore,
{
    pub fn new(
        ledger: Arc<StockLedger<S>>,
        reservations: V,
        resolver: RecipeResolver<R>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            ledger,
            reservations,
            resolver,
            clock,
            ttl: Duration::seconds(DEFAULT_TTL_SECS),
            order_locks: LockTable::new(),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Place holds for an order's lines, all-or-nothing.
    ///
    /// Lines without a recipe contribute no holds but the reservation is
    /// still created. A leftover Active reservation past its TTL is expired
    /// here rather than blocking the order.
    pub fn reserve(&self, order_id: OrderId, lines: &[OrderLine]) -> StockResult<Reservation> {
        if lines.is_empty() {
            return Err(StockError::validation("reservation needs at least one line"));
        }

        let order_handle = self.order_locks.handle(order_id);
        let _order_guard = lock_all(core::slice::from_ref(&order_handle));

        let now = self.clock.now();
        if let Some(existing) = self.reservations.active_for_order(order_id)? {
            if existing.is_past_expiry(now) {
                self.expire_locked(existing, now)?;
            } else {
                return Err(StockError::invalid_state(format!(
                    "order {order_id} already has an active reservation"
                )));
            }
        }

        let mut requirements = Vec::new();
        for line in lines {
            match self
                .resolver
                .resolve(line.menu_item_id, line.size, line.quantity)
            {
                Ok(reqs) => requirements.extend(reqs),
                Err(StockError::RecipeNotFound { .. }) => {
                    tracing::debug!(
                        menu_item = %line.menu_item_id,
                        size = %line.size,
                        "no recipe; line holds no stock"
                    );
                }
                Err(err) => return Err(err),
            }
        }
        let holds: Vec<Hold> = merge_requirements(requirements)?
            .into_iter()
            .map(|req| Hold {
                item_id: req.item_id,
                quantity: req.quantity,
            })
            .collect();

        self.ledger.claim(&holds)?;

        let reservation = Reservation::new(order_id, holds, now, self.ttl);
        if let Err(err) = self.reservations.upsert(reservation.clone()) {
            if let Err(undo_err) = self.ledger.release_holds(&reservation.holds) {
                tracing::error!(
                    reservation = %reservation.id,
                    error = %undo_err,
                    "failed to free holds after reservation write failure"
                );
            }
            return Err(err.into());
        }

        tracing::info!(
            reservation = %reservation.id,
            order = %order_id,
            holds = reservation.holds.len(),
            "reservation placed"
        );
        Ok(reservation)
    }

    /// Turn held stock into a permanent deduction.
    ///
    /// A reservation sitting past its TTL is expired on the spot and the
    /// commit is rejected, matching what the sweep would have done moments
    /// later.
    pub fn commit(&self, reservation_id: ReservationId) -> StockResult<Reservation> {
        let found = self.fetch(reservation_id)?;

        let order_handle = self.order_locks.handle(found.order_id);
        let _order_guard = lock_all(core::slice::from_ref(&order_handle));

        // Re-read: the status may have moved while we waited for the lock.
        let mut reservation = self.fetch(reservation_id)?;
        let now = self.clock.now();
        if reservation.is_past_expiry(now) {
            self.expire_locked(reservation, now)?;
            return Err(StockError::invalid_state(format!(
                "reservation {reservation_id} has expired"
            )));
        }

        let active_copy = reservation.clone();
        reservation.mark_committed(now)?;
        self.reservations.upsert(reservation.clone())?;

        if let Err(err) =
            self.ledger
                .settle(&reservation.holds, reservation.id, reservation.order_id, now)
        {
            // Put the Active record back so the holds stay accounted for.
            if let Err(undo_err) = self.reservations.upsert(active_copy) {
                tracing::error!(
                    reservation = %reservation_id,
                    error = %undo_err,
                    "failed to restore reservation after settle failure"
                );
            }
            return Err(err);
        }

        tracing::info!(
            reservation = %reservation_id,
            order = %reservation.order_id,
            "reservation committed"
        );
        Ok(reservation)
    }

    /// Free an order's holds.
    ///
    /// Releasing an already Released or Expired reservation is a no-op and
    /// returns the reservation as stored. Releasing a Committed one fails:
    /// sold stock does not come back.
    pub fn release(&self, reservation_id: ReservationId) -> StockResult<Reservation> {
        let found = self.fetch(reservation_id)?;

        let order_handle = self.order_locks.handle(found.order_id);
        let _order_guard = lock_all(core::slice::from_ref(&order_handle));

        let mut reservation = self.fetch(reservation_id)?;
        if matches!(
            reservation.status,
            ReservationStatus::Released | ReservationStatus::Expired
        ) {
            tracing::debug!(
                reservation = %reservation_id,
                status = %reservation.status,
                "release is a no-op"
            );
            return Ok(reservation);
        }

        let now = self.clock.now();
        let active_copy = reservation.clone();
        reservation.mark_released(now)?;
        self.reservations.upsert(reservation.clone())?;

        if let Err(err) = self.ledger.release_holds(&reservation.holds) {
            if let Err(undo_err) = self.reservations.upsert(active_copy) {
                tracing::error!(
                    reservation = %reservation_id,
                    error = %undo_err,
                    "failed to restore reservation after hold release failure"
                );
            }
            return Err(err);
        }

        tracing::info!(
            reservation = %reservation_id,
            order = %reservation.order_id,
            "reservation released"
        );
        Ok(reservation)
    }

    pub fn get(&self, reservation_id: ReservationId) -> StockResult<Reservation> {
        self.fetch(reservation_id)
    }

    /// All reservations, oldest first (UUIDv7 ids are time-ordered).
    pub fn list(&self) -> StockResult<Vec<Reservation>> {
        let mut all = self.reservations.list()?;
        all.sort_by_key(|r| *r.id.as_uuid().as_bytes());
        Ok(all)
    }

    /// Expire every Active reservation past its TTL, returning how many
    /// were expired. Failures are logged per reservation and do not stop
    /// the pass.
    pub fn expire_due(&self, now: DateTime<Utc>) -> StockResult<usize> {
        let due = self.reservations.due_for_expiry(now)?;
        let mut expired = 0;
        for candidate in due {
            match self.expire_one(candidate.id, now) {
                Ok(true) => expired += 1,
                Ok(false) => {}
                Err(err) => {
                    tracing::error!(
                        reservation = %candidate.id,
                        error = %err,
                        "failed to expire reservation"
                    );
                }
            }
        }
        Ok(expired)
    }

    fn expire_one(&self, reservation_id: ReservationId, now: DateTime<Utc>) -> StockResult<bool> {
        let found = match self.reservations.get(reservation_id)? {
            Some(found) => found,
            None => return Ok(false),
        };

        let order_handle = self.order_locks.handle(found.order_id);
        let _order_guard = lock_all(core::slice::from_ref(&order_handle));

        // A racing commit or release may have beaten us to the lock.
        let reservation = match self.reservations.get(reservation_id)? {
            Some(reservation) => reservation,
            None => return Ok(false),
        };
        if !reservation.is_past_expiry(now) {
            return Ok(false);
        }
        self.expire_locked(reservation, now)?;
        Ok(true)
    }

    /// Transition to Expired and free the holds. The caller holds the order
    /// lock and has checked `is_past_expiry`.
    fn expire_locked(&self, mut reservation: Reservation, now: DateTime<Utc>) -> StockResult<()> {
        let active_copy = reservation.clone();
        reservation.mark_expired(now)?;
        self.reservations.upsert(reservation.clone())?;

        if let Err(err) = self.ledger.release_holds(&reservation.holds) {
            if let Err(undo_err) = self.reservations.upsert(active_copy) {
                tracing::error!(
                    reservation = %reservation.id,
                    error = %undo_err,
                    "failed to restore reservation after hold release failure"
                );
            }
            return Err(err);
        }

        tracing::info!(
            reservation = %reservation.id,
            order = %reservation.order_id,
            "reservation expired"
        );
        Ok(())
    }

    fn fetch(&self, reservation_id: ReservationId) -> StockResult<Reservation> {
        self.reservations
            .get(reservation_id)?
            .ok_or(StockError::ReservationNotFound)
    }
}
