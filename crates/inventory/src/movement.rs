use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use brewpos_core::{InventoryItemId, OrderId, ReservationId};

/// Why on-hand stock changed.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    /// Stock received or counted up (positive delta).
    Restock,
    /// Manual correction or recorded waste (negative delta).
    Adjustment,
    /// A committed reservation consumed the stock.
    CommittedSale {
        reservation_id: ReservationId,
        order_id: OrderId,
    },
}

impl MovementKind {
    pub fn kind_name(&self) -> &'static str {
        match self {
            MovementKind::Restock => "restock",
            MovementKind::Adjustment => "adjustment",
            MovementKind::CommittedSale { .. } => "committed_sale",
        }
    }
}

/// Append-only journal entry for one on-hand change.
///
/// The ledger record is authoritative; the journal feeds usage reports and
/// is never replayed into live state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: Uuid,
    pub item_id: InventoryItemId,
    /// Signed change to on-hand stock, in base units.
    pub delta: i64,
    pub kind: MovementKind,
    pub occurred_at: DateTime<Utc>,
}

impl StockMovement {
    pub fn new(
        item_id: InventoryItemId,
        delta: i64,
        kind: MovementKind,
        occurred_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            item_id,
            delta,
            kind,
            occurred_at,
        }
    }
}
