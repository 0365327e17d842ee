use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::Serialize;

use brewpos_core::InventoryItemId;

use crate::item::{StockRecord, UnitOfMeasure};
use crate::movement::{MovementKind, StockMovement};
use crate::reservation::{Reservation, ReservationStatus};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Low,
    OutOfStock,
}

/// Attention flag for an item at or under its minimum.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockAlert {
    pub item_id: InventoryItemId,
    pub name: String,
    pub unit: UnitOfMeasure,
    pub free: i64,
    pub minimum_stock: i64,
    pub severity: AlertSeverity,
}

/// One item's position plus its lifetime flows from the movement journal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReportRow {
    pub item_id: InventoryItemId,
    pub name: String,
    pub unit: UnitOfMeasure,
    pub on_hand: i64,
    pub held: i64,
    pub free: i64,
    pub minimum_stock: i64,
    pub low_stock: bool,
    /// Opening stock plus every restock and upward correction.
    pub restocked_in: i64,
    /// Stock written off by downward corrections.
    pub adjusted_out: i64,
    /// Stock consumed by committed reservations.
    pub committed_out: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize)]
pub struct ReportTotals {
    pub items: usize,
    pub low_stock_items: usize,
    pub active_reservations: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StockReport {
    pub rows: Vec<StockReportRow>,
    pub totals: ReportTotals,
    pub generated_at: DateTime<Utc>,
}

#[derive(Default)]
struct Flows {
    restocked_in: i64,
    adjusted_out: i64,
    committed_out: i64,
}

/// Assemble the usage report from current records and the movement journal.
///
/// Pure so it can run over any snapshot; callers pass whatever view they
/// read. Rows come out oldest item first.
pub fn build_report(
    records: &[StockRecord],
    movements: &[StockMovement],
    reservations: &[Reservation],
    generated_at: DateTime<Utc>,
) -> StockReport {
    let mut flows: HashMap<InventoryItemId, Flows> = HashMap::new();
    for movement in movements {
        let entry = flows.entry(movement.item_id).or_default();
        match movement.kind {
            MovementKind::Restock => entry.restocked_in += movement.delta,
            MovementKind::Adjustment => entry.adjusted_out += -movement.delta,
            MovementKind::CommittedSale { .. } => entry.committed_out += -movement.delta,
        }
    }

    let mut rows: Vec<StockReportRow> = records
        .iter()
        .map(|record| {
            let flow = flows.remove(&record.item.id).unwrap_or_default();
            StockReportRow {
                item_id: record.item.id,
                name: record.item.name.clone(),
                unit: record.item.unit,
                on_hand: record.levels.on_hand,
                held: record.levels.held,
                free: record.levels.free(),
                minimum_stock: record.item.minimum_stock,
                low_stock: record.is_low(),
                restocked_in: flow.restocked_in,
                adjusted_out: flow.adjusted_out,
                committed_out: flow.committed_out,
            }
        })
        .collect();
    rows.sort_by_key(|row| *row.item_id.as_uuid().as_bytes());

    let totals = ReportTotals {
        items: rows.len(),
        low_stock_items: rows.iter().filter(|row| row.low_stock).count(),
        active_reservations: reservations
            .iter()
            .filter(|r| r.status == ReservationStatus::Active)
            .count(),
    };

    StockReport {
        rows,
        totals,
        generated_at,
    }
}

/// Every item at or under its minimum, oldest first. Items with nothing
/// free escalate to `OutOfStock`.
pub fn low_stock_alerts(records: &[StockRecord]) -> Vec<StockAlert> {
    let mut alerts: Vec<StockAlert> = records
        .iter()
        .filter(|record| record.is_low())
        .map(|record| StockAlert {
            item_id: record.item.id,
            name: record.item.name.clone(),
            unit: record.item.unit,
            free: record.levels.free(),
            minimum_stock: record.item.minimum_stock,
            severity: if record.levels.free() <= 0 {
                AlertSeverity::OutOfStock
            } else {
                AlertSeverity::Low
            },
        })
        .collect();
    alerts.sort_by_key(|alert| *alert.item_id.as_uuid().as_bytes());
    alerts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{InventoryItem, StockLevels};
    use crate::reservation::Hold;
    use brewpos_core::{OrderId, ReservationId};
    use chrono::Duration;

    fn record(name: &str, minimum: i64, on_hand: i64, held: i64) -> StockRecord {
        StockRecord {
            item: InventoryItem::new(name, UnitOfMeasure::Grams, minimum, Utc::now()).unwrap(),
            levels: StockLevels { on_hand, held },
        }
    }

    #[test]
    fn report_aggregates_flows_per_item() {
        let beans = record("Espresso Beans", 100, 4_700, 54);
        let beans_id = beans.item.id;
        let now = Utc::now();
        let movements = vec![
            StockMovement::new(beans_id, 5_000, MovementKind::Restock, now),
            StockMovement::new(beans_id, -50, MovementKind::Adjustment, now),
            StockMovement::new(
                beans_id,
                -250,
                MovementKind::CommittedSale {
                    reservation_id: ReservationId::new(),
                    order_id: OrderId::new(),
                },
                now,
            ),
        ];

        let report = build_report(&[beans], &movements, &[], now);

        assert_eq!(report.rows.len(), 1);
        let row = &report.rows[0];
        assert_eq!(row.on_hand, 4_700);
        assert_eq!(row.held, 54);
        assert_eq!(row.free, 4_646);
        assert_eq!(row.restocked_in, 5_000);
        assert_eq!(row.adjusted_out, 50);
        assert_eq!(row.committed_out, 250);
        assert!(!row.low_stock);
    }

    #[test]
    fn report_counts_active_reservations_only() {
        let now = Utc::now();
        let ttl = Duration::minutes(15);
        let active = Reservation::new(OrderId::new(), Vec::new(), now, ttl);
        let mut released = Reservation::new(OrderId::new(), Vec::new(), now, ttl);
        released.mark_released(now).unwrap();
        let mut committed = Reservation::new(
            OrderId::new(),
            vec![Hold {
                item_id: InventoryItemId::new(),
                quantity: 1,
            }],
            now,
            ttl,
        );
        committed.mark_committed(now).unwrap();

        let report = build_report(&[], &[], &[active, released, committed], now);

        assert_eq!(report.totals.items, 0);
        assert_eq!(report.totals.active_reservations, 1);
    }

    #[test]
    fn alerts_split_low_from_out_of_stock() {
        let low = record("Whole Milk", 500, 800, 500);
        let out = record("Oat Milk", 200, 300, 300);
        let fine = record("Espresso Beans", 100, 4_000, 0);

        let alerts = low_stock_alerts(&[low.clone(), out.clone(), fine]);

        assert_eq!(alerts.len(), 2);
        let by_id = |id| alerts.iter().find(|a| a.item_id == id).unwrap();
        let low_alert = by_id(low.item.id);
        assert_eq!(low_alert.severity, AlertSeverity::Low);
        assert_eq!(low_alert.free, 300);
        let out_alert = by_id(out.item.id);
        assert_eq!(out_alert.severity, AlertSeverity::OutOfStock);
        assert_eq!(out_alert.free, 0);
    }

    #[test]
    fn unjournalled_item_reports_zero_flows() {
        let report = build_report(&[record("Cups", 50, 200, 0)], &[], &[], Utc::now());

        let row = &report.rows[0];
        assert_eq!(row.restocked_in, 0);
        assert_eq!(row.adjusted_out, 0);
        assert_eq!(row.committed_out, 0);
    }
}
