//! `brewpos-inventory` — the stock ledger and reservation core.
//!
//! Quantity tracking, atomic check-and-claim reservations, read-only
//! availability projections and the reports derived from the movement
//! journal. Persistence sits behind the store traits; concurrency control
//! (per-item and per-order serialization) is owned by this crate.

pub mod availability;
pub mod item;
pub mod ledger;
pub mod manager;
pub mod movement;
pub mod report;
pub mod reservation;

pub use availability::{
    AvailabilityChecker, AvailabilityReport, LineAvailability, ResolvedLine, Shortage,
    project_availability,
};
pub use item::{InventoryItem, StockLevels, StockRecord, UnitOfMeasure};
pub use ledger::{StockLedger, StockStore};
pub use manager::ReservationManager;
pub use movement::{MovementKind, StockMovement};
pub use report::{
    AlertSeverity, ReportTotals, StockAlert, StockReport, StockReportRow, build_report,
    low_stock_alerts,
};
pub use reservation::{Hold, OrderLine, Reservation, ReservationStatus, ReservationStore};
