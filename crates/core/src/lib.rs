//! `brewpos-core` — domain foundation building blocks.
//!
//! Pure primitives shared by every brewpos crate (no infrastructure
//! concerns): typed identifiers, the domain error model, cup sizes, the
//! clock seam and the per-key lock table.

pub mod clock;
pub mod error;
pub mod id;
pub mod lock;
pub mod size;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{StockError, StockResult, StoreError};
pub use id::{InventoryItemId, MenuItemId, OrderId, ReservationId};
pub use lock::{LockTable, lock_all};
pub use size::CupSize;
