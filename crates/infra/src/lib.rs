//! Infrastructure layer: store backends, caching, background sweep.

pub mod cache;
pub mod stores;
pub mod sweeper;


pub use cache::SnapshotCache;
pub use stores::{
    InMemoryMenuStore, InMemoryRecipeStore, InMemoryReservationStore, InMemoryStockStore,
};
pub use sweeper::{ExpirySweeper, ExpirySweeperHandle};
