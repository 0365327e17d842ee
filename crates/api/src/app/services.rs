use std::sync::Arc;

use brewpos_core::{Clock, SystemClock};
use brewpos_infra::{
    InMemoryMenuStore, InMemoryRecipeStore, InMemoryReservationStore, InMemoryStockStore,
    SnapshotCache,
};
use brewpos_inventory::{AvailabilityChecker, ReservationManager, StockLedger};
use brewpos_menu::RecipeResolver;

use crate::config::Config;

pub type Stock = Arc<InMemoryStockStore>;
pub type Reservations = Arc<InMemoryReservationStore>;
pub type Recipes = Arc<InMemoryRecipeStore>;
pub type Menu = Arc<InMemoryMenuStore>;

pub type Manager = ReservationManager<Stock, Reservations, Recipes>;
pub type Checker = AvailabilityChecker<Stock, Recipes>;

/// Shared state handed to every handler via `Extension`.
pub struct AppServices {
    pub ledger: Arc<StockLedger<Stock>>,
    pub manager: Arc<Manager>,
    pub checker: Checker,
    pub menu: Menu,
    pub recipes: Recipes,
    /// Cached `GET /menu/items` body. Menu mutations invalidate it.
    pub menu_cache: SnapshotCache<serde_json::Value>,
}

/// Wires stores, ledger and services for one process.
///
/// Everything hangs off in-memory stores, so state lives exactly as long as
/// the returned services.
pub fn build_services(config: &Config) -> Arc<AppServices> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    let stock: Stock = Arc::new(InMemoryStockStore::new());
    let reservations: Reservations = Arc::new(InMemoryReservationStore::new());
    let recipes: Recipes = Arc::new(InMemoryRecipeStore::new());
    let menu: Menu = Arc::new(InMemoryMenuStore::new());

    let ledger = Arc::new(StockLedger::new(stock));
    let resolver = RecipeResolver::new(Arc::clone(&recipes));

    let manager = Arc::new(
        ReservationManager::new(
            Arc::clone(&ledger),
            reservations,
            resolver.clone(),
            Arc::clone(&clock),
        )
        .with_ttl(config.reservation_ttl),
    );
    let checker = AvailabilityChecker::new(Arc::clone(&ledger), resolver, clock);

    Arc::new(AppServices {
        ledger,
        manager,
        checker,
        menu,
        recipes,
        menu_cache: SnapshotCache::new(config.menu_cache_ttl),
    })
}
