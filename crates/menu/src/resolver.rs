use brewpos_core::{CupSize, MenuItemId, StockError, StockResult};

use crate::recipe::{RecipeKey, RecipeStore, Requirement};

/// Resolves an order line into scaled ingredient requirements.
///
/// Pure with respect to stock: it only reads recipe data. A missing recipe
/// surfaces as [`StockError::RecipeNotFound`], which the ordering flow treats
/// as "untracked item" rather than a failure.
#[derive(Debug, Clone)]
pub struct RecipeResolver<R> {
    recipes: R,
}

impl<R: RecipeStore> RecipeResolver<R> {
    pub fn new(recipes: R) -> Self {
        Self { recipes }
    }

    pub fn resolve(
        &self,
        menu_item_id: MenuItemId,
        size: CupSize,
        quantity: i64,
    ) -> StockResult<Vec<Requirement>> {
        if quantity <= 0 {
            return Err(StockError::validation("quantity must be positive"));
        }

        let key = RecipeKey { menu_item_id, size };
        let recipe = self
            .recipes
            .get(&key)?
            .ok_or_else(|| StockError::recipe_not_found(menu_item_id, size))?;

        recipe.requirements(quantity)
    }
}
