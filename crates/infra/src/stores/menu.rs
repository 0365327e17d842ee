use std::collections::HashMap;
use std::sync::RwLock;

use brewpos_core::{MenuItemId, StoreError};
use brewpos_menu::{MenuItem, MenuStore, Recipe, RecipeKey, RecipeStore};

use super::poisoned;

#[derive(Debug, Default)]
pub struct InMemoryMenuStore {
    items: RwLock<HashMap<MenuItemId, MenuItem>>,
}

impl InMemoryMenuStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl MenuStore for InMemoryMenuStore {
    fn get(&self, id: MenuItemId) -> Result<Option<MenuItem>, StoreError> {
        let map = self.items.read().map_err(|_| poisoned("menu items"))?;
        Ok(map.get(&id).cloned())
    }

    fn upsert(&self, item: MenuItem) -> Result<(), StoreError> {
        let mut map = self.items.write().map_err(|_| poisoned("menu items"))?;
        map.insert(item.id, item);
        Ok(())
    }

    fn list(&self) -> Result<Vec<MenuItem>, StoreError> {
        let map = self.items.read().map_err(|_| poisoned("menu items"))?;
        Ok(map.values().cloned().collect())
    }
}

/// Recipes keyed by menu item and cup size.
#[derive(Debug, Default)]
pub struct InMemoryRecipeStore {
    recipes: RwLock<HashMap<RecipeKey, Recipe>>,
}

impl InMemoryRecipeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecipeStore for InMemoryRecipeStore {
    fn get(&self, key: &RecipeKey) -> Result<Option<Recipe>, StoreError> {
        let map = self.recipes.read().map_err(|_| poisoned("recipes"))?;
        Ok(map.get(key).cloned())
    }

    fn upsert(&self, recipe: Recipe) -> Result<(), StoreError> {
        let mut map = self.recipes.write().map_err(|_| poisoned("recipes"))?;
        map.insert(recipe.key(), recipe);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        let map = self.recipes.read().map_err(|_| poisoned("recipes"))?;
        Ok(map.values().cloned().collect())
    }

    fn list_for_item(&self, menu_item_id: MenuItemId) -> Result<Vec<Recipe>, StoreError> {
        let map = self.recipes.read().map_err(|_| poisoned("recipes"))?;
        Ok(map
            .values()
            .filter(|r| r.menu_item_id == menu_item_id)
            .cloned()
            .collect())
    }
}
