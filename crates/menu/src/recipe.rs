use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brewpos_core::{CupSize, InventoryItemId, MenuItemId, StockError, StockResult, StoreError};

/// Key of a recipe: one recipe per (menu item, size) pair.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RecipeKey {
    pub menu_item_id: MenuItemId,
    pub size: CupSize,
}

/// One ingredient of a recipe.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecipeLine {
    pub inventory_item_id: InventoryItemId,
    /// Quantity consumed per single serving, in the item's base unit.
    pub quantity: i64,
    /// Allowed measurement variance per serving (pour/tamp slack), in the
    /// item's base unit. Informational: claims use `quantity` as written.
    pub tolerance: i64,
}

/// Ingredient recipe for a (menu item, size) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub menu_item_id: MenuItemId,
    pub size: CupSize,
    pub lines: Vec<RecipeLine>,
    pub updated_at: DateTime<Utc>,
}

impl Recipe {
    pub fn new(
        menu_item_id: MenuItemId,
        size: CupSize,
        lines: Vec<RecipeLine>,
        now: DateTime<Utc>,
    ) -> StockResult<Self> {
        if lines.is_empty() {
            return Err(StockError::validation("recipe needs at least one line"));
        }
        let mut seen: Vec<InventoryItemId> = Vec::with_capacity(lines.len());
        for line in &lines {
            if line.quantity <= 0 {
                return Err(StockError::validation(format!(
                    "line quantity must be positive for item {}",
                    line.inventory_item_id
                )));
            }
            if line.tolerance < 0 {
                return Err(StockError::validation(format!(
                    "tolerance cannot be negative for item {}",
                    line.inventory_item_id
                )));
            }
            if seen.contains(&line.inventory_item_id) {
                return Err(StockError::validation(format!(
                    "item {} appears twice in recipe",
                    line.inventory_item_id
                )));
            }
            seen.push(line.inventory_item_id);
        }

        Ok(Self {
            menu_item_id,
            size,
            lines,
            updated_at: now,
        })
    }

    pub fn key(&self) -> RecipeKey {
        RecipeKey {
            menu_item_id: self.menu_item_id,
            size: self.size,
        }
    }

    /// Ingredient requirements for `quantity` servings.
    pub fn requirements(&self, quantity: i64) -> StockResult<Vec<Requirement>> {
        if quantity <= 0 {
            return Err(StockError::validation("quantity must be positive"));
        }

        self.lines
            .iter()
            .map(|line| {
                let scaled = line.quantity.checked_mul(quantity).ok_or_else(|| {
                    StockError::validation(format!(
                        "quantity overflow for item {}",
                        line.inventory_item_id
                    ))
                })?;
                Ok(Requirement {
                    item_id: line.inventory_item_id,
                    quantity: scaled,
                })
            })
            .collect()
    }
}

/// A quantity of one inventory item needed to fulfil an order line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requirement {
    pub item_id: InventoryItemId,
    pub quantity: i64,
}

/// Merge requirements by item, summing quantities.
///
/// Output is sorted by item id so downstream lock acquisition and error
/// reporting are deterministic.
pub fn merge_requirements(
    requirements: impl IntoIterator<Item = Requirement>,
) -> StockResult<Vec<Requirement>> {
    let mut merged: BTreeMap<InventoryItemId, i64> = BTreeMap::new();
    for req in requirements {
        let total = merged.entry(req.item_id).or_insert(0);
        *total = total.checked_add(req.quantity).ok_or_else(|| {
            StockError::validation(format!("quantity overflow for item {}", req.item_id))
        })?;
    }

    Ok(merged
        .into_iter()
        .map(|(item_id, quantity)| Requirement { item_id, quantity })
        .collect())
}

/// Recipe persistence boundary.
pub trait RecipeStore: Send + Sync {
    fn get(&self, key: &RecipeKey) -> Result<Option<Recipe>, StoreError>;
    fn upsert(&self, recipe: Recipe) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<Recipe>, StoreError>;
    fn list_for_item(&self, menu_item_id: MenuItemId) -> Result<Vec<Recipe>, StoreError>;
}

impl<S> RecipeStore for Arc<S>
where
    S: RecipeStore + ?Sized,
{
    fn get(&self, key: &RecipeKey) -> Result<Option<Recipe>, StoreError> {
        (**self).get(key)
    }

    fn upsert(&self, recipe: Recipe) -> Result<(), StoreError> {
        (**self).upsert(recipe)
    }

    fn list(&self) -> Result<Vec<Recipe>, StoreError> {
        (**self).list()
    }

    fn list_for_item(&self, menu_item_id: MenuItemId) -> Result<Vec<Recipe>, StoreError> {
        (**self).list_for_item(menu_item_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(quantity: i64) -> RecipeLine {
        RecipeLine {
            inventory_item_id: InventoryItemId::new(),
            quantity,
            tolerance: 0,
        }
    }

    #[test]
    fn recipe_rejects_empty_lines() {
        let err = Recipe::new(MenuItemId::new(), CupSize::Small, vec![], Utc::now()).unwrap_err();
        match err {
            StockError::Validation(msg) if msg.contains("at least one line") => {}
            _ => panic!("Expected Validation error for empty recipe"),
        }
    }

    #[test]
    fn recipe_rejects_non_positive_quantity() {
        let err =
            Recipe::new(MenuItemId::new(), CupSize::Small, vec![line(0)], Utc::now()).unwrap_err();
        match err {
            StockError::Validation(msg) if msg.contains("positive") => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }
    }

    #[test]
    fn recipe_rejects_negative_tolerance() {
        let mut bad = line(10);
        bad.tolerance = -1;
        let err =
            Recipe::new(MenuItemId::new(), CupSize::Small, vec![bad], Utc::now()).unwrap_err();
        match err {
            StockError::Validation(msg) if msg.contains("tolerance") => {}
            _ => panic!("Expected Validation error for negative tolerance"),
        }
    }

    #[test]
    fn recipe_rejects_duplicate_ingredient() {
        let item_id = InventoryItemId::new();
        let lines = vec![
            RecipeLine {
                inventory_item_id: item_id,
                quantity: 18,
                tolerance: 1,
            },
            RecipeLine {
                inventory_item_id: item_id,
                quantity: 30,
                tolerance: 0,
            },
        ];
        let err = Recipe::new(MenuItemId::new(), CupSize::Small, lines, Utc::now()).unwrap_err();
        match err {
            StockError::Validation(msg) if msg.contains("twice") => {}
            _ => panic!("Expected Validation error for duplicate ingredient"),
        }
    }

    #[test]
    fn requirements_scale_per_serving_quantities() {
        let beans = InventoryItemId::new();
        let milk = InventoryItemId::new();
        let recipe = Recipe::new(
            MenuItemId::new(),
            CupSize::Large,
            vec![
                RecipeLine {
                    inventory_item_id: beans,
                    quantity: 18,
                    tolerance: 1,
                },
                RecipeLine {
                    inventory_item_id: milk,
                    quantity: 220,
                    tolerance: 10,
                },
            ],
            Utc::now(),
        )
        .unwrap();

        let reqs = recipe.requirements(3).unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].item_id, beans);
        assert_eq!(reqs[0].quantity, 54);
        assert_eq!(reqs[1].item_id, milk);
        assert_eq!(reqs[1].quantity, 660);
    }

    #[test]
    fn requirements_reject_non_positive_quantity() {
        let recipe =
            Recipe::new(MenuItemId::new(), CupSize::Small, vec![line(18)], Utc::now()).unwrap();
        let err = recipe.requirements(0).unwrap_err();
        match err {
            StockError::Validation(msg) if msg.contains("positive") => {}
            _ => panic!("Expected Validation error for zero servings"),
        }
    }

    #[test]
    fn merge_sums_per_item_and_sorts() {
        let mut a = InventoryItemId::new();
        let mut b = InventoryItemId::new();
        if b < a {
            core::mem::swap(&mut a, &mut b);
        }

        let merged = merge_requirements([
            Requirement {
                item_id: b,
                quantity: 5,
            },
            Requirement {
                item_id: a,
                quantity: 7,
            },
            Requirement {
                item_id: b,
                quantity: 2,
            },
        ])
        .unwrap();

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].item_id, a);
        assert_eq!(merged[0].quantity, 7);
        assert_eq!(merged[1].item_id, b);
        assert_eq!(merged[1].quantity, 7);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: merging never changes the total quantity.
            #[test]
            fn merge_conserves_total_quantity(
                quantities in prop::collection::vec(1i64..1_000_000i64, 1..20),
                item_count in 1usize..5
            ) {
                let items: Vec<InventoryItemId> =
                    (0..item_count).map(|_| InventoryItemId::new()).collect();
                let reqs: Vec<Requirement> = quantities
                    .iter()
                    .enumerate()
                    .map(|(i, q)| Requirement {
                        item_id: items[i % items.len()],
                        quantity: *q,
                    })
                    .collect();

                let total_before: i64 = reqs.iter().map(|r| r.quantity).sum();
                let merged = merge_requirements(reqs).unwrap();
                let total_after: i64 = merged.iter().map(|r| r.quantity).sum();

                prop_assert_eq!(total_before, total_after);
                prop_assert!(merged.windows(2).all(|w| w[0].item_id < w[1].item_id));
            }

            /// Property: requirements scale linearly in the serving count.
            #[test]
            fn requirements_scale_linearly(
                per_serving in 1i64..10_000i64,
                servings in 1i64..1_000i64
            ) {
                let recipe = Recipe::new(
                    MenuItemId::new(),
                    CupSize::Medium,
                    vec![RecipeLine {
                        inventory_item_id: InventoryItemId::new(),
                        quantity: per_serving,
                        tolerance: 0,
                    }],
                    Utc::now(),
                )
                .unwrap();

                let reqs = recipe.requirements(servings).unwrap();
                prop_assert_eq!(reqs.len(), 1);
                prop_assert_eq!(reqs[0].quantity, per_serving * servings);
            }
        }
    }
}
