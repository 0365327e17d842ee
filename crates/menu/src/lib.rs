//! `brewpos-menu` — menu catalog and recipes.
//!
//! Sellable menu items, their per-size ingredient recipes, and the resolver
//! that turns an order line into scaled ingredient requirements.

pub mod item;
pub mod recipe;
pub mod resolver;

pub use item::{MenuItem, MenuStore};
pub use recipe::{Recipe, RecipeKey, RecipeLine, RecipeStore, Requirement, merge_requirements};
pub use resolver::RecipeResolver;
