//! Recipe-ingredient association carrying the per-recipe quantity.
//!
//! The composite key `(recipe_id, ingredient_id)` means an ingredient appears at
//! most once in a recipe; amounts are expressed in the ingredient's unit.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recipe-ingredient link database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_ingredients")]
pub struct Model {
    /// Linked recipe
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_id: i32,
    /// Linked ingredient
    #[sea_orm(primary_key, auto_increment = false)]
    pub ingredient_id: i32,
    /// Quantity, at least 1
    pub amount: i32,
}

/// Defines relationships between the link and both sides
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The recipe side
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id",
        on_delete = "Cascade"
    )]
    Recipe,
    /// The ingredient side
    #[sea_orm(
        belongs_to = "super::ingredient::Entity",
        from = "Column::IngredientId",
        to = "super::ingredient::Column::Id",
        on_delete = "Cascade"
    )]
    Ingredient,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Ingredient.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
