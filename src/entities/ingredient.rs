//! Ingredient entity - Reference data loaded from a CSV file.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    /// Unique identifier for the ingredient
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Name, e.g. "salt"
    pub name: String,
    /// Lower-cased `name` for case-insensitive search
    #[serde(skip)]
    pub search_name: String,
    /// Unit the amounts are given in, e.g. "g"
    pub measurement_unit: String,
}

/// Defines relationships between Ingredient and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One ingredient is used by many recipes
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredients,
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
