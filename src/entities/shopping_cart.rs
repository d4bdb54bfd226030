//! Shopping cart entity - Recipes a user plans to buy ingredients for.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Shopping cart entry database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "shopping_cart")]
pub struct Model {
    /// Owner of the cart
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    /// Recipe placed in the cart
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_id: i32,
}

/// Defines relationships between a cart entry and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The cart owner
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// The recipe in the cart
    #[sea_orm(
        belongs_to = "super::recipe::Entity",
        from = "Column::RecipeId",
        to = "super::recipe::Column::Id",
        on_delete = "Cascade"
    )]
    Recipe,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
