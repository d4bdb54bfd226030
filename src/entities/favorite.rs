//! Favorite entity - Which users bookmarked which recipes.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Favorite database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "favorites")]
pub struct Model {
    /// User who favorited the recipe
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    /// Favorited recipe
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_id: i32,
}

/// Defines relationships between Favorite and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The bookmarking user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
    /// The bookmarked recipe
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
