//! Recipe-tag association. The composite key keeps each tag once per recipe.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recipe-tag link database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipe_tags")]
pub struct Model {
    /// Linked recipe
    #[sea_orm(primary_key, auto_increment = false)]
    pub recipe_id: i32,
    /// Linked tag
    #[sea_orm(primary_key, auto_increment = false)]
    pub tag_id: i32,
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
    /// The tag side
    #[sea_orm(
        belongs_to = "super::tag::Entity",
        from = "Column::TagId",
        to = "super::tag::Column::Id",
        on_delete = "Cascade"
    )]
    Tag,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipe.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Tag.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
