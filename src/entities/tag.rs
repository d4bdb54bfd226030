//! Tag entity - Administrator-managed labels such as "Breakfast" or "Dinner".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Tag database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "tags")]
pub struct Model {
    /// Unique identifier for the tag
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Display name
    pub name: String,
    /// HEX color such as `#E26C2D`
    pub color: Option<String>,
    /// Unique URL-safe identifier used for filtering
    #[sea_orm(unique)]
    pub slug: String,
}

/// Defines relationships between Tag and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One tag is linked to many recipes
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
