//! Recipe entity - The central content type.
//!
//! A recipe belongs to its author and links to tags and ingredients through
//! the `recipe_tags` and `recipe_ingredients` association tables. Favorites
//! and shopping-cart membership live in their own join tables.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Recipe database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "recipes")]
pub struct Model {
    /// Unique identifier for the recipe
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Title, at most 200 characters
    pub name: String,
    /// Free-form description
    #[sea_orm(column_type = "Text")]
    pub text: String,
    /// Cooking time in minutes, at least 1
    pub cooking_time: i32,
    /// Image path relative to the media root
    pub image: String,
    /// ID of the user who wrote the recipe
    pub author_id: i32,
    /// Publication time, used for newest-first ordering
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Recipe and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each recipe belongs to one author
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
    /// One recipe has many tag links
    #[sea_orm(has_many = "super::recipe_tag::Entity")]
    RecipeTags,
    /// One recipe has many ingredient links
    #[sea_orm(has_many = "super::recipe_ingredient::Entity")]
    RecipeIngredients,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::recipe_tag::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeTags.def()
    }
}

impl Related<super::recipe_ingredient::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RecipeIngredients.def()
    }
}

impl Related<super::tag::Entity> for Entity {
    fn to() -> RelationDef {
        super::recipe_tag::Relation::Tag.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::recipe_tag::Relation::Recipe.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
