//! Subscription entity - Asymmetric "user follows author" relation.
//!
//! A row `(user_id, author_id)` means `user_id` follows `author_id`; it says
//! nothing about the reverse direction.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscriptions")]
pub struct Model {
    /// The follower
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: i32,
    /// The followed author
    #[sea_orm(primary_key, auto_increment = false)]
    pub author_id: i32,
}

/// Defines relationships between Subscription and users
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The following user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Subscriber,
    /// The followed user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::AuthorId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Author,
}

impl ActiveModelBehavior for ActiveModel {}
