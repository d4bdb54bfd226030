//! Auth token entity - Opaque API tokens issued on login.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Auth token database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "auth_tokens")]
pub struct Model {
    /// 40 hex characters sent as `Authorization: Token <key>`
    #[sea_orm(primary_key, auto_increment = false)]
    pub key: String,
    /// Owner of the token
    pub user_id: i32,
    /// When the token was issued
    pub created_at: DateTimeUtc,
}

/// Defines relationships between `AuthToken` and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each token belongs to one user
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
