//! User entity - Registered accounts.
//!
//! Users log in with their email. `is_staff` and `is_superuser` grant the
//! elevated rights used by the access policies (editing other authors' recipes).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// User database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Unique identifier for the user
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Login identifier
    #[sea_orm(unique)]
    pub email: String,
    /// Public handle
    #[sea_orm(unique)]
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// argon2 PHC string; never serialized
    #[serde(skip_serializing)]
    pub password: String,
    /// Staff members may edit any recipe
    pub is_staff: bool,
    /// Superusers may edit any recipe
    pub is_superuser: bool,
}

/// Defines relationships between User and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One user authors many recipes
    #[sea_orm(has_many = "super::recipe::Entity")]
    Recipes,
    /// One user owns many auth tokens
    #[sea_orm(has_many = "super::auth_token::Entity")]
    AuthTokens,
}

impl Related<super::recipe::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Recipes.def()
    }
}

impl Related<super::auth_token::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AuthTokens.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Whether the user holds staff or superuser privileges.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        self.is_staff || self.is_superuser
    }
}
