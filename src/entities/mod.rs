//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod auth_token;
pub mod favorite;
pub mod ingredient;
pub mod recipe;
pub mod recipe_ingredient;
pub mod recipe_tag;
pub mod shopping_cart;
pub mod subscription;
pub mod tag;
pub mod user;

// Re-export specific types to avoid conflicts
pub use auth_token::{Column as AuthTokenColumn, Entity as AuthToken, Model as AuthTokenModel};
pub use favorite::{Column as FavoriteColumn, Entity as Favorite, Model as FavoriteModel};
pub use ingredient::{Column as IngredientColumn, Entity as Ingredient, Model as IngredientModel};
pub use recipe::{Column as RecipeColumn, Entity as Recipe, Model as RecipeModel};
pub use recipe_ingredient::{
    Column as RecipeIngredientColumn, Entity as RecipeIngredient, Model as RecipeIngredientModel,
};
pub use recipe_tag::{Column as RecipeTagColumn, Entity as RecipeTag, Model as RecipeTagModel};
pub use shopping_cart::{
    Column as ShoppingCartColumn, Entity as ShoppingCart, Model as ShoppingCartModel,
};
pub use subscription::{
    Column as SubscriptionColumn, Entity as Subscription, Model as SubscriptionModel,
};
pub use tag::{Column as TagColumn, Entity as Tag, Model as TagModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
