/// Password hashing, login and API tokens
pub mod auth;

/// Ingredient search and bulk import
pub mod ingredients;

/// Recipe image storage
pub mod media;

/// Page-number pagination
pub mod pagination;

/// Access policies
pub mod permissions;

/// Recipe creation, editing, deletion and listing
pub mod recipes;

/// Favorites, shopping cart and subscriptions
pub mod relations;

/// Aggregated shopping list export
pub mod shopping_cart;

/// Tag lookup and seeding
pub mod tags;

/// Registration and user profiles
pub mod users;
