//! Relationship toggling - favorites, shopping cart and subscriptions.
//!
//! Each relation is a join table keyed by the pair it links, so the storage
//! layer enforces uniqueness. Adding is a single `INSERT .. ON CONFLICT DO NOTHING`
//! and removing a single `DELETE`; the affected-row count tells whether anything
//! changed. Repeating a request is therefore safe even under concurrency, and the
//! caller learns about duplicates through [`ToggleOutcome`] rather than an error.

use crate::{
    core::{
        pagination::{Page, PageRequest},
        media::MediaStorage,
        recipes::{self, RecipeShort},
        users,
    },
    entities::{
        Favorite, Recipe, ShoppingCart, Subscription, User, favorite, recipe, shopping_cart,
        subscription, user,
    },
    errors::{Error, Result},
};
use sea_orm::{
    PaginatorTrait, QueryOrder, QuerySelect, Set, prelude::*, sea_query::OnConflict,
};
use serde::Serialize;
use tracing::{debug, instrument};

/// User-to-recipe relations that can be toggled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeRelation {
    /// The user's bookmarks
    Favorite,
    /// Recipes whose ingredients the user plans to buy
    ShoppingCart,
}

impl RecipeRelation {
    /// Human-readable name used in messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Favorite => "favorites",
            Self::ShoppingCart => "shopping cart",
        }
    }
}

/// What a toggle request did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// The relation was created
    Added,
    /// The relation was deleted
    Removed,
    /// Add requested but the relation already existed; nothing changed
    AlreadyPresent,
    /// Remove requested but the relation did not exist; nothing changed
    NotPresent,
}

impl ToggleOutcome {
    /// Turns the no-op outcomes into the matching client error.
    pub fn into_result(self, relation: &'static str) -> Result<()> {
        match self {
            Self::Added | Self::Removed => Ok(()),
            Self::AlreadyPresent => Err(Error::AlreadyPresent { relation }),
            Self::NotPresent => Err(Error::NotPresent { relation }),
        }
    }

    const fn added(rows: u64) -> Self {
        if rows == 0 { Self::AlreadyPresent } else { Self::Added }
    }

    const fn removed(rows: u64) -> Self {
        if rows == 0 { Self::NotPresent } else { Self::Removed }
    }
}

/// Label of the subscription relation
pub const SUBSCRIPTIONS: &str = "subscriptions";

async fn ensure_recipe_exists<C: ConnectionTrait>(db: &C, recipe_id: i32) -> Result<()> {
    Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .map(|_| ())
        .ok_or_else(|| Error::not_found("Recipe", recipe_id))
}

/// Puts `recipe_id` into the user's favorites or shopping cart.
#[instrument(skip(db))]
pub async fn add_recipe_relation<C>(
    db: &C,
    relation: RecipeRelation,
    user_id: i32,
    recipe_id: i32,
) -> Result<ToggleOutcome>
where
    C: ConnectionTrait,
{
    ensure_recipe_exists(db, recipe_id).await?;

    let rows = match relation {
        RecipeRelation::Favorite => {
            Favorite::insert(favorite::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
            })
            .on_conflict(
                OnConflict::columns([favorite::Column::UserId, favorite::Column::RecipeId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(db)
            .await?
        }
        RecipeRelation::ShoppingCart => {
            ShoppingCart::insert(shopping_cart::ActiveModel {
                user_id: Set(user_id),
                recipe_id: Set(recipe_id),
            })
            .on_conflict(
                OnConflict::columns([
                    shopping_cart::Column::UserId,
                    shopping_cart::Column::RecipeId,
                ])
                .do_nothing()
                .to_owned(),
            )
            .exec_without_returning(db)
            .await?
        }
    };

    let outcome = ToggleOutcome::added(rows);
    debug!("{outcome:?}");
    Ok(outcome)
}

/// Takes `recipe_id` out of the user's favorites or shopping cart.
#[instrument(skip(db))]
pub async fn remove_recipe_relation<C>(
    db: &C,
    relation: RecipeRelation,
    user_id: i32,
    recipe_id: i32,
) -> Result<ToggleOutcome>
where
    C: ConnectionTrait,
{
    ensure_recipe_exists(db, recipe_id).await?;

    let rows = match relation {
        RecipeRelation::Favorite => {
            Favorite::delete_many()
                .filter(favorite::Column::UserId.eq(user_id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
                .rows_affected
        }
        RecipeRelation::ShoppingCart => {
            ShoppingCart::delete_many()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .exec(db)
                .await?
                .rows_affected
        }
    };

    let outcome = ToggleOutcome::removed(rows);
    debug!("{outcome:?}");
    Ok(outcome)
}

/// Whether `recipe_id` is in the viewer's relation; always `false` for
/// anonymous viewers.
pub async fn is_in_relation<C>(
    db: &C,
    relation: RecipeRelation,
    viewer: Option<&user::Model>,
    recipe_id: i32,
) -> Result<bool>
where
    C: ConnectionTrait,
{
    let Some(viewer) = viewer else {
        return Ok(false);
    };

    let count = match relation {
        RecipeRelation::Favorite => {
            Favorite::find()
                .filter(favorite::Column::UserId.eq(viewer.id))
                .filter(favorite::Column::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
        RecipeRelation::ShoppingCart => {
            ShoppingCart::find()
                .filter(shopping_cart::Column::UserId.eq(viewer.id))
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .count(db)
                .await?
        }
    };
    Ok(count > 0)
}

/// IDs of every recipe in the user's relation.
pub async fn recipe_ids_in_relation<C>(
    db: &C,
    relation: RecipeRelation,
    user_id: i32,
) -> Result<Vec<i32>>
where
    C: ConnectionTrait,
{
    let ids = match relation {
        RecipeRelation::Favorite => {
            Favorite::find()
                .filter(favorite::Column::UserId.eq(user_id))
                .all(db)
                .await?
                .into_iter()
                .map(|row| row.recipe_id)
                .collect()
        }
        RecipeRelation::ShoppingCart => {
            ShoppingCart::find()
                .filter(shopping_cart::Column::UserId.eq(user_id))
                .all(db)
                .await?
                .into_iter()
                .map(|row| row.recipe_id)
                .collect()
        }
    };
    Ok(ids)
}

/// Makes `user_id` follow `author_id`. Following yourself is rejected.
#[instrument(skip(db))]
pub async fn subscribe<C>(db: &C, user_id: i32, author_id: i32) -> Result<ToggleOutcome>
where
    C: ConnectionTrait,
{
    users::get_user_by_id(db, author_id).await?;
    if user_id == author_id {
        return Err(Error::validation("You cannot subscribe to yourself"));
    }

    let rows = Subscription::insert(subscription::ActiveModel {
        user_id: Set(user_id),
        author_id: Set(author_id),
    })
    .on_conflict(
        OnConflict::columns([
            subscription::Column::UserId,
            subscription::Column::AuthorId,
        ])
        .do_nothing()
        .to_owned(),
    )
    .exec_without_returning(db)
    .await?;

    Ok(ToggleOutcome::added(rows))
}

/// Makes `user_id` stop following `author_id`.
#[instrument(skip(db))]
pub async fn unsubscribe<C>(db: &C, user_id: i32, author_id: i32) -> Result<ToggleOutcome>
where
    C: ConnectionTrait,
{
    users::get_user_by_id(db, author_id).await?;

    let result = Subscription::delete_many()
        .filter(subscription::Column::UserId.eq(user_id))
        .filter(subscription::Column::AuthorId.eq(author_id))
        .exec(db)
        .await?;

    Ok(ToggleOutcome::removed(result.rows_affected))
}

/// Whether the viewer follows `author_id`; `false` for anonymous viewers.
pub async fn is_subscribed<C>(db: &C, viewer: Option<&user::Model>, author_id: i32) -> Result<bool>
where
    C: ConnectionTrait,
{
    let Some(viewer) = viewer else {
        return Ok(false);
    };

    let count = Subscription::find()
        .filter(subscription::Column::UserId.eq(viewer.id))
        .filter(subscription::Column::AuthorId.eq(author_id))
        .count(db)
        .await?;
    Ok(count > 0)
}

/// A followed author together with their recipes
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubscriptionRead {
    /// Login email
    pub email: String,
    /// User ID
    pub id: i32,
    /// Public handle
    pub username: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Whether the viewer follows this author
    pub is_subscribed: bool,
    /// The author's recipes, newest first, possibly truncated
    pub recipes: Vec<RecipeShort>,
    /// Total number of recipes by the author
    pub recipes_count: u64,
}

/// Renders `author` with up to `recipes_limit` of their recipes.
pub async fn subscription_read(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<&user::Model>,
    author: user::Model,
    recipes_limit: Option<u64>,
) -> Result<SubscriptionRead> {
    let is_subscribed = is_subscribed(db, viewer, author.id).await?;

    let by_author = Recipe::find()
        .filter(recipe::Column::AuthorId.eq(author.id))
        .order_by_desc(recipe::Column::Id);
    let recipes_count = by_author.clone().count(db).await?;
    let recipes = match recipes_limit {
        Some(limit) => by_author.limit(limit).all(db).await?,
        None => by_author.all(db).await?,
    };

    Ok(SubscriptionRead {
        email: author.email,
        id: author.id,
        username: author.username,
        first_name: author.first_name,
        last_name: author.last_name,
        is_subscribed,
        recipes: recipes
            .into_iter()
            .map(|recipe| recipes::recipe_short(media, recipe))
            .collect(),
        recipes_count,
    })
}

/// Authors the user follows, one page at a time.
pub async fn list_subscriptions(
    db: &DatabaseConnection,
    media: &MediaStorage,
    user: &user::Model,
    request: PageRequest,
    recipes_limit: Option<u64>,
) -> Result<Page<SubscriptionRead>> {
    let author_ids: Vec<i32> = Subscription::find()
        .filter(subscription::Column::UserId.eq(user.id))
        .all(db)
        .await?
        .into_iter()
        .map(|row| row.author_id)
        .collect();
    if author_ids.is_empty() {
        return Ok(Page::empty(request));
    }

    let paginator = User::find()
        .filter(user::Column::Id.is_in(author_ids))
        .order_by_asc(user::Column::Id)
        .paginate(db, request.limit);
    let count = paginator.num_items().await?;
    let authors = paginator.fetch_page(request.index()).await?;

    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(subscription_read(db, media, Some(user), author, recipes_limit).await?);
    }
    Ok(Page::new(results, count, request))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_favorite_twice_keeps_one_record() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        let fan = create_test_user(&db, "fan").await?;

        let first = add_recipe_relation(&db, RecipeRelation::Favorite, fan.id, recipe.id).await?;
        let second = add_recipe_relation(&db, RecipeRelation::Favorite, fan.id, recipe.id).await?;

        assert_eq!(first, ToggleOutcome::Added);
        assert_eq!(second, ToggleOutcome::AlreadyPresent);
        assert_eq!(Favorite::find().count(&db).await?, 1);
        assert!(is_in_relation(&db, RecipeRelation::Favorite, Some(&fan), recipe.id).await?);
        assert!(!is_in_relation(&db, RecipeRelation::Favorite, Some(&author), recipe.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_remove_absent_cart_entry() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        let other = create_test_recipe(&db, &author, "Soup", &[]).await?;
        add_recipe_relation(&db, RecipeRelation::ShoppingCart, author.id, other.id).await?;

        let outcome =
            remove_recipe_relation(&db, RecipeRelation::ShoppingCart, author.id, recipe.id).await?;

        assert_eq!(outcome, ToggleOutcome::NotPresent);
        assert_eq!(
            recipe_ids_in_relation(&db, RecipeRelation::ShoppingCart, author.id).await?,
            vec![other.id]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_add_then_remove_cart_entry() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;

        let added = add_recipe_relation(&db, RecipeRelation::ShoppingCart, author.id, recipe.id).await?;
        let removed =
            remove_recipe_relation(&db, RecipeRelation::ShoppingCart, author.id, recipe.id).await?;

        assert_eq!(added, ToggleOutcome::Added);
        assert_eq!(removed, ToggleOutcome::Removed);
        assert_eq!(ShoppingCart::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_relations_are_kept_apart() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;

        add_recipe_relation(&db, RecipeRelation::Favorite, author.id, recipe.id).await?;
        assert!(!is_in_relation(&db, RecipeRelation::ShoppingCart, Some(&author), recipe.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_toggle_missing_recipe() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "user").await?;

        let result = add_recipe_relation(&db, RecipeRelation::Favorite, user.id, 404).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_anonymous_viewer_sees_false() -> Result<()> {
        let (db, author, recipe) = setup_with_recipe().await?;
        add_recipe_relation(&db, RecipeRelation::Favorite, author.id, recipe.id).await?;

        assert!(!is_in_relation(&db, RecipeRelation::Favorite, None, recipe.id).await?);
        assert!(!is_subscribed(&db, None, author.id).await?);
        Ok(())
    }

    #[tokio::test]
    async fn test_cannot_subscribe_to_self() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "narcissus").await?;

        let result = subscribe(&db, user.id, user.id).await;

        assert!(matches!(result, Err(Error::Validation { .. })));
        assert_eq!(Subscription::find().count(&db).await?, 0);
        Ok(())
    }

    #[tokio::test]
    async fn test_subscriptions_are_asymmetric() -> Result<()> {
        let db = setup_test_db().await?;
        let reader = create_test_user(&db, "reader").await?;
        let writer = create_test_user(&db, "writer").await?;

        assert_eq!(subscribe(&db, reader.id, writer.id).await?, ToggleOutcome::Added);
        assert_eq!(
            subscribe(&db, reader.id, writer.id).await?,
            ToggleOutcome::AlreadyPresent
        );

        assert!(is_subscribed(&db, Some(&reader), writer.id).await?);
        assert!(!is_subscribed(&db, Some(&writer), reader.id).await?);

        assert_eq!(unsubscribe(&db, writer.id, reader.id).await?, ToggleOutcome::NotPresent);
        assert_eq!(unsubscribe(&db, reader.id, writer.id).await?, ToggleOutcome::Removed);
        Ok(())
    }

    #[tokio::test]
    async fn test_subscribe_to_missing_author() -> Result<()> {
        let db = setup_test_db().await?;
        let user = create_test_user(&db, "user").await?;

        let result = subscribe(&db, user.id, 999).await;
        assert!(matches!(result, Err(Error::NotFound { .. })));
        Ok(())
    }

    #[tokio::test]
    async fn test_list_subscriptions_with_recipe_limit() -> Result<()> {
        let (db, author, _first) = setup_with_recipe().await?;
        create_test_recipe(&db, &author, "Second", &[]).await?;
        create_test_recipe(&db, &author, "Third", &[]).await?;
        let reader = create_test_user(&db, "reader").await?;
        let _ = subscribe(&db, reader.id, author.id).await?;
        let media = test_media();

        let page =
            list_subscriptions(&db, &media, &reader, PageRequest::new(None, None, 6), Some(2))
                .await?;

        assert_eq!(page.count, 1);
        let entry = &page.results[0];
        assert_eq!(entry.id, author.id);
        assert!(entry.is_subscribed);
        assert_eq!(entry.recipes_count, 3);
        assert_eq!(entry.recipes.len(), 2);
        assert_eq!(entry.recipes[0].name, "Third");
        Ok(())
    }

    #[test]
    fn test_outcome_into_result() {
        assert!(ToggleOutcome::Added.into_result("favorites").is_ok());
        assert!(ToggleOutcome::Removed.into_result("favorites").is_ok());
        assert!(matches!(
            ToggleOutcome::AlreadyPresent.into_result("favorites"),
            Err(Error::AlreadyPresent { relation: "favorites" })
        ));
        assert!(matches!(
            ToggleOutcome::NotPresent.into_result("shopping cart"),
            Err(Error::NotPresent { .. })
        ));
    }
}
