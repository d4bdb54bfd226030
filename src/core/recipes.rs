//! Recipe business logic - Handles creation, editing, deletion and listing of recipes.
//!
//! A recipe is written together with its tag and ingredient associations inside a
//! single database transaction. Updates replace both association sets wholesale.
//! Images are stored through [`MediaStorage`] before the transaction starts and
//! removed again if it fails.

use crate::{
    core::{
        media::MediaStorage,
        pagination::{Page, PageRequest},
        permissions::{Access, Policy},
        relations::{self, RecipeRelation},
        users::{self, UserRead},
    },
    entities::{
        Favorite, Ingredient, Recipe, RecipeIngredient, RecipeTag, ShoppingCart, Tag, User,
        favorite, ingredient, recipe, recipe_ingredient, recipe_tag, shopping_cart, tag, user,
    },
    errors::{Error, Result},
};
use sea_orm::{PaginatorTrait, QueryOrder, Set, TransactionTrait, prelude::*};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{info, instrument};

const MAX_NAME_LENGTH: usize = 200;

/// One `{id, amount}` entry of a recipe payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct IngredientAmountPayload {
    /// Ingredient ID
    pub id: i32,
    /// Quantity in the ingredient's unit
    pub amount: i32,
}

/// Body of a recipe creation request
#[derive(Debug, Clone, Deserialize)]
pub struct RecipePayload {
    /// Ingredients with amounts
    pub ingredients: Vec<IngredientAmountPayload>,
    /// Tag IDs
    pub tags: Vec<i32>,
    /// Base64 data URL
    pub image: String,
    /// Title
    pub name: String,
    /// Description
    pub text: String,
    /// Minutes
    pub cooking_time: i32,
}

/// Body of a recipe update request.
///
/// Associations are always replaced, so they are mandatory; scalar fields are
/// only touched when present.
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeUpdatePayload {
    /// New ingredient set
    pub ingredients: Vec<IngredientAmountPayload>,
    /// New tag set
    pub tags: Vec<i32>,
    /// Replacement image as a base64 data URL
    #[serde(default)]
    pub image: Option<String>,
    /// New title
    #[serde(default)]
    pub name: Option<String>,
    /// New description
    #[serde(default)]
    pub text: Option<String>,
    /// New cooking time
    #[serde(default)]
    pub cooking_time: Option<i32>,
}

/// An ingredient as listed inside a recipe
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeIngredientRead {
    /// Ingredient ID
    pub id: i32,
    /// Ingredient name
    pub name: String,
    /// Unit the amount is expressed in
    pub measurement_unit: String,
    /// Quantity used by the recipe
    pub amount: i32,
}

/// Full recipe representation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeRead {
    /// Recipe ID
    pub id: i32,
    /// Tags ordered by ID
    pub tags: Vec<tag::Model>,
    /// The author as seen by the viewer
    pub author: UserRead,
    /// Ingredients with amounts
    pub ingredients: Vec<RecipeIngredientRead>,
    /// Whether the viewer favorited the recipe
    pub is_favorited: bool,
    /// Whether the recipe is in the viewer's shopping cart
    pub is_in_shopping_cart: bool,
    /// Title
    pub name: String,
    /// Public image URL
    pub image: String,
    /// Description
    pub text: String,
    /// Minutes
    pub cooking_time: i32,
}

/// Compact recipe representation used in toggles and subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipeShort {
    /// Recipe ID
    pub id: i32,
    /// Title
    pub name: String,
    /// Public image URL
    pub image: String,
    /// Minutes
    pub cooking_time: i32,
}

/// Builds the compact representation of a recipe.
#[must_use]
pub fn recipe_short(media: &MediaStorage, recipe: recipe::Model) -> RecipeShort {
    RecipeShort {
        id: recipe.id,
        image: media.url_for(&recipe.image),
        name: recipe.name,
        cooking_time: recipe.cooking_time,
    }
}

/// Filters accepted by [`list_recipes`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecipeFilter {
    /// Author ID, or username when not numeric
    pub author: Option<String>,
    /// Tag slugs; a recipe matches when it carries any of them
    pub tags: Vec<String>,
    /// Only recipes the viewer favorited
    pub is_favorited: bool,
    /// Only recipes in the viewer's shopping cart
    pub is_in_shopping_cart: bool,
}

fn validate_name(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_NAME_LENGTH {
        return Err(Error::validation(format!(
            "Recipe name must be between 1 and {MAX_NAME_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_text(text: &str) -> Result<()> {
    if text.trim().is_empty() {
        return Err(Error::validation("Recipe text cannot be empty"));
    }
    Ok(())
}

fn validate_cooking_time(cooking_time: i32) -> Result<()> {
    if cooking_time < 1 {
        return Err(Error::validation("Cooking time must be at least 1 minute"));
    }
    Ok(())
}

fn validate_associations(ingredients: &[IngredientAmountPayload], tags: &[i32]) -> Result<()> {
    if ingredients.is_empty() {
        return Err(Error::validation("A recipe needs at least one ingredient"));
    }

    let mut seen = HashSet::new();
    for item in ingredients {
        if item.amount < 1 {
            return Err(Error::validation(format!(
                "Amount of ingredient {} must be at least 1",
                item.id
            )));
        }
        if !seen.insert(item.id) {
            return Err(Error::validation(format!(
                "Ingredient {} is listed more than once",
                item.id
            )));
        }
    }

    let mut seen = HashSet::new();
    if let Some(tag_id) = tags.iter().find(|id| !seen.insert(**id)) {
        return Err(Error::validation(format!("Tag {tag_id} is listed more than once")));
    }
    Ok(())
}

/// Checks that every referenced tag and ingredient exists. Callers pass
/// duplicate-free ID lists, so comparing counts is enough.
async fn ensure_references_exist<C>(
    db: &C,
    ingredients: &[IngredientAmountPayload],
    tags: &[i32],
) -> Result<()>
where
    C: ConnectionTrait,
{
    let ingredient_ids: Vec<i32> = ingredients.iter().map(|item| item.id).collect();
    let found = Ingredient::find()
        .filter(ingredient::Column::Id.is_in(ingredient_ids))
        .count(db)
        .await?;
    if found != ingredients.len() as u64 {
        return Err(Error::validation("Some of the ingredients do not exist"));
    }

    if !tags.is_empty() {
        let found = Tag::find()
            .filter(tag::Column::Id.is_in(tags.iter().copied()))
            .count(db)
            .await?;
        if found != tags.len() as u64 {
            return Err(Error::validation("Some of the tags do not exist"));
        }
    }
    Ok(())
}

/// Inserts the tag and ingredient links of a recipe.
async fn link_associations<C>(
    db: &C,
    recipe_id: i32,
    ingredients: &[IngredientAmountPayload],
    tags: &[i32],
) -> Result<()>
where
    C: ConnectionTrait,
{
    if !tags.is_empty() {
        RecipeTag::insert_many(tags.iter().map(|tag_id| recipe_tag::ActiveModel {
            recipe_id: Set(recipe_id),
            tag_id: Set(*tag_id),
        }))
        .exec_without_returning(db)
        .await?;
    }

    if !ingredients.is_empty() {
        RecipeIngredient::insert_many(ingredients.iter().map(|item| {
            recipe_ingredient::ActiveModel {
                recipe_id: Set(recipe_id),
                ingredient_id: Set(item.id),
                amount: Set(item.amount),
            }
        }))
        .exec_without_returning(db)
        .await?;
    }
    Ok(())
}

/// Removes the tag and ingredient links of a recipe.
async fn unlink_associations<C>(db: &C, recipe_id: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    RecipeTag::delete_many()
        .filter(recipe_tag::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    RecipeIngredient::delete_many()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe_id))
        .exec(db)
        .await?;
    Ok(())
}

async fn insert_recipe(
    db: &DatabaseConnection,
    author: &user::Model,
    payload: &RecipePayload,
    image: &str,
) -> Result<recipe::Model> {
    let txn = db.begin().await?;

    ensure_references_exist(&txn, &payload.ingredients, &payload.tags).await?;

    let recipe = recipe::ActiveModel {
        name: Set(payload.name.trim().to_string()),
        text: Set(payload.text.clone()),
        cooking_time: Set(payload.cooking_time),
        image: Set(image.to_string()),
        author_id: Set(author.id),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    }
    .insert(&txn)
    .await?;

    link_associations(&txn, recipe.id, &payload.ingredients, &payload.tags).await?;

    txn.commit().await?;
    Ok(recipe)
}

/// Creates a recipe authored by `actor`, who must be authenticated.
///
/// The payload is fully validated before anything is written; the recipe row
/// and its associations are committed together.
#[instrument(skip(db, media, actor, payload), fields(author_id = ?actor.map(|user| user.id)))]
pub async fn create_recipe(
    db: &DatabaseConnection,
    media: &MediaStorage,
    actor: Option<&user::Model>,
    payload: RecipePayload,
) -> Result<recipe::Model> {
    let author = Policy::AuthenticatedOrReadOnly.acting_user(Access::Write, actor)?;
    validate_name(&payload.name)?;
    validate_text(&payload.text)?;
    validate_cooking_time(payload.cooking_time)?;
    validate_associations(&payload.ingredients, &payload.tags)?;

    let image = media.save_image(&payload.image).await?;
    match insert_recipe(db, author, &payload, &image).await {
        Ok(recipe) => {
            info!("Created recipe {}", recipe.id);
            Ok(recipe)
        }
        Err(e) => {
            media.remove(&image).await;
            Err(e)
        }
    }
}

async fn apply_update(
    db: &DatabaseConnection,
    recipe: recipe::Model,
    payload: &RecipeUpdatePayload,
    image: Option<&str>,
) -> Result<recipe::Model> {
    let txn = db.begin().await?;

    ensure_references_exist(&txn, &payload.ingredients, &payload.tags).await?;

    let recipe_id = recipe.id;
    let mut active: recipe::ActiveModel = recipe.into();
    if let Some(name) = &payload.name {
        active.name = Set(name.trim().to_string());
    }
    if let Some(text) = &payload.text {
        active.text = Set(text.clone());
    }
    if let Some(cooking_time) = payload.cooking_time {
        active.cooking_time = Set(cooking_time);
    }
    if let Some(image) = image {
        active.image = Set(image.to_string());
    }
    let updated = active.update(&txn).await?;

    unlink_associations(&txn, recipe_id).await?;
    link_associations(&txn, recipe_id, &payload.ingredients, &payload.tags).await?;

    txn.commit().await?;
    Ok(updated)
}

/// Updates a recipe on behalf of `actor`, who must be its author or staff.
///
/// Tags and ingredients from the payload replace the stored sets; nothing from
/// the previous sets survives.
#[instrument(skip(db, media, actor, payload))]
pub async fn update_recipe(
    db: &DatabaseConnection,
    media: &MediaStorage,
    actor: Option<&user::Model>,
    recipe_id: i32,
    payload: RecipeUpdatePayload,
) -> Result<recipe::Model> {
    Policy::AuthorOrStaffOrReadOnly.check(Access::Write, actor)?;
    let recipe = get_recipe(db, recipe_id).await?;
    Policy::AuthorOrStaffOrReadOnly.check_object(Access::Write, actor, recipe.author_id)?;

    if let Some(name) = &payload.name {
        validate_name(name)?;
    }
    if let Some(text) = &payload.text {
        validate_text(text)?;
    }
    if let Some(cooking_time) = payload.cooking_time {
        validate_cooking_time(cooking_time)?;
    }
    validate_associations(&payload.ingredients, &payload.tags)?;

    let new_image = match &payload.image {
        Some(data_url) => Some(media.save_image(data_url).await?),
        None => None,
    };
    let old_image = recipe.image.clone();

    match apply_update(db, recipe, &payload, new_image.as_deref()).await {
        Ok(updated) => {
            if new_image.is_some() {
                media.remove(&old_image).await;
            }
            info!("Updated recipe {recipe_id}");
            Ok(updated)
        }
        Err(e) => {
            if let Some(image) = &new_image {
                media.remove(image).await;
            }
            Err(e)
        }
    }
}

/// Deletes a recipe with every row that points at it.
#[instrument(skip(db, media, actor))]
pub async fn delete_recipe(
    db: &DatabaseConnection,
    media: &MediaStorage,
    actor: Option<&user::Model>,
    recipe_id: i32,
) -> Result<()> {
    Policy::AuthorOrStaffOrReadOnly.check(Access::Write, actor)?;
    let recipe = get_recipe(db, recipe_id).await?;
    Policy::AuthorOrStaffOrReadOnly.check_object(Access::Write, actor, recipe.author_id)?;

    let txn = db.begin().await?;
    unlink_associations(&txn, recipe_id).await?;
    Favorite::delete_many()
        .filter(favorite::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    ShoppingCart::delete_many()
        .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
        .exec(&txn)
        .await?;
    Recipe::delete_by_id(recipe_id).exec(&txn).await?;
    txn.commit().await?;

    media.remove(&recipe.image).await;
    info!("Deleted recipe {recipe_id}");
    Ok(())
}

/// Retrieves a recipe row or fails with [`Error::NotFound`].
pub async fn get_recipe(db: &DatabaseConnection, recipe_id: i32) -> Result<recipe::Model> {
    Recipe::find_by_id(recipe_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Recipe", recipe_id))
}

/// Full representation of `recipe` as seen by `viewer`.
pub async fn recipe_read(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<&user::Model>,
    recipe: recipe::Model,
) -> Result<RecipeRead> {
    let tags = recipe
        .find_related(Tag)
        .order_by_asc(tag::Column::Id)
        .all(db)
        .await?;

    let ingredients = RecipeIngredient::find()
        .filter(recipe_ingredient::Column::RecipeId.eq(recipe.id))
        .order_by_asc(recipe_ingredient::Column::IngredientId)
        .find_also_related(Ingredient)
        .all(db)
        .await?
        .into_iter()
        .filter_map(|(link, ingredient)| {
            ingredient.map(|ingredient| RecipeIngredientRead {
                id: ingredient.id,
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: link.amount,
            })
        })
        .collect();

    let author = users::get_user_by_id(db, recipe.author_id).await?;
    let author = users::user_read(db, viewer, author).await?;
    let is_favorited =
        relations::is_in_relation(db, RecipeRelation::Favorite, viewer, recipe.id).await?;
    let is_in_shopping_cart =
        relations::is_in_relation(db, RecipeRelation::ShoppingCart, viewer, recipe.id).await?;

    Ok(RecipeRead {
        id: recipe.id,
        tags,
        author,
        ingredients,
        is_favorited,
        is_in_shopping_cart,
        name: recipe.name,
        image: media.url_for(&recipe.image),
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    })
}

/// Loads one recipe and renders it for `viewer`.
pub async fn get_recipe_read(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<&user::Model>,
    recipe_id: i32,
) -> Result<RecipeRead> {
    let recipe = get_recipe(db, recipe_id).await?;
    recipe_read(db, media, viewer, recipe).await
}

/// Resolves an author filter value to a user ID. Numeric values are IDs,
/// anything else is looked up as a username.
async fn resolve_author(db: &DatabaseConnection, author: &str) -> Result<Option<i32>> {
    if let Ok(id) = author.parse::<i32>() {
        return Ok(Some(id));
    }

    Ok(User::find()
        .filter(user::Column::Username.eq(author))
        .one(db)
        .await?
        .map(|user| user.id))
}

async fn recipe_ids_with_tags(db: &DatabaseConnection, slugs: &[String]) -> Result<Vec<i32>> {
    let tag_ids: Vec<i32> = Tag::find()
        .filter(tag::Column::Slug.is_in(slugs.iter().map(String::as_str)))
        .all(db)
        .await?
        .into_iter()
        .map(|tag| tag.id)
        .collect();
    if tag_ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut ids: Vec<i32> = RecipeTag::find()
        .filter(recipe_tag::Column::TagId.is_in(tag_ids))
        .all(db)
        .await?
        .into_iter()
        .map(|link| link.recipe_id)
        .collect();
    ids.sort_unstable();
    ids.dedup();
    Ok(ids)
}

/// Lists recipes newest first, narrowed by `filter`.
///
/// Relation filters need a viewer; for anonymous viewers they match nothing.
pub async fn list_recipes(
    db: &DatabaseConnection,
    media: &MediaStorage,
    viewer: Option<&user::Model>,
    filter: &RecipeFilter,
    request: PageRequest,
) -> Result<Page<RecipeRead>> {
    let mut query = Recipe::find();

    if let Some(author) = filter.author.as_deref().map(str::trim).filter(|a| !a.is_empty()) {
        let Some(author_id) = resolve_author(db, author).await? else {
            return Ok(Page::empty(request));
        };
        query = query.filter(recipe::Column::AuthorId.eq(author_id));
    }

    if !filter.tags.is_empty() {
        let ids = recipe_ids_with_tags(db, &filter.tags).await?;
        if ids.is_empty() {
            return Ok(Page::empty(request));
        }
        query = query.filter(recipe::Column::Id.is_in(ids));
    }

    for (wanted, relation) in [
        (filter.is_favorited, RecipeRelation::Favorite),
        (filter.is_in_shopping_cart, RecipeRelation::ShoppingCart),
    ] {
        if !wanted {
            continue;
        }
        let Some(viewer) = viewer else {
            return Ok(Page::empty(request));
        };
        let ids = relations::recipe_ids_in_relation(db, relation, viewer.id).await?;
        if ids.is_empty() {
            return Ok(Page::empty(request));
        }
        query = query.filter(recipe::Column::Id.is_in(ids));
    }

    let paginator = query
        .order_by_desc(recipe::Column::CreatedAt)
        .order_by_desc(recipe::Column::Id)
        .paginate(db, request.limit);
    let count = paginator.num_items().await?;
    let recipes = paginator.fetch_page(request.index()).await?;

    let mut results = Vec::with_capacity(recipes.len());
    for recipe in recipes {
        results.push(recipe_read(db, media, viewer, recipe).await?);
    }
    Ok(Page::new(results, count, request))
}
