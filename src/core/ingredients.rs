//! Ingredient business logic - search, lookup and bulk import.

use crate::{
    config::ingredients::IngredientRecord,
    entities::{Ingredient, ingredient},
    errors::{Error, Result},
};
use sea_orm::{
    PaginatorTrait, QueryOrder, Set, TransactionTrait,
    prelude::*,
    sea_query::{Expr, LikeExpr},
};
use tracing::{info, instrument};

const LIKE_ESCAPE: char = '\\';

/// `%needle%` with the `LIKE` wildcards in `needle` matched literally.
fn contains_pattern(needle: &str) -> LikeExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');
    LikeExpr::new(pattern).escape(LIKE_ESCAPE)
}

fn new_ingredient(name: String, measurement_unit: String) -> ingredient::ActiveModel {
    ingredient::ActiveModel {
        search_name: Set(name.to_lowercase()),
        name: Set(name),
        measurement_unit: Set(measurement_unit),
        ..Default::default()
    }
}

/// Lists ingredients ordered by name, optionally restricted to names
/// containing `name` (case-insensitive).
///
/// SQLite only folds ASCII in `LIKE`, so matching runs against the stored
/// lower-cased name instead.
pub async fn list_ingredients(
    db: &DatabaseConnection,
    name: Option<&str>,
) -> Result<Vec<ingredient::Model>> {
    let mut query = Ingredient::find().order_by_asc(ingredient::Column::Name);

    if let Some(name) = name.map(str::trim).filter(|name| !name.is_empty()) {
        query = query.filter(
            Expr::col(ingredient::Column::SearchName).like(contains_pattern(&name.to_lowercase())),
        );
    }

    query.all(db).await.map_err(Into::into)
}

/// Retrieves one ingredient or fails with [`Error::NotFound`].
pub async fn get_ingredient(db: &DatabaseConnection, ingredient_id: i32) -> Result<ingredient::Model> {
    Ingredient::find_by_id(ingredient_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Ingredient", ingredient_id))
}

/// Creates a single ingredient.
pub async fn create_ingredient(
    db: &DatabaseConnection,
    name: &str,
    measurement_unit: &str,
) -> Result<ingredient::Model> {
    if name.trim().is_empty() || measurement_unit.trim().is_empty() {
        return Err(Error::validation(
            "Ingredient name and measurement unit cannot be empty",
        ));
    }

    new_ingredient(name.trim().to_string(), measurement_unit.trim().to_string())
        .insert(db).await.map_err(Into::into)
}

/// Bulk-loads ingredient reference data.
///
/// The import only runs against an empty table, so re-running it is a no-op.
/// All rows are inserted in one transaction. Returns the number of rows
/// inserted.
#[instrument(skip(db, records), fields(rows = records.len()))]
pub async fn import_ingredients(
    db: &DatabaseConnection,
    records: Vec<IngredientRecord>,
) -> Result<usize> {
    if Ingredient::find().count(db).await? > 0 {
        info!("Ingredients already loaded, skipping import");
        return Ok(0);
    }

    let models: Vec<ingredient::ActiveModel> = records
        .into_iter()
        .filter(|record| !record.name.is_empty() && !record.measurement_unit.is_empty())
        .map(|record| new_ingredient(record.name, record.measurement_unit))
        .collect();
    let inserted = models.len();

    let txn = db.begin().await?;
    // SQLite caps the number of bound variables per statement
    for chunk in models.chunks(500) {
        Ingredient::insert_many(chunk.to_vec())
            .exec_without_returning(&txn)
            .await?;
    }
    txn.commit().await?;

    info!("Imported {inserted} ingredients");
    Ok(inserted)
}
