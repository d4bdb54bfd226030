//! Shopping list generation.
//!
//! Walks every recipe in a user's shopping cart, sums ingredient amounts per
//! `(name, measurement unit)` pair and renders the result as plain text lines
//! such as `Salt (g) - 15`. Aggregation and rendering are pure functions so the
//! HTTP layer only has to wrap the text in an attachment.

use crate::{
    core::relations::{self, RecipeRelation},
    entities::{Ingredient, RecipeIngredient, recipe_ingredient},
    errors::Result,
};
use sea_orm::prelude::*;
use std::{collections::BTreeMap, fmt::Write};
use tracing::debug;

/// File name offered to clients downloading the list
pub const EXPORT_FILE_NAME: &str = "cart.txt";

/// One ingredient occurrence inside a cart recipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartLine {
    /// Ingredient name
    pub name: String,
    /// Measurement unit
    pub measurement_unit: String,
    /// Amount used by one recipe
    pub amount: i32,
}

/// Collects the ingredient lines of every recipe in the user's cart.
pub async fn collect(db: &DatabaseConnection, user_id: i32) -> Result<Vec<CartLine>> {
    let recipe_ids =
        relations::recipe_ids_in_relation(db, RecipeRelation::ShoppingCart, user_id).await?;
    if recipe_ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = RecipeIngredient::find()
        .filter(recipe_ingredient::Column::RecipeId.is_in(recipe_ids))
        .find_also_related(Ingredient)
        .all(db)
        .await?;

    Ok(rows
        .into_iter()
        .filter_map(|(link, ingredient)| {
            ingredient.map(|ingredient| CartLine {
                name: ingredient.name,
                measurement_unit: ingredient.measurement_unit,
                amount: link.amount,
            })
        })
        .collect())
}

/// Sums amounts per `(name, unit)`. The map keeps keys sorted.
#[must_use]
pub fn aggregate(lines: Vec<CartLine>) -> BTreeMap<(String, String), i64> {
    let mut totals = BTreeMap::new();
    for line in lines {
        *totals
            .entry((line.name, line.measurement_unit))
            .or_insert(0) += i64::from(line.amount);
    }
    totals
}

fn capitalize(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Renders totals as `"<Name> (<unit>) - <amount>\n"` lines.
#[must_use]
pub fn render(totals: &BTreeMap<(String, String), i64>) -> String {
    let mut output = String::new();
    for ((name, unit), amount) in totals {
        // Writing into a String cannot fail
        let _ = writeln!(output, "{} ({unit}) - {amount}", capitalize(name));
    }
    output
}

/// Builds the shopping list text for a user. An empty cart gives an empty string.
pub async fn export_shopping_cart(db: &DatabaseConnection, user_id: i32) -> Result<String> {
    let lines = collect(db, user_id).await?;
    let totals = aggregate(lines);
    debug!("Shopping list for user {user_id} has {} entries", totals.len());
    Ok(render(&totals))
}
