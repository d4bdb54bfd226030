//! Tag business logic - listing, lookup and seeding of reference tags.

use crate::{
    config::tags::TagConfig,
    entities::{Tag, tag},
    errors::{Error, Result},
};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

const MAX_TAG_LENGTH: usize = 200;

/// Retrieves all tags ordered by name.
pub async fn list_tags(db: &DatabaseConnection) -> Result<Vec<tag::Model>> {
    Tag::find()
        .order_by_asc(tag::Column::Name)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Retrieves one tag or fails with [`Error::NotFound`].
pub async fn get_tag(db: &DatabaseConnection, tag_id: i32) -> Result<tag::Model> {
    Tag::find_by_id(tag_id)
        .one(db)
        .await?
        .ok_or_else(|| Error::not_found("Tag", tag_id))
}

/// Finds a tag by slug.
pub async fn get_tag_by_slug(db: &DatabaseConnection, slug: &str) -> Result<Option<tag::Model>> {
    Tag::find()
        .filter(tag::Column::Slug.eq(slug))
        .one(db)
        .await
        .map_err(Into::into)
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].chars().all(|c| c.is_ascii_hexdigit())
}

fn is_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

/// Creates a tag after validating name, slug and color.
pub async fn create_tag(
    db: &DatabaseConnection,
    name: &str,
    color: Option<&str>,
    slug: &str,
) -> Result<tag::Model> {
    let name = name.trim();
    if name.is_empty() || name.chars().count() > MAX_TAG_LENGTH {
        return Err(Error::validation("Tag name must be between 1 and 200 characters"));
    }
    if !is_slug(slug) || slug.len() > MAX_TAG_LENGTH {
        return Err(Error::validation(format!("Invalid slug: {slug}")));
    }
    if let Some(color) = color.filter(|color| !is_hex_color(color)) {
        return Err(Error::validation(format!("Invalid HEX color: {color}")));
    }
    if get_tag_by_slug(db, slug).await?.is_some() {
        return Err(Error::validation(format!("Tag with slug {slug} already exists")));
    }

    let tag = tag::ActiveModel {
        name: Set(name.to_string()),
        color: Set(color.map(str::to_uppercase)),
        slug: Set(slug.to_string()),
        ..Default::default()
    };
    tag.insert(db).await.map_err(Into::into)
}

/// Inserts the configured tags whose slugs are not in the database yet.
///
/// Returns how many tags were created.
#[instrument(skip(db, tags))]
pub async fn seed_tags(db: &DatabaseConnection, tags: &[TagConfig]) -> Result<usize> {
    let mut created = 0;
    for tag in tags {
        if get_tag_by_slug(db, &tag.slug).await?.is_some() {
            debug!("Tag {} already present, skipping", tag.slug);
            continue;
        }
        create_tag(db, &tag.name, tag.color.as_deref(), &tag.slug).await?;
        created += 1;
    }

    info!("Seeded {created} of {} configured tags", tags.len());
    Ok(created)
}
