//! Storage for uploaded recipe images.
//!
//! Clients send images inline as data URLs (`data:image/png;base64,...`).
//! They are decoded and written below the media root under a random name;
//! the database keeps only the relative path.

use crate::errors::{Error, Result};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Subdirectory of the media root recipe images go to
pub const RECIPE_IMAGE_DIR: &str = "recipes/images";

/// Filesystem-backed media storage
#[derive(Debug, Clone)]
pub struct MediaStorage {
    root: PathBuf,
    url_prefix: String,
}

impl MediaStorage {
    /// Creates a storage rooted at `root`, served under `url_prefix`.
    pub fn new(root: impl Into<PathBuf>, url_prefix: impl Into<String>) -> Self {
        let mut url_prefix = url_prefix.into();
        if !url_prefix.ends_with('/') {
            url_prefix.push('/');
        }

        Self {
            root: root.into(),
            url_prefix,
        }
    }

    /// Directory files are written under.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// URL prefix files are served under, always ending in `/`.
    #[must_use]
    pub fn url_prefix(&self) -> &str {
        &self.url_prefix
    }

    /// Public URL of a stored file.
    #[must_use]
    pub fn url_for(&self, relative_path: &str) -> String {
        format!("{}{relative_path}", self.url_prefix)
    }

    /// Decodes a data URL and stores it, returning the relative path.
    pub async fn save_image(&self, data_url: &str) -> Result<String> {
        let (extension, bytes) = decode_data_url(data_url)?;

        let relative_path = format!("{RECIPE_IMAGE_DIR}/{}.{extension}", uuid::Uuid::new_v4());
        let full_path = self.root.join(&relative_path);
        if let Some(parent) = full_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&full_path, bytes).await?;

        debug!("Stored image at {}", full_path.display());
        Ok(relative_path)
    }

    /// Deletes a stored file. Failures are logged, not returned.
    pub async fn remove(&self, relative_path: &str) {
        if relative_path.is_empty() {
            return;
        }

        if let Err(e) = tokio::fs::remove_file(self.root.join(relative_path)).await {
            warn!("Failed to remove media file {relative_path}: {e}");
        }
    }
}

/// Splits a `data:image/<type>;base64,<payload>` URL into a file extension
/// and the decoded bytes.
pub fn decode_data_url(data_url: &str) -> Result<(&'static str, Vec<u8>)> {
    let (header, payload) = data_url
        .split_once(',')
        .ok_or_else(|| Error::validation("Image must be a base64 data URL"))?;

    let mime = header
        .strip_prefix("data:")
        .and_then(|rest| rest.strip_suffix(";base64"))
        .ok_or_else(|| Error::validation("Image must be a base64 data URL"))?;

    let extension = match mime {
        "image/png" => "png",
        "image/jpeg" | "image/jpg" => "jpg",
        "image/gif" => "gif",
        "image/webp" => "webp",
        other => return Err(Error::validation(format!("Unsupported image type: {other}"))),
    };

    let bytes = STANDARD
        .decode(payload.trim())
        .map_err(|e| Error::validation(format!("Invalid base64 image: {e}")))?;

    if bytes.is_empty() {
        return Err(Error::validation("Image is empty"));
    }

    Ok((extension, bytes))
}
