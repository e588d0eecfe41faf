use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{foundation::error::SeneraResult, wardrobe::model::WardrobeItem};

/// Loads the photo behind a wardrobe item.
pub trait ItemImageLoader {
    /// Decode the item's photo.
    ///
    /// Returns `Ok(None)` when the photo does not exist; decode and IO failures are errors.
    fn load(&self, item: &WardrobeItem) -> SeneraResult<Option<image::DynamicImage>>;
}

/// Resolves item photos inside a local uploads directory.
///
/// Only the file name of the photo reference is used, so `/uploads/shirt.png` and
/// `http://host/uploads/shirt.png` both map to `<root>/shirt.png`.
#[derive(Clone, Debug)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    /// Loader rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Uploads directory photos are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Local path for a photo reference, or `None` if it carries no file name.
    pub fn resolve(&self, photo: &str) -> Option<PathBuf> {
        let without_query = photo.split(['?', '#']).next().unwrap_or(photo);
        let name = without_query.rsplit(['/', '\\']).next()?.trim();
        if name.is_empty() || name == "." || name == ".." {
            return None;
        }
        Some(self.root.join(name))
    }
}

impl ItemImageLoader for FsImageLoader {
    fn load(&self, item: &WardrobeItem) -> SeneraResult<Option<image::DynamicImage>> {
        let Some(path) = self.resolve(&item.photo) else {
            tracing::debug!(item = item.id.0, photo = %item.photo, "photo has no file name");
            return Ok(None);
        };
        if !path.is_file() {
            tracing::debug!(item = item.id.0, path = %path.display(), "item photo not found");
            return Ok(None);
        }
        let bytes =
            std::fs::read(&path).with_context(|| format!("read item photo '{}'", path.display()))?;
        let img = image::load_from_memory(&bytes)
            .with_context(|| format!("decode item photo '{}'", path.display()))?;
        Ok(Some(img))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collage/loader.rs"]
mod tests;
