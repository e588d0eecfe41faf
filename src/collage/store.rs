use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{
    collage::canvas::Canvas,
    foundation::error::{SeneraError, SeneraResult},
};

/// Persists rendered images and hands back where they ended up.
pub trait ImageStore {
    /// Encode `canvas` as PNG and store it under `filename`.
    fn save_canvas(&self, canvas: &Canvas, filename: &str) -> SeneraResult<PathBuf>;

    /// Store already-encoded image bytes under `filename`.
    fn save_bytes(&self, bytes: &[u8], filename: &str) -> SeneraResult<PathBuf>;

    /// Public URL path under which a stored file is served.
    fn public_url(&self, filename: &str) -> String {
        format!("/uploads/{filename}")
    }
}

/// Stores files in a local directory, creating it on first write.
#[derive(Clone, Debug)]
pub struct FsImageStore {
    dir: PathBuf,
    url_prefix: String,
}

impl FsImageStore {
    /// Store rooted at `dir`, served under `/uploads`.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            url_prefix: "/uploads".to_string(),
        }
    }

    /// Override the URL prefix returned by [`ImageStore::public_url`].
    pub fn with_url_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.url_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Directory files are written to.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn target(&self, filename: &str) -> SeneraResult<PathBuf> {
        let valid = !filename.is_empty()
            && !filename.contains(['/', '\\'])
            && filename != "."
            && filename != "..";
        if !valid {
            return Err(SeneraError::validation(format!(
                "invalid output file name '{filename}'"
            )));
        }
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create uploads dir '{}'", self.dir.display()))?;
        Ok(self.dir.join(filename))
    }
}

impl ImageStore for FsImageStore {
    fn save_canvas(&self, canvas: &Canvas, filename: &str) -> SeneraResult<PathBuf> {
        let png = canvas.encode_png()?;
        self.save_bytes(&png, filename)
    }

    fn save_bytes(&self, bytes: &[u8], filename: &str) -> SeneraResult<PathBuf> {
        let path = self.target(filename)?;
        std::fs::write(&path, bytes).with_context(|| format!("write '{}'", path.display()))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), "stored image");
        Ok(path)
    }

    fn public_url(&self, filename: &str) -> String {
        format!("{}/{filename}", self.url_prefix)
    }
}

/// `<prefix>_<YYYYMMDDhhmmssmmm>.png` for the given instant.
///
/// Two calls within the same millisecond collide; callers accept that.
pub fn timestamped_name(prefix: &str, at: time::OffsetDateTime) -> SeneraResult<String> {
    let format = time::macros::format_description!(
        "[year][month][day][hour][minute][second][subsecond digits:3]"
    );
    let stamp = at.format(&format).context("format output timestamp")?;
    Ok(format!("{prefix}_{stamp}.png"))
}

/// [`timestamped_name`] for the current UTC time.
pub fn timestamped_name_now(prefix: &str) -> SeneraResult<String> {
    timestamped_name(prefix, time::OffsetDateTime::now_utc())
}

#[cfg(test)]
#[path = "../../tests/unit/collage/store.rs"]
mod tests;
