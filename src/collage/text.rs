use std::{fmt::Write as _, path::Path, sync::Arc};

use anyhow::Context as _;

use crate::{
    foundation::core::{CanvasSize, Color},
    foundation::error::{SeneraError, SeneraResult},
};

/// Horizontal anchor of a text run relative to its `x` coordinate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextAnchor {
    /// `x` is the left edge.
    Start,
    /// `x` is the horizontal center.
    Middle,
}

/// One line of text to draw on the collage.
#[derive(Clone, Debug, PartialEq)]
pub struct TextRun {
    /// Text content (plain, unescaped).
    pub text: String,
    /// Anchor x in canvas pixels.
    pub x: f32,
    /// Baseline y in canvas pixels.
    pub baseline: f32,
    /// Font size in pixels.
    pub size_px: f32,
    /// Fill color.
    pub color: Color,
    /// How `x` is interpreted.
    pub anchor: TextAnchor,
}

/// Rasterizes text runs into a transparent overlay through an SVG document.
///
/// Fonts come from the system font database plus an optional directory of `.ttf`/`.otf`/`.ttc`
/// files. Without any font face the overlay is skipped and collages carry no text.
#[derive(Clone)]
pub struct TextRenderer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for TextRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextRenderer")
            .field("font_faces", &self.fontdb.len())
            .finish()
    }
}

impl TextRenderer {
    /// Load system fonts and, if given, every font file in `fonts_dir`.
    pub fn with_system_fonts(fonts_dir: Option<&Path>) -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        if let Some(dir) = fonts_dir {
            load_fonts_from_dir(&mut db, dir);
        }
        tracing::debug!(faces = db.len(), "loaded font database");
        Self {
            fontdb: Arc::new(db),
        }
    }

    /// Renderer without fonts; every overlay is skipped.
    pub fn without_fonts() -> Self {
        Self {
            fontdb: Arc::new(usvg::fontdb::Database::new()),
        }
    }

    /// True when at least one font face is available.
    pub fn has_fonts(&self) -> bool {
        !self.fontdb.is_empty()
    }

    /// Rasterize `runs` into a premultiplied RGBA8 layer the size of the canvas.
    ///
    /// Returns `None` when there is nothing to draw or no font is available.
    pub fn render_layer(
        &self,
        size: CanvasSize,
        runs: &[TextRun],
    ) -> SeneraResult<Option<Vec<u8>>> {
        if runs.is_empty() {
            return Ok(None);
        }
        if !self.has_fonts() {
            tracing::debug!(runs = runs.len(), "no font faces available, skipping text");
            return Ok(None);
        }

        let svg = overlay_svg(size, runs);
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            font_resolver: make_font_resolver(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(&svg, &opts).context("parse text overlay svg")?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width, size.height)
            .ok_or_else(|| SeneraError::validation("failed to allocate text overlay pixmap"))?;
        resvg::render(
            &tree,
            resvg::tiny_skia::Transform::identity(),
            &mut pixmap.as_mut(),
        );
        Ok(Some(pixmap.data().to_vec()))
    }
}

/// Build the SVG document for a set of text runs.
pub fn overlay_svg(size: CanvasSize, runs: &[TextRun]) -> String {
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = size.width,
        h = size.height
    );
    for run in runs {
        let anchor = match run.anchor {
            TextAnchor::Start => "start",
            TextAnchor::Middle => "middle",
        };
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y}" font-family="sans-serif" font-size="{s}" fill="{fill}" text-anchor="{anchor}">{text}</text>"#,
            x = run.x,
            y = run.baseline,
            s = run.size_px,
            fill = run.color.to_css(),
            text = escape_xml(&run.text),
        );
    }
    svg.push_str("</svg>");
    svg
}

fn escape_xml(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "fonts directory is not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        if let Err(err) = db.load_font_file(&path) {
            tracing::warn!(path = %path.display(), %err, "skipping unreadable font file");
        }
    }
}

/// Resolve requested families, then generic families, then any face at all.
fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);
            families.push(usvg::fontdb::Family::Monospace);

            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style: usvg::fontdb::Style::Normal,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collage/text.rs"]
mod tests;
