use crate::{
    collage::{
        canvas::{Canvas, PremulImage},
        loader::ItemImageLoader,
        text::{TextAnchor, TextRenderer, TextRun},
    },
    foundation::core::{Color, Rect},
    foundation::error::SeneraResult,
    layout::planner::{Band, ItemSlot, LayoutConfig, LayoutPlan},
    wardrobe::model::{ItemId, WardrobeItem},
};

const PLACEHOLDER_FILL: Color = Color::from_hex(0xf0f0f0);
const PLACEHOLDER_OUTLINE: Color = Color::from_hex(0xdddddd);
const ERROR_FILL: Color = Color::from_hex(0xffe0e0);
const ERROR_OUTLINE: Color = Color::from_hex(0xff9999);

const CAPTION_TAGS: usize = 2;
const CAPTION_MAX_CHARS: usize = 15;
const CAPTION_KEEP_CHARS: usize = 12;

/// Message painted on a collage with no selected items.
pub const EMPTY_MESSAGE: &str = "No matching items found";

/// What happened to one item slot during composition.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum SlotOutcome {
    /// The item photo was scaled and drawn.
    Painted,
    /// No photo was found; a neutral placeholder was drawn.
    Missing,
    /// The photo could not be used; an error placeholder was drawn.
    Failed {
        /// Why the photo was rejected.
        detail: String,
    },
}

/// Outcome of one slot, keyed by category and item.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct SlotReport {
    /// Band category.
    pub category: String,
    /// Item painted into the slot.
    pub item: ItemId,
    /// What was painted.
    #[serde(flatten)]
    pub outcome: SlotOutcome,
}

/// Per-slot diagnostics for a composed collage.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct CompositionReport {
    /// Slot outcomes in paint order.
    pub slots: Vec<SlotReport>,
    /// True when text was requested but could not be drawn.
    pub text_skipped: bool,
}

impl CompositionReport {
    /// Slots whose photo was drawn.
    pub fn painted(&self) -> usize {
        self.count(|o| matches!(o, SlotOutcome::Painted))
    }

    /// Slots that fell back to the neutral placeholder.
    pub fn missing(&self) -> usize {
        self.count(|o| matches!(o, SlotOutcome::Missing))
    }

    /// Slots that fell back to the error placeholder.
    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, SlotOutcome::Failed { .. }))
    }

    fn count(&self, pred: impl Fn(&SlotOutcome) -> bool) -> usize {
        self.slots.iter().filter(|s| pred(&s.outcome)).count()
    }
}

/// A painted collage and its diagnostics.
#[derive(Clone, Debug)]
pub struct Composed {
    /// The collage raster.
    pub canvas: Canvas,
    /// What happened to every slot.
    pub report: CompositionReport,
}

/// Paint `plan` into a fresh white canvas.
///
/// Item photo problems never fail the call; they become placeholders and show up in the report.
/// An empty plan yields a canvas carrying only [`EMPTY_MESSAGE`].
#[tracing::instrument(skip_all, fields(bands = plan.bands.len(), slots = plan.slot_count()))]
pub fn compose(
    plan: &LayoutPlan,
    config: &LayoutConfig,
    loader: &dyn ItemImageLoader,
    text: &TextRenderer,
) -> SeneraResult<Composed> {
    let mut canvas = Canvas::new(plan.canvas, Color::WHITE);
    let mut report = CompositionReport::default();
    let mut runs = Vec::new();

    if plan.is_empty() {
        runs.push(TextRun {
            text: EMPTY_MESSAGE.to_string(),
            x: plan.canvas.width as f32 / 2.0,
            baseline: plan.canvas.height as f32 / 2.0,
            size_px: config.label_font_size as f32,
            color: Color::BLACK,
            anchor: TextAnchor::Middle,
        });
    }

    for band in &plan.bands {
        for slot in &band.slots {
            let outcome = paint_slot(&mut canvas, slot, config, loader, &mut runs)?;
            if let SlotOutcome::Failed { detail } = &outcome {
                tracing::warn!(
                    item = slot.item.id.0,
                    category = %band.category,
                    %detail,
                    "item photo replaced by error placeholder"
                );
            }
            report.slots.push(SlotReport {
                category: band.category.clone(),
                item: slot.item.id,
                outcome,
            });
            if let Some(caption) = caption_text(&slot.item) {
                runs.push(caption_run(slot, caption, config));
            }
        }
        runs.push(label_run(band, config));
    }

    match text.render_layer(plan.canvas, &runs) {
        Ok(Some(layer)) => canvas.draw_layer(&layer)?,
        Ok(None) => report.text_skipped = !runs.is_empty(),
        Err(err) => {
            tracing::warn!(%err, "text overlay failed, collage left without text");
            report.text_skipped = true;
        }
    }

    Ok(Composed { canvas, report })
}

fn paint_slot(
    canvas: &mut Canvas,
    slot: &ItemSlot,
    config: &LayoutConfig,
    loader: &dyn ItemImageLoader,
    runs: &mut Vec<TextRun>,
) -> SeneraResult<SlotOutcome> {
    let placeholder = slot.image.inset(config.image_inset / 2);
    let size_px = config.caption_font_size as f32;

    let failure = match loader.load(&slot.item) {
        Ok(Some(img)) => match fit_image(&img, slot.image, config.image_inset) {
            Ok((scaled, x, y)) => {
                canvas.draw_image(&scaled, x, y)?;
                return Ok(SlotOutcome::Painted);
            }
            Err(detail) => detail,
        },
        Ok(None) => {
            canvas.fill_rect(placeholder, PLACEHOLDER_FILL);
            canvas.stroke_rect(placeholder, PLACEHOLDER_OUTLINE);
            let (cx, cy) = slot.image.center();
            runs.push(TextRun {
                text: "No image".to_string(),
                x: cx as f32,
                baseline: cy as f32 + size_px / 2.0,
                size_px,
                color: Color::GRAY,
                anchor: TextAnchor::Middle,
            });
            return Ok(SlotOutcome::Missing);
        }
        Err(err) => err.to_string(),
    };

    canvas.fill_rect(placeholder, ERROR_FILL);
    canvas.stroke_rect(placeholder, ERROR_OUTLINE);
    runs.push(TextRun {
        text: "Error".to_string(),
        x: (slot.image.x + 5) as f32,
        baseline: (slot.image.y + 5) as f32 + size_px,
        size_px,
        color: Color::RED,
        anchor: TextAnchor::Start,
    });
    Ok(SlotOutcome::Failed { detail: failure })
}

/// Scale `img` to fit `area` minus `inset`, keeping aspect ratio, and center it.
fn fit_image(
    img: &image::DynamicImage,
    area: Rect,
    inset: u32,
) -> Result<(PremulImage, u32, u32), String> {
    let (iw, ih) = (img.width(), img.height());
    if iw == 0 || ih == 0 {
        return Err("image has no pixels".to_string());
    }
    let max_w = area.width.saturating_sub(inset);
    let max_h = area.height.saturating_sub(inset);
    if max_w == 0 || max_h == 0 {
        return Err("slot too small for an image".to_string());
    }

    let scale = (f64::from(max_w) / f64::from(iw)).min(f64::from(max_h) / f64::from(ih));
    let new_w = ((f64::from(iw) * scale) as u32).clamp(1, max_w);
    let new_h = ((f64::from(ih) * scale) as u32).clamp(1, max_h);

    let resized = image::imageops::resize(
        &img.to_rgba8(),
        new_w,
        new_h,
        image::imageops::FilterType::Lanczos3,
    );
    let x = area.x + (area.width - new_w) / 2;
    let y = area.y + (area.height - new_h) / 2;
    Ok((PremulImage::from_rgba(resized), x, y))
}

/// Caption for an item: its first two tags joined by `,`, shortened with `...` past 15 chars.
pub fn caption_text(item: &WardrobeItem) -> Option<String> {
    let joined = item
        .tags
        .iter()
        .take(CAPTION_TAGS)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(",");
    if joined.is_empty() {
        return None;
    }
    if joined.chars().count() > CAPTION_MAX_CHARS {
        let kept: String = joined.chars().take(CAPTION_KEEP_CHARS).collect();
        return Some(format!("{kept}..."));
    }
    Some(joined)
}

fn caption_run(slot: &ItemSlot, text: String, config: &LayoutConfig) -> TextRun {
    let size_px = config.caption_font_size as f32;
    TextRun {
        text,
        x: (slot.caption.x + 2) as f32,
        baseline: (slot.caption.y as f32 + size_px).min(slot.caption.bottom() as f32),
        size_px,
        color: Color::GRAY,
        anchor: TextAnchor::Start,
    }
}

fn label_run(band: &Band, config: &LayoutConfig) -> TextRun {
    let size_px = config.label_font_size as f32;
    TextRun {
        text: format!("{}:", band.category.to_uppercase()),
        x: band.label.x as f32,
        baseline: (band.label.y as f32 + size_px).min(band.label.bottom() as f32),
        size_px,
        color: Color::BLACK,
        anchor: TextAnchor::Start,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/collage/compositor.rs"]
mod tests;
