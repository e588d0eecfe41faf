use super::*;
use crate::{
    SeneraError,
    layout::planner::plan,
    wardrobe::model::{CategorySelection, OwnerId, ScoredItem},
};

struct MissingLoader;

impl ItemImageLoader for MissingLoader {
    fn load(&self, _item: &WardrobeItem) -> SeneraResult<Option<image::DynamicImage>> {
        Ok(None)
    }
}

struct BrokenLoader;

impl ItemImageLoader for BrokenLoader {
    fn load(&self, _item: &WardrobeItem) -> SeneraResult<Option<image::DynamicImage>> {
        Err(SeneraError::validation("corrupt photo"))
    }
}

struct SolidLoader {
    width: u32,
    height: u32,
    rgba: [u8; 4],
}

impl ItemImageLoader for SolidLoader {
    fn load(&self, _item: &WardrobeItem) -> SeneraResult<Option<image::DynamicImage>> {
        let img = image::RgbaImage::from_pixel(self.width, self.height, image::Rgba(self.rgba));
        Ok(Some(image::DynamicImage::ImageRgba8(img)))
    }
}

fn item(id: u64, category: &str, tags: &[&str]) -> WardrobeItem {
    WardrobeItem {
        id: ItemId(id),
        owner: OwnerId(1),
        type_category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        photo: format!("/uploads/{id}.png"),
    }
}

fn selection(counts: &[(&str, usize)]) -> CategorySelection {
    let mut selection = CategorySelection::default();
    let mut next = 0;
    for (category, count) in counts {
        let items = (0..*count)
            .map(|_| {
                next += 1;
                ScoredItem {
                    item: item(next, category, &["casual"]),
                    score: 10,
                }
            })
            .collect();
        selection.push(*category, items);
    }
    selection
}

fn compose_with(
    counts: &[(&str, usize)],
    loader: &dyn ItemImageLoader,
) -> (LayoutPlan, Composed) {
    let config = LayoutConfig::default();
    let plan = plan(&selection(counts), &config).unwrap();
    let composed = compose(&plan, &config, loader, &TextRenderer::without_fonts()).unwrap();
    (plan, composed)
}

#[test]
fn missing_photos_become_placeholders() {
    let (plan, composed) = compose_with(&[("top", 3), ("bottom", 5)], &MissingLoader);
    assert_eq!(composed.report.slots.len(), 8);
    assert_eq!(composed.report.missing(), 8);
    assert_eq!(composed.report.painted(), 0);

    let slot = &plan.bands[1].slots[4];
    let inner = slot.image.inset(2);
    assert_eq!(
        composed.canvas.pixel(inner.x, inner.y),
        Some(PLACEHOLDER_OUTLINE.to_rgba8())
    );
    assert_eq!(
        composed.canvas.pixel(inner.x + 3, inner.y + 3),
        Some(PLACEHOLDER_FILL.to_rgba8())
    );
}

#[test]
fn loader_errors_become_error_placeholders() {
    let (plan, composed) = compose_with(&[("top", 2)], &BrokenLoader);
    assert_eq!(composed.report.failed(), 2);
    match &composed.report.slots[0].outcome {
        SlotOutcome::Failed { detail } => assert!(detail.contains("corrupt photo")),
        other => panic!("unexpected outcome {other:?}"),
    }
    let inner = plan.bands[0].slots[1].image.inset(2);
    assert_eq!(
        composed.canvas.pixel(inner.x + 3, inner.y + 3),
        Some(ERROR_FILL.to_rgba8())
    );
}

#[test]
fn photo_is_scaled_and_centered() {
    let loader = SolidLoader {
        width: 10,
        height: 20,
        rgba: [0, 0, 255, 255],
    };
    let (plan, composed) = compose_with(&[("top", 1)], &loader);
    assert_eq!(composed.report.painted(), 1);

    let image = plan.bands[0].slots[0].image;
    let (cx, cy) = image.center();
    assert_eq!(composed.canvas.pixel(cx, cy), Some([0, 0, 255, 255]));
    // Tall photo in a wide slot leaves the left edge white.
    assert_eq!(
        composed.canvas.pixel(image.x, cy),
        Some(Color::WHITE.to_rgba8())
    );
}

#[test]
fn transparent_photo_keeps_background() {
    let loader = SolidLoader {
        width: 8,
        height: 8,
        rgba: [255, 0, 0, 0],
    };
    let (plan, composed) = compose_with(&[("top", 1)], &loader);
    let (cx, cy) = plan.bands[0].slots[0].image.center();
    assert_eq!(
        composed.canvas.pixel(cx, cy),
        Some(Color::WHITE.to_rgba8())
    );
}

#[test]
fn empty_photo_is_reported_as_failure() {
    let loader = SolidLoader {
        width: 0,
        height: 0,
        rgba: [0, 0, 0, 255],
    };
    let (_, composed) = compose_with(&[("top", 1)], &loader);
    assert_eq!(composed.report.failed(), 1);
}

#[test]
fn empty_plan_without_fonts_is_blank_white() {
    let (_, composed) = compose_with(&[], &MissingLoader);
    assert!(composed.report.slots.is_empty());
    assert!(composed.report.text_skipped);
    assert!(
        composed
            .canvas
            .data()
            .chunks_exact(4)
            .all(|px| px == [255, 255, 255, 255])
    );
}

#[test]
fn empty_plan_with_fonts_draws_message() {
    let text = TextRenderer::with_system_fonts(None);
    let config = LayoutConfig::default();
    let plan = plan(&CategorySelection::default(), &config).unwrap();
    let composed = compose(&plan, &config, &MissingLoader, &text).unwrap();
    let drawn = composed
        .canvas
        .data()
        .chunks_exact(4)
        .any(|px| px != [255, 255, 255, 255]);
    assert_eq!(drawn, text.has_fonts());
}

#[test]
fn captions_use_two_tags_and_truncate() {
    assert_eq!(caption_text(&item(1, "top", &[])), None);
    assert_eq!(
        caption_text(&item(1, "top", &["casual", "red", "summer"])).as_deref(),
        Some("casual,red")
    );
    assert_eq!(
        caption_text(&item(1, "top", &["streetwear", "minimalistic"])).as_deref(),
        Some("streetwear,m...")
    );
    assert_eq!(
        caption_text(&item(1, "top", &["casual", "elegant"])).as_deref(),
        Some("casual,elegant")
    );
}

#[test]
fn report_serializes_outcomes() {
    let (_, composed) = compose_with(&[("top", 1)], &MissingLoader);
    let json = serde_json::to_value(&composed.report).unwrap();
    assert_eq!(json["slots"][0]["category"], "top");
    assert_eq!(json["slots"][0]["outcome"], "missing");
    assert_eq!(json["slots"][0]["item"], 1);
}

#[test]
fn collapsed_slots_are_reported_not_fatal() {
    let names: Vec<String> = (0..40).map(|i| format!("category{i}")).collect();
    let counts: Vec<(&str, usize)> = names.iter().map(|n| (n.as_str(), 1)).collect();
    let loader = SolidLoader {
        width: 10,
        height: 10,
        rgba: [0, 0, 255, 255],
    };

    let (_, composed) = compose_with(&counts, &loader);
    assert_eq!(composed.report.slots.len(), 40);
    assert_eq!(composed.report.failed(), 40);
}
