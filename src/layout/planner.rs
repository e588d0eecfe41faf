use crate::{
    foundation::core::{CanvasSize, Rect},
    foundation::error::{SeneraError, SeneraResult},
    wardrobe::model::{CategorySelection, ScoredItem, WardrobeItem},
    wardrobe::vocab::TYPE_CATEGORIES,
};

/// Fixed size constants for the collage layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Output canvas size.
    pub canvas: CanvasSize,
    /// Outer margin on every side.
    pub margin: u32,
    /// Height of the band-wide category label strip.
    pub label_height: u32,
    /// Height of the per-item caption strip at the bottom of each cell.
    pub caption_height: u32,
    /// Gap between neighbouring cells, rows, and bands.
    pub item_spacing: u32,
    /// Total pixels kept free around a scaled item image (half per side).
    pub image_inset: u32,
    /// Font size of category labels, in pixels.
    pub label_font_size: u32,
    /// Font size of item captions and placeholder text, in pixels.
    pub caption_font_size: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            canvas: CanvasSize::default(),
            margin: 15,
            label_height: 20,
            caption_height: 12,
            item_spacing: 8,
            image_inset: 4,
            label_font_size: 14,
            caption_font_size: 10,
        }
    }
}

impl LayoutConfig {
    /// Check that the constants leave room for one two-row band per garment category.
    pub fn validate(&self) -> SeneraResult<()> {
        if self.canvas.width == 0 || self.canvas.height == 0 {
            return Err(SeneraError::validation("canvas width/height must be > 0"));
        }
        if self.margin.saturating_mul(2) >= self.canvas.width
            || self.margin.saturating_mul(2) >= self.canvas.height
        {
            return Err(SeneraError::validation("layout margin leaves no usable area"));
        }
        if self.usable_width() <= self.item_spacing.saturating_mul(2) {
            return Err(SeneraError::validation(
                "layout item_spacing leaves no room for three columns",
            ));
        }
        let bands = u32::try_from(TYPE_CATEGORIES.len()).unwrap_or(u32::MAX);
        if self.two_row_height(self.usable_height() / bands) <= self.caption_height {
            return Err(SeneraError::validation(format!(
                "layout height leaves no room for {bands} two-row bands"
            )));
        }
        Ok(())
    }

    fn two_row_height(&self, band_height: u32) -> u32 {
        band_height
            .saturating_sub(self.label_height + self.item_spacing)
            .saturating_sub(self.item_spacing)
            / 2
    }

    /// Width available to item cells.
    pub fn usable_width(&self) -> u32 {
        self.canvas.width.saturating_sub(self.margin * 2)
    }

    /// Height shared by all bands.
    pub fn usable_height(&self) -> u32 {
        self.canvas.height.saturating_sub(self.margin * 2)
    }
}

/// Row/column arrangement for a given item count.
///
/// | items | columns | rows   |
/// |-------|---------|--------|
/// | 1     | 1       | [1]    |
/// | 2     | 2       | [2]    |
/// | 3     | 3       | [3]    |
/// | 4     | 3       | [3, 1] |
/// | 5     | 3       | [3, 2] |
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GridShape {
    /// Column count of the grid.
    pub columns: u32,
    /// Items per row, top to bottom.
    pub rows: &'static [u32],
}

impl GridShape {
    /// Largest number of items a band can hold.
    pub const MAX_ITEMS: usize = 5;

    /// Shape for `count` items; counts above [`GridShape::MAX_ITEMS`] use the 5-item shape.
    /// Returns `None` for zero items.
    pub fn for_count(count: usize) -> Option<GridShape> {
        let (columns, rows): (u32, &'static [u32]) = match count {
            0 => return None,
            1 => (1, &[1]),
            2 => (2, &[2]),
            3 => (3, &[3]),
            4 => (3, &[3, 1]),
            _ => (3, &[3, 2]),
        };
        Some(GridShape { columns, rows })
    }

    /// Number of cells in the shape.
    pub fn capacity(self) -> usize {
        self.rows.iter().map(|k| *k as usize).sum()
    }
}

/// One item cell inside a band.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ItemSlot {
    /// Item painted into this slot.
    pub item: WardrobeItem,
    /// Whole cell, image area plus caption strip.
    pub cell: Rect,
    /// Area the item image is fitted into.
    pub image: Rect,
    /// Caption strip at the bottom of the cell.
    pub caption: Rect,
}

/// Vertical slice of the canvas holding one category.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct Band {
    /// Category name.
    pub category: String,
    /// Full band area.
    pub area: Rect,
    /// Label strip at the top of the band.
    pub label: Rect,
    /// Item cells in paint order.
    pub slots: Vec<ItemSlot>,
}

/// Complete collage geometry.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct LayoutPlan {
    /// Canvas the plan was computed for.
    pub canvas: CanvasSize,
    /// Bands top to bottom.
    pub bands: Vec<Band>,
}

impl LayoutPlan {
    /// True when there is nothing to paint.
    pub fn is_empty(&self) -> bool {
        self.bands.is_empty()
    }

    /// Number of item slots across all bands.
    pub fn slot_count(&self) -> usize {
        self.bands.iter().map(|b| b.slots.len()).sum()
    }
}

/// Compute band and cell geometry for a selection.
///
/// Every band gets `usable_height / band_count` pixels (remainder left as bottom slack). Within a
/// band the label strip comes first, then one or two rows of cells, then one spacing gap. The
/// result depends only on the selection's item counts and `config`.
pub fn plan(selection: &CategorySelection, config: &LayoutConfig) -> SeneraResult<LayoutPlan> {
    config.validate()?;

    let picks: Vec<_> = selection.iter().filter(|p| !p.items.is_empty()).collect();
    let mut bands = Vec::with_capacity(picks.len());
    if picks.is_empty() {
        return Ok(LayoutPlan {
            canvas: config.canvas,
            bands,
        });
    }

    let band_count = u32::try_from(picks.len())
        .map_err(|_| SeneraError::validation("too many categories for one collage"))?;
    let band_height = config.usable_height() / band_count;

    for (idx, category) in (0u32..).zip(picks) {
        let area = Rect::new(
            config.margin,
            config.margin + idx * band_height,
            config.usable_width(),
            band_height,
        );
        let slots = plan_band(&category.items, area, config);
        bands.push(Band {
            category: category.category.clone(),
            area,
            label: Rect::new(area.x, area.y, area.width, config.label_height.min(band_height)),
            slots,
        });
    }

    Ok(LayoutPlan {
        canvas: config.canvas,
        bands,
    })
}

/// Cells of one band. Bands too small for their rows get clamped cells whose image area may be
/// empty; the compositor then draws an error placeholder instead of a photo.
fn plan_band(items: &[ScoredItem], area: Rect, config: &LayoutConfig) -> Vec<ItemSlot> {
    let count = items.len().min(GridShape::MAX_ITEMS);
    let Some(shape) = GridShape::for_count(count) else {
        return Vec::new();
    };
    let spacing = config.item_spacing;

    let content_height = area
        .height
        .saturating_sub(config.label_height + spacing);
    let row_height = match shape.rows.len() {
        1 => content_height,
        _ => config.two_row_height(area.height),
    };
    let caption_height = config.caption_height.min(row_height);
    if row_height <= config.caption_height {
        tracing::warn!(
            band_height = area.height,
            row_height,
            "band too short for item rows, image areas clamped"
        );
    }

    let gaps = spacing * (shape.columns - 1);
    let column_width = area.width.saturating_sub(gaps) / shape.columns;
    let remainder = area
        .width
        .saturating_sub(gaps + column_width * shape.columns);
    let pitch = column_width + spacing;

    let mut slots = Vec::with_capacity(count);
    let mut items = items.iter();
    let content_top = area.y + config.label_height;
    for (row, &in_row) in (0u32..).zip(shape.rows) {
        let y = content_top + row * (row_height + spacing);
        let offset = (shape.columns - in_row) * pitch / 2;
        for col in 0..in_row {
            let Some(scored) = items.next() else {
                break;
            };
            let full_row = in_row == shape.columns;
            let width = if full_row && col + 1 == shape.columns {
                column_width + remainder
            } else {
                column_width
            };
            let x = area.x + offset + col * pitch;
            let cell = Rect::new(x, y, width, row_height);
            slots.push(ItemSlot {
                item: scored.item.clone(),
                cell,
                image: Rect::new(x, y, width, row_height - caption_height),
                caption: Rect::new(
                    x,
                    y + row_height - caption_height,
                    width,
                    caption_height,
                ),
            });
        }
    }
    slots
}

#[cfg(test)]
#[path = "../../tests/unit/layout/planner.rs"]
mod tests;
