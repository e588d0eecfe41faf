use std::collections::HashMap;

use crate::{
    foundation::error::SeneraResult,
    select::scorer::{ScoreWeights, score},
    wardrobe::model::{
        CategorySelection, InventoryReader, OwnerId, ScoredItem, TargetTagSet, WardrobeItem,
    },
};

/// Default number of items kept per category.
pub const DEFAULT_MAX_PER_CATEGORY: usize = 5;

/// Pick the best-scoring items of `owner` for every requested category.
///
/// Items are ranked by descending [`score`]; equal scores keep inventory order. Requested
/// categories without items are left out of the result, as is everything when no category was
/// requested.
#[tracing::instrument(skip(target, inventory, weights))]
pub fn select(
    target: &TargetTagSet,
    inventory: &dyn InventoryReader,
    owner: OwnerId,
    max_per_category: usize,
    weights: &ScoreWeights,
) -> SeneraResult<CategorySelection> {
    let mut selection = CategorySelection::default();
    if target.categories().is_empty() {
        return Ok(selection);
    }

    let items = inventory.items_owned_by(owner)?;
    let mut by_category: HashMap<&str, Vec<&WardrobeItem>> = HashMap::new();
    for item in &items {
        by_category
            .entry(item.type_category.as_str())
            .or_default()
            .push(item);
    }

    for category in target.categories() {
        let Some(candidates) = by_category.get(category.as_str()) else {
            continue;
        };
        let mut scored: Vec<ScoredItem> = candidates
            .iter()
            .map(|item| ScoredItem {
                score: score(item, target, weights),
                item: (*item).clone(),
            })
            .collect();
        // `sort_by` is stable, so ties keep inventory order.
        scored.sort_by(|a, b| b.score.cmp(&a.score));
        scored.truncate(max_per_category);
        selection.push(category.clone(), scored);
    }

    tracing::debug!(
        categories = selection.len(),
        items = selection.total_items(),
        "selected wardrobe items"
    );
    Ok(selection)
}

#[cfg(test)]
#[path = "../../tests/unit/select/selector.rs"]
mod tests;
