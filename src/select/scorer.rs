use crate::wardrobe::{
    model::{TargetTagSet, WardrobeItem},
    vocab::Facet,
};

/// Additive weights used by [`score`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    /// Awarded once when the item's category is among the requested categories.
    pub category_match: u32,
    /// Awarded per requested non-category value found in the item's tags.
    pub tag_match: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            category_match: 10,
            tag_match: 5,
        }
    }
}

/// Score one item against a target tag set.
///
/// The result is a pure function of the item's category and tags and the requested values.
/// Contributions are uncapped: every requested value that the item carries adds
/// `weights.tag_match`, repeated requests included.
pub fn score(item: &WardrobeItem, target: &TargetTagSet, weights: &ScoreWeights) -> u32 {
    let mut total = 0u32;
    for (facet, requested) in target.iter() {
        if facet == Facet::TypeCategory {
            if requested.iter().any(|c| *c == item.type_category) {
                total = total.saturating_add(weights.category_match);
            }
            continue;
        }
        let hits = requested.iter().filter(|value| item.has_tag(value)).count();
        let hits = u32::try_from(hits).unwrap_or(u32::MAX);
        total = total.saturating_add(hits.saturating_mul(weights.tag_match));
    }
    total
}

#[cfg(test)]
#[path = "../../tests/unit/select/scorer.rs"]
mod tests;
