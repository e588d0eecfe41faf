use std::{collections::BTreeMap, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::error::{SeneraError, SeneraResult},
    wardrobe::vocab::{Facet, TagVocabulary},
};

/// Wardrobe item identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ItemId(pub u64);

/// Owning user identifier.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct OwnerId(pub u64);

impl std::fmt::Display for OwnerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One tagged garment owned by a user.
///
/// Items are owned by the persistence layer; the engine only reads them.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WardrobeItem {
    /// Item identifier.
    pub id: ItemId,
    /// Owning user.
    #[serde(rename = "owner_id", alias = "user_id")]
    pub owner: OwnerId,
    /// Garment category (`top`, `bottom`, ...).
    pub type_category: String,
    /// Ordered tag names; each belongs to exactly one facet upstream.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Reference to the garment photo (URL path such as `/uploads/shirt.png`).
    #[serde(rename = "image_url")]
    pub photo: String,
}

impl WardrobeItem {
    /// True when the item carries `tag` verbatim.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Requested tag values per facet, produced by a prompt interpreter.
///
/// `type_category` decides which categories are searched at all; the other facets only boost
/// scores. The set is immutable once built. Deserializing goes through
/// [`TargetTagSet::from_payload`] with the standard vocabulary.
#[derive(Clone, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(transparent)]
pub struct TargetTagSet {
    facets: BTreeMap<Facet, Vec<String>>,
}

impl<'de> serde::Deserialize<'de> for TargetTagSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let payload = <serde_json::Value as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_payload(&payload, &TagVocabulary::standard()).map_err(serde::de::Error::custom)
    }
}

impl TargetTagSet {
    /// Start building a tag set.
    pub fn builder() -> TargetTagSetBuilder {
        TargetTagSetBuilder::default()
    }

    /// Tag set used when an interpreter response cannot be parsed.
    pub fn fallback() -> Self {
        Self::builder()
            .facet(Facet::TypeCategory, ["top", "bottom", "footwear"])
            .facet(Facet::Style, ["casual"])
            .facet(Facet::Occasion, ["casual"])
            .build()
    }

    /// Parse an untrusted JSON payload, keeping only known facets and vocabulary values.
    ///
    /// Facet keys may be singular or plural. Each facet value may be a string or an array of
    /// strings; anything else is ignored.
    pub fn from_payload(payload: &serde_json::Value, vocab: &TagVocabulary) -> SeneraResult<Self> {
        let serde_json::Value::Object(map) = payload else {
            return Err(SeneraError::validation("tag payload must be a JSON object"));
        };

        let mut builder = Self::builder();
        for (key, value) in map {
            let Some(facet) = Facet::from_key(key) else {
                tracing::debug!(key = %key, "ignoring unknown facet in tag payload");
                continue;
            };
            let raw: Vec<&str> = match value {
                serde_json::Value::String(s) => vec![s.as_str()],
                serde_json::Value::Array(values) => {
                    values.iter().filter_map(serde_json::Value::as_str).collect()
                }
                _ => continue,
            };
            let accepted: Vec<String> = raw
                .into_iter()
                .filter(|v| {
                    let known = vocab.contains(facet, v);
                    if !known {
                        tracing::debug!(facet = %facet, value = %v, "ignoring unknown tag value");
                    }
                    known
                })
                .map(TagVocabulary::normalize)
                .collect();
            builder = builder.facet(facet, accepted);
        }
        Ok(builder.build())
    }

    /// Requested values for `facet` (empty when not requested).
    pub fn get(&self, facet: Facet) -> &[String] {
        self.facets.get(&facet).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Requested garment categories, in request order.
    pub fn categories(&self) -> &[String] {
        self.get(Facet::TypeCategory)
    }

    /// Iterate requested facets in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Facet, &[String])> {
        self.facets.iter().map(|(f, v)| (*f, v.as_slice()))
    }

    /// True when no facet carries any value.
    pub fn is_empty(&self) -> bool {
        self.facets.is_empty()
    }
}

/// Builder for [`TargetTagSet`].
#[derive(Clone, Debug, Default)]
pub struct TargetTagSetBuilder {
    facets: BTreeMap<Facet, Vec<String>>,
}

impl TargetTagSetBuilder {
    /// Append values to a facet, keeping order (duplicates are kept).
    pub fn facet<I, S>(mut self, facet: Facet, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.facets
            .entry(facet)
            .or_default()
            .extend(values.into_iter().map(Into::into));
        self
    }

    /// Finish; facets without values are dropped.
    pub fn build(mut self) -> TargetTagSet {
        self.facets.retain(|_, v| !v.is_empty());
        TargetTagSet {
            facets: self.facets,
        }
    }
}

/// An item paired with its relevance score.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize)]
pub struct ScoredItem {
    /// The scored item.
    pub item: WardrobeItem,
    /// Additive relevance score.
    pub score: u32,
}

/// Selected items for one category, best first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryPicks {
    /// Garment category.
    pub category: String,
    /// Items sorted by descending score; never empty.
    pub items: Vec<ScoredItem>,
}

/// Per-category top picks, in the order categories were requested.
///
/// Categories without items are never present.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CategorySelection {
    entries: Vec<CategoryPicks>,
}

impl CategorySelection {
    /// Append a category; empty item lists and repeated categories are ignored.
    pub(crate) fn push(&mut self, category: impl Into<String>, items: Vec<ScoredItem>) {
        let category = category.into();
        if items.is_empty() || self.get(&category).is_some() {
            return;
        }
        self.entries.push(CategoryPicks { category, items });
    }

    /// Picks for `category`, if any.
    pub fn get(&self, category: &str) -> Option<&[ScoredItem]> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.items.as_slice())
    }

    /// Iterate categories in selection order.
    pub fn iter(&self) -> impl Iterator<Item = &CategoryPicks> {
        self.entries.iter()
    }

    /// Category names in selection order.
    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.category.as_str()).collect()
    }

    /// Number of categories.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no category has picks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of selected items across categories.
    pub fn total_items(&self) -> usize {
        self.entries.iter().map(|e| e.items.len()).sum()
    }

    /// Wire view returned to callers of the request flows.
    pub fn summary(&self) -> SelectionSummary {
        SelectionSummary {
            entries: self
                .entries
                .iter()
                .map(|e| {
                    let items = e
                        .items
                        .iter()
                        .map(|s| ItemSummary {
                            id: s.item.id,
                            image_url: s.item.photo.clone(),
                            type_category: s.item.type_category.clone(),
                            tags: s.item.tags.clone(),
                        })
                        .collect();
                    (e.category.clone(), items)
                })
                .collect(),
        }
    }
}

/// One selected item as exposed to API callers.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ItemSummary {
    /// Item identifier.
    pub id: ItemId,
    /// Photo reference.
    pub image_url: String,
    /// Garment category.
    pub type_category: String,
    /// Tag names.
    pub tags: Vec<String>,
}

/// Serialized form of a [`CategorySelection`]: an ordered `category -> [item]` JSON object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SelectionSummary {
    entries: Vec<(String, Vec<ItemSummary>)>,
}

impl SelectionSummary {
    /// Items for `category`, if present.
    pub fn get(&self, category: &str) -> Option<&[ItemSummary]> {
        self.entries
            .iter()
            .find(|(c, _)| c == category)
            .map(|(_, v)| v.as_slice())
    }
}

impl serde::Serialize for SelectionSummary {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.entries.iter().map(|(k, v)| (k, v)))
    }
}

/// Read access to a user's wardrobe.
pub trait InventoryReader {
    /// All items owned by `owner`, in stable inventory order.
    fn items_owned_by(&self, owner: OwnerId) -> SeneraResult<Vec<WardrobeItem>>;
}

/// In-memory inventory, optionally loaded from a JSON array of items.
#[derive(Clone, Debug, Default)]
pub struct MemoryInventory {
    items: Vec<WardrobeItem>,
}

impl MemoryInventory {
    /// Wrap an item list; list order is the inventory order.
    pub fn new(items: Vec<WardrobeItem>) -> Self {
        Self { items }
    }

    /// Load a JSON array of [`WardrobeItem`] from disk.
    pub fn from_json_file(path: &Path) -> SeneraResult<Self> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("read inventory '{}'", path.display()))?;
        let items: Vec<WardrobeItem> = serde_json::from_slice(&bytes)?;
        Ok(Self { items })
    }

    /// Number of items across all owners.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True when the inventory holds no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl InventoryReader for MemoryInventory {
    fn items_owned_by(&self, owner: OwnerId) -> SeneraResult<Vec<WardrobeItem>> {
        Ok(self
            .items
            .iter()
            .filter(|item| item.owner == owner)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/wardrobe/model.rs"]
mod tests;
