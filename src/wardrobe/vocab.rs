use std::collections::{BTreeMap, BTreeSet};

/// Named classification axis for a garment.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Facet {
    /// Garment category (top, bottom, ...). Drives which categories are searched.
    TypeCategory,
    /// Style (casual, formal, ...).
    Style,
    /// Color.
    Color,
    /// Occasion (work, party, ...).
    Occasion,
    /// Season.
    Season,
}

impl Facet {
    /// All facets in canonical order.
    pub const ALL: [Facet; 5] = [
        Facet::TypeCategory,
        Facet::Style,
        Facet::Color,
        Facet::Occasion,
        Facet::Season,
    ];

    /// Canonical snake_case name.
    pub fn as_str(self) -> &'static str {
        match self {
            Facet::TypeCategory => "type_category",
            Facet::Style => "style",
            Facet::Color => "color",
            Facet::Occasion => "occasion",
            Facet::Season => "season",
        }
    }

    /// Resolve a payload key to a facet. Accepts singular and plural spellings
    /// (`style`/`styles`, `type_category`/`type_categories`).
    pub fn from_key(key: &str) -> Option<Facet> {
        match key.trim().to_ascii_lowercase().as_str() {
            "type_category" | "type_categories" | "category" | "categories" => {
                Some(Facet::TypeCategory)
            }
            "style" | "styles" => Some(Facet::Style),
            "color" | "colors" | "colour" | "colours" => Some(Facet::Color),
            "occasion" | "occasions" => Some(Facet::Occasion),
            "season" | "seasons" => Some(Facet::Season),
            _ => None,
        }
    }
}

impl std::fmt::Display for Facet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub(crate) const TYPE_CATEGORIES: &[&str] = &[
    "top",
    "bottom",
    "footwear",
    "accessory",
    "outerwear",
    "headwear",
];

const STYLES: &[&str] = &[
    "casual",
    "formal",
    "sporty",
    "business",
    "streetwear",
    "vintage",
    "bohemian",
    "chic",
    "preppy",
    "edgy",
    "classic",
    "minimalistic",
    "elegant",
    "punk",
    "hip-hop",
    "athleisure",
];

const COLORS: &[&str] = &[
    "red", "blue", "black", "white", "gray", "green", "yellow", "orange", "purple", "pink",
    "brown", "beige", "navy", "teal", "maroon", "olive", "gold", "silver",
];

const OCCASIONS: &[&str] = &[
    "work", "party", "outdoor", "travel", "casual", "formal", "date", "gym", "beach", "festival",
    "wedding", "holiday",
];

const SEASONS: &[&str] = &["summer", "winter", "spring", "fall", "all-season"];

/// Closed set of valid values per facet.
///
/// A value may belong to more than one facet (`casual` is both a style and an occasion).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagVocabulary {
    values: BTreeMap<Facet, BTreeSet<String>>,
}

impl TagVocabulary {
    /// The product's built-in vocabulary.
    pub fn standard() -> Self {
        let mut values = BTreeMap::new();
        for (facet, list) in [
            (Facet::TypeCategory, TYPE_CATEGORIES),
            (Facet::Style, STYLES),
            (Facet::Color, COLORS),
            (Facet::Occasion, OCCASIONS),
            (Facet::Season, SEASONS),
        ] {
            values.insert(facet, list.iter().map(|s| (*s).to_string()).collect());
        }
        Self { values }
    }

    /// Normalize a raw tag string for lookup (trimmed, lowercase).
    pub fn normalize(raw: &str) -> String {
        raw.trim().to_lowercase()
    }

    /// True when `value` (after normalization) is valid for `facet`.
    pub fn contains(&self, facet: Facet, value: &str) -> bool {
        self.values
            .get(&facet)
            .is_some_and(|set| set.contains(&Self::normalize(value)))
    }

    /// Facets a value belongs to, in canonical facet order.
    pub fn facets_of(&self, value: &str) -> Vec<Facet> {
        let value = Self::normalize(value);
        Facet::ALL
            .into_iter()
            .filter(|facet| self.values.get(facet).is_some_and(|s| s.contains(&value)))
            .collect()
    }

    /// Valid values for a facet, sorted.
    pub fn values(&self, facet: Facet) -> impl Iterator<Item = &str> {
        self.values
            .get(&facet)
            .into_iter()
            .flat_map(|set| set.iter().map(String::as_str))
    }
}

impl Default for TagVocabulary {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/wardrobe/vocab.rs"]
mod tests;
