use super::*;
use crate::{
    SeneraError,
    wardrobe::{
        model::{ItemId, MemoryInventory},
        vocab::Facet,
    },
};

fn item(id: u64, owner: u64, category: &str, tags: &[&str]) -> WardrobeItem {
    WardrobeItem {
        id: ItemId(id),
        owner: OwnerId(owner),
        type_category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        photo: format!("/uploads/{id}.png"),
    }
}

fn ids(items: &[ScoredItem]) -> Vec<u64> {
    items.iter().map(|s| s.item.id.0).collect()
}

#[test]
fn casual_top_and_bottom_scenario() {
    let inventory = MemoryInventory::new(vec![
        item(1, 1, "top", &["formal"]),
        item(2, 1, "top", &["casual"]),
        item(3, 1, "bottom", &["formal"]),
    ]);
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top", "bottom"])
        .facet(Facet::Style, ["casual"])
        .build();

    let selection = select(
        &target,
        &inventory,
        OwnerId(1),
        DEFAULT_MAX_PER_CATEGORY,
        &ScoreWeights::default(),
    )
    .unwrap();

    assert_eq!(selection.categories(), vec!["top", "bottom"]);
    let top = selection.get("top").unwrap();
    assert_eq!(ids(top), vec![2, 1]);
    assert_eq!(top.iter().map(|s| s.score).collect::<Vec<_>>(), vec![15, 10]);
    let bottom = selection.get("bottom").unwrap();
    assert_eq!(ids(bottom), vec![3]);
    assert_eq!(bottom[0].score, 10);
}

#[test]
fn equal_scores_keep_inventory_order() {
    let inventory = MemoryInventory::new(vec![
        item(5, 1, "top", &[]),
        item(3, 1, "top", &["red"]),
        item(9, 1, "top", &[]),
        item(1, 1, "top", &["red"]),
        item(4, 1, "top", &[]),
    ]);
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top"])
        .facet(Facet::Color, ["red"])
        .build();
    let selection = select(&target, &inventory, OwnerId(1), 10, &ScoreWeights::default()).unwrap();
    assert_eq!(ids(selection.get("top").unwrap()), vec![3, 1, 5, 9, 4]);
}

#[test]
fn truncates_to_max_per_category() {
    let inventory =
        MemoryInventory::new((0..12).map(|i| item(i, 1, "footwear", &[])).collect());
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["footwear"])
        .build();
    for max in [0usize, 1, 3, 5, 20] {
        let selection =
            select(&target, &inventory, OwnerId(1), max, &ScoreWeights::default()).unwrap();
        let picked = selection.get("footwear").map_or(0, <[ScoredItem]>::len);
        assert_eq!(picked, max.min(12));
    }
}

#[test]
fn missing_categories_and_other_owners_are_omitted() {
    let inventory = MemoryInventory::new(vec![
        item(1, 2, "top", &[]),
        item(2, 1, "headwear", &[]),
    ]);
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top", "bottom", "headwear"])
        .build();
    let selection =
        select(&target, &inventory, OwnerId(1), 5, &ScoreWeights::default()).unwrap();
    assert_eq!(selection.categories(), vec!["headwear"]);
}

#[test]
fn empty_inventory_or_no_categories_yields_empty_selection() {
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top", "bottom"])
        .build();
    let empty = MemoryInventory::default();
    let selection = select(&target, &empty, OwnerId(1), 5, &ScoreWeights::default()).unwrap();
    assert!(selection.is_empty());

    let inventory = MemoryInventory::new(vec![item(1, 1, "top", &["casual"])]);
    let style_only = TargetTagSet::builder()
        .facet(Facet::Style, ["casual"])
        .build();
    let selection =
        select(&style_only, &inventory, OwnerId(1), 5, &ScoreWeights::default()).unwrap();
    assert!(selection.is_empty());
}

struct FailingInventory;

impl InventoryReader for FailingInventory {
    fn items_owned_by(&self, _owner: OwnerId) -> crate::SeneraResult<Vec<WardrobeItem>> {
        Err(SeneraError::validation("inventory offline"))
    }
}

#[test]
fn inventory_failures_propagate() {
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top"])
        .build();
    let err = select(&target, &FailingInventory, OwnerId(1), 5, &ScoreWeights::default())
        .unwrap_err();
    assert!(err.to_string().contains("inventory offline"));
}
