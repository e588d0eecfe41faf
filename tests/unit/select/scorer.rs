use super::*;
use crate::wardrobe::model::{ItemId, OwnerId};

fn item(category: &str, tags: &[&str]) -> WardrobeItem {
    WardrobeItem {
        id: ItemId(1),
        owner: OwnerId(1),
        type_category: category.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        photo: "/uploads/a.png".to_string(),
    }
}

#[test]
fn category_match_counts_once() {
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top", "bottom", "top"])
        .build();
    let w = ScoreWeights::default();
    assert_eq!(score(&item("top", &[]), &target, &w), 10);
    assert_eq!(score(&item("footwear", &[]), &target, &w), 0);
}

#[test]
fn every_matching_requested_value_adds_tag_weight() {
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top"])
        .facet(Facet::Style, ["casual", "classic"])
        .facet(Facet::Color, ["blue"])
        .facet(Facet::Season, ["winter"])
        .build();
    let w = ScoreWeights::default();
    let it = item("top", &["casual", "classic", "blue", "summer"]);
    assert_eq!(score(&it, &target, &w), 10 + 5 + 5 + 5);
}

#[test]
fn unrequested_facets_and_unknown_tags_contribute_nothing() {
    let target = TargetTagSet::builder()
        .facet(Facet::Style, ["casual"])
        .build();
    let w = ScoreWeights::default();
    assert_eq!(score(&item("top", &["sparkly", "navy"]), &target, &w), 0);
    assert_eq!(score(&item("top", &[]), &TargetTagSet::default(), &w), 0);
}

#[test]
fn repeated_requested_values_stay_uncapped() {
    let target = TargetTagSet::builder()
        .facet(Facet::Style, ["casual", "casual", "casual"])
        .build();
    assert_eq!(
        score(&item("top", &["casual"]), &target, &ScoreWeights::default()),
        15
    );
}

#[test]
fn custom_weights_are_honored() {
    let target = TargetTagSet::builder()
        .facet(Facet::TypeCategory, ["top"])
        .facet(Facet::Color, ["red"])
        .build();
    let w = ScoreWeights {
        category_match: 1,
        tag_match: 100,
    };
    assert_eq!(score(&item("top", &["red"]), &target, &w), 101);
}

#[test]
fn score_is_monotone_as_item_tags_are_requested() {
    let it = item("top", &["casual", "blue", "winter", "work"]);
    let w = ScoreWeights::default();
    let facets = [Facet::Style, Facet::Color, Facet::Season, Facet::Occasion];
    let mut builder = TargetTagSet::builder().facet(Facet::TypeCategory, ["top"]);
    let mut previous = score(&it, &builder.clone().build(), &w);
    for (facet, tag) in facets.into_iter().zip(it.tags.clone()) {
        builder = builder.facet(facet, [tag]);
        let next = score(&it, &builder.clone().build(), &w);
        assert!(next >= previous);
        previous = next;
    }
    assert_eq!(previous, 30);
}
