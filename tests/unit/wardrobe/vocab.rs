use super::*;

#[test]
fn facet_keys_accept_singular_and_plural() {
    assert_eq!(Facet::from_key("type_categories"), Some(Facet::TypeCategory));
    assert_eq!(Facet::from_key("type_category"), Some(Facet::TypeCategory));
    assert_eq!(Facet::from_key(" Styles "), Some(Facet::Style));
    assert_eq!(Facet::from_key("colors"), Some(Facet::Color));
    assert_eq!(Facet::from_key("seasons"), Some(Facet::Season));
    assert_eq!(Facet::from_key("occasion"), Some(Facet::Occasion));
    assert_eq!(Facet::from_key("fabric"), None);
}

#[test]
fn facet_names_match_serde_names() {
    for facet in Facet::ALL {
        let json = serde_json::to_string(&facet).unwrap();
        assert_eq!(json, format!("\"{}\"", facet.as_str()));
    }
}

#[test]
fn standard_vocabulary_membership() {
    let vocab = TagVocabulary::standard();
    assert!(vocab.contains(Facet::TypeCategory, "top"));
    assert!(vocab.contains(Facet::TypeCategory, " FOOTWEAR "));
    assert!(vocab.contains(Facet::Style, "hip-hop"));
    assert!(vocab.contains(Facet::Season, "all-season"));
    assert!(!vocab.contains(Facet::Color, "casual"));
    assert!(!vocab.contains(Facet::Style, "glitter"));
    assert_eq!(vocab.values(Facet::TypeCategory).count(), 6);
    assert_eq!(vocab.values(Facet::Color).count(), 18);
}

#[test]
fn shared_values_report_every_facet() {
    let vocab = TagVocabulary::standard();
    assert_eq!(vocab.facets_of("casual"), vec![Facet::Style, Facet::Occasion]);
    assert_eq!(vocab.facets_of("navy"), vec![Facet::Color]);
    assert!(vocab.facets_of("unknown").is_empty());
}
