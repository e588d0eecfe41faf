use std::collections::HashMap;

use super::*;
use crate::collage::store::FsImageStore;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[test]
fn defaults_are_valid() {
    let config = EngineConfig::default();
    config.validate().unwrap();
    assert_eq!(config.selection.max_per_category, 5);
    assert_eq!(config.generation.order, BackendKind::ALL.to_vec());
    assert_eq!(config.layout.canvas.width, 1024);
    assert_eq!(config.generation.timeout(), Duration::from_secs(120));
}

#[test]
fn partial_json_keeps_defaults_elsewhere() {
    let json = r#"{
        "layout": { "margin": 20 },
        "selection": { "max_per_category": 3, "weights": { "tag_match": 2 } },
        "generation": { "order": ["pollinations", "dalle"], "preferred": "dalle" }
    }"#;
    let config: EngineConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.layout.margin, 20);
    assert_eq!(config.layout.label_height, 20);
    assert_eq!(config.selection.max_per_category, 3);
    assert_eq!(config.selection.weights.category_match, 10);
    assert_eq!(config.selection.weights.tag_match, 2);
    assert_eq!(
        config.generation.order,
        vec![BackendKind::Pollinations, BackendKind::Dalle]
    );
    assert_eq!(config.generation.preferred, Some(BackendKind::Dalle));
    assert_eq!(config.generation.openai.image_model, "dall-e-3");
}

#[test]
fn secrets_come_from_environment_only() {
    let json = r#"{ "generation": { "openai": { "api_key": "from-file" } } }"#;
    let mut config: EngineConfig = serde_json::from_str(json).unwrap();
    assert_eq!(config.generation.openai.api_key, None);

    config
        .apply_env(env(&[
            ("OPENAI_API_KEY", "sk-1"),
            ("HF_TOKEN", "hf-1"),
            ("REPLICATE_API_TOKEN", "  "),
            ("IMAGE_GENERATION_SERVICE", "Pollinations"),
        ]))
        .unwrap();
    assert_eq!(config.generation.openai.api_key.as_deref(), Some("sk-1"));
    assert_eq!(config.generation.huggingface.token.as_deref(), Some("hf-1"));
    assert_eq!(config.generation.replicate.token, None);
    assert_eq!(config.generation.preferred, Some(BackendKind::Pollinations));

    let serialized = serde_json::to_string(&config).unwrap();
    assert!(!serialized.contains("sk-1"));
}

#[test]
fn huggingface_api_token_wins_over_hf_token() {
    let mut config = EngineConfig::default();
    config
        .apply_env(env(&[("HUGGINGFACE_API_TOKEN", "a"), ("HF_TOKEN", "b")]))
        .unwrap();
    assert_eq!(config.generation.huggingface.token.as_deref(), Some("a"));
}

#[test]
fn unknown_service_name_is_rejected() {
    let mut config = EngineConfig::default();
    let err = config
        .apply_env(env(&[("IMAGE_GENERATION_SERVICE", "midjourney")]))
        .unwrap_err();
    assert_eq!(err.kind(), crate::FailureKind::Validation);
}

#[test]
fn validate_rejects_bad_values() {
    let mut config = EngineConfig::default();
    config.selection.max_per_category = 0;
    assert!(config.validate().is_err());

    let mut config = EngineConfig::default();
    config.generation.order = vec![BackendKind::Dalle, BackendKind::Dalle];
    assert!(config.validate().is_err());

    let mut config = EngineConfig::default();
    config.generation.timeout_ms = 0;
    assert!(config.validate().is_err());

    let mut config = EngineConfig::default();
    config.layout.margin = 600;
    assert!(config.validate().is_err());
}

#[test]
fn backends_without_credentials_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let store: Arc<dyn ImageStore + Send + Sync> = Arc::new(FsImageStore::new(dir.path()));

    let config = EngineConfig::default();
    let kinds: Vec<BackendKind> = config
        .build_backends(Arc::clone(&store))
        .unwrap()
        .iter()
        .map(|b| b.kind())
        .collect();
    assert_eq!(kinds, vec![BackendKind::Pollinations]);
    assert!(config.build_describer().unwrap().is_none());

    let mut config = EngineConfig::default();
    config
        .apply_env(env(&[
            ("OPENAI_API_KEY", "sk"),
            ("HF_TOKEN", "hf"),
            ("REPLICATE_API_TOKEN", "r8"),
        ]))
        .unwrap();
    let kinds: Vec<BackendKind> = config
        .build_backends(store)
        .unwrap()
        .iter()
        .map(|b| b.kind())
        .collect();
    assert_eq!(kinds, BackendKind::ALL.to_vec());
    assert!(config.build_describer().unwrap().is_some());
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("senera.json");
    std::fs::write(&path, r#"{ "uploads_dir": "/srv/uploads" }"#).unwrap();
    let config = EngineConfig::from_json_file(&path).unwrap();
    assert_eq!(config.uploads_dir, PathBuf::from("/srv/uploads"));

    std::fs::write(&path, "{ not json").unwrap();
    let err = EngineConfig::from_json_file(&path).unwrap_err();
    assert_eq!(err.kind(), crate::FailureKind::Serde);
}

#[test]
fn debug_output_redacts_credentials() {
    let mut config = EngineConfig::default();
    config
        .apply_env(env(&[
            ("OPENAI_API_KEY", "sk-SECRET-123"),
            ("HF_TOKEN", "hf-SECRET-456"),
            ("REPLICATE_API_TOKEN", "r8-SECRET-789"),
        ]))
        .unwrap();

    let debug = format!("{config:?}");
    for secret in ["sk-SECRET-123", "hf-SECRET-456", "r8-SECRET-789"] {
        assert!(!debug.contains(secret), "{secret} leaked: {debug}");
    }
    assert!(debug.contains("<redacted>"));
    assert!(debug.contains("gpt-4o"));

    let unset = format!("{:?}", EngineConfig::default());
    assert!(!unset.contains("<redacted>"));
}
