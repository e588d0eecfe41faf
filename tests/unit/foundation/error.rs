use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SeneraError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SeneraError::interpretation("x")
            .to_string()
            .contains("interpretation error:")
    );
    assert!(
        SeneraError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn description_failure_keeps_transport_text_out_of_message() {
    let err = SeneraError::description_failed("connection reset by peer");
    assert_eq!(err.to_string(), "description failed");
    assert_eq!(err.kind(), FailureKind::DescriptionFailed);
    assert_eq!(err.detail(), Some("connection reset by peer"));
}

#[test]
fn generation_failure_reports_attempts_and_detail() {
    let err = SeneraError::GenerationFailed {
        attempts: 3,
        last_backend: Some(BackendKind::Replicate),
        detail: Some("http 500".to_string()),
    };
    assert_eq!(err.to_string(), "generation failed after 3 attempt(s)");
    assert_eq!(err.kind(), FailureKind::GenerationFailed);
    assert_eq!(err.detail(), Some("http 500"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SeneraError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.kind(), FailureKind::Other);
    assert_eq!(err.detail(), None);
}
