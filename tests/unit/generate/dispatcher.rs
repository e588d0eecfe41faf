use std::sync::{Arc, Mutex};

use super::*;
use crate::foundation::core::{CanvasSize, Color};

type CallLog = Arc<Mutex<Vec<BackendKind>>>;

struct FakeBackend {
    kind: BackendKind,
    result: Result<ImageReference, BackendError>,
    calls: CallLog,
}

impl ImageBackend for FakeBackend {
    fn kind(&self) -> BackendKind {
        self.kind
    }

    fn render(&self, request: &RenderRequest) -> Result<ImageReference, BackendError> {
        assert_eq!(request.description, "blue shirt");
        self.calls.lock().unwrap().push(self.kind);
        self.result.clone()
    }
}

struct FakeDescriber {
    result: Result<String, BackendError>,
    calls: Arc<Mutex<usize>>,
}

impl DescriptionBackend for FakeDescriber {
    fn describe(&self, png: &[u8], instruction: &str) -> Result<String, BackendError> {
        assert!(png.starts_with(&[0x89, b'P', b'N', b'G']));
        assert!(instruction.contains("office party"));
        *self.calls.lock().unwrap() += 1;
        self.result.clone()
    }
}

fn describer(
    result: Result<&str, BackendError>,
) -> (Box<dyn DescriptionBackend>, Arc<Mutex<usize>>) {
    let calls = Arc::new(Mutex::new(0));
    let fake = FakeDescriber {
        result: result.map(str::to_string),
        calls: Arc::clone(&calls),
    };
    (Box::new(fake), calls)
}

fn backend(
    kind: BackendKind,
    result: Result<&str, BackendError>,
    calls: &CallLog,
) -> Box<dyn ImageBackend> {
    Box::new(FakeBackend {
        kind,
        result: result.map(|url| ImageReference::Url(url.to_string())),
        calls: Arc::clone(calls),
    })
}

fn canvas() -> Canvas {
    Canvas::new(CanvasSize::new(8, 6).unwrap(), Color::WHITE)
}

#[test]
fn falls_back_in_order_until_success() {
    let calls = CallLog::default();
    let (describer, described) = describer(Ok("blue shirt"));
    let dispatcher = Dispatcher::new(
        Some(describer),
        vec![
            backend(BackendKind::Dalle, Err(BackendError::Transport("reset".into())), &calls),
            backend(
                BackendKind::Pollinations,
                Err(BackendError::Http {
                    status: 500,
                    body: String::new(),
                }),
                &calls,
            ),
            backend(BackendKind::HuggingFace, Ok("https://hf/out.png"), &calls),
            backend(BackendKind::Replicate, Ok("https://r8/out.png"), &calls),
        ],
    );

    let outcome = dispatcher.generate(&canvas(), "office party", None).unwrap();
    assert_eq!(outcome.image, ImageReference::Url("https://hf/out.png".to_string()));
    assert_eq!(outcome.backend, BackendKind::HuggingFace);
    assert_eq!(outcome.description, "blue shirt");
    assert_eq!(
        *calls.lock().unwrap(),
        vec![
            BackendKind::Dalle,
            BackendKind::Pollinations,
            BackendKind::HuggingFace
        ]
    );
    assert_eq!(*described.lock().unwrap(), 1);

    assert_eq!(outcome.tried(), 3);
    let ranks: Vec<usize> = outcome.attempts.iter().map(|a| a.rank).collect();
    assert_eq!(ranks, vec![1, 2, 3, 4]);
    assert!(matches!(outcome.attempts[0].state, AttemptState::Failed { .. }));
    assert!(matches!(outcome.attempts[2].state, AttemptState::Succeeded { .. }));
    assert_eq!(outcome.attempts[3].state, AttemptState::NotTried);
}

#[test]
fn exhaustion_reports_last_backend_detail() {
    let calls = CallLog::default();
    let (describer, _) = describer(Ok("blue shirt"));
    let dispatcher = Dispatcher::new(
        Some(describer),
        vec![
            backend(BackendKind::Dalle, Err(BackendError::Transport("a".into())), &calls),
            backend(BackendKind::Pollinations, Err(BackendError::Loading("b".into())), &calls),
            backend(
                BackendKind::Replicate,
                Err(BackendError::Rejected("content policy".into())),
                &calls,
            ),
        ],
    );

    let err = dispatcher
        .generate(&canvas(), "office party", None)
        .unwrap_err();
    assert_eq!(err.kind(), crate::FailureKind::GenerationFailed);
    assert_eq!(err.to_string(), "generation failed after 3 attempt(s)");
    assert_eq!(err.detail(), Some("request rejected: content policy"));
    match err {
        SeneraError::GenerationFailed {
            attempts,
            last_backend,
            ..
        } => {
            assert_eq!(attempts, 3);
            assert_eq!(last_backend, Some(BackendKind::Replicate));
        }
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(calls.lock().unwrap().len(), 3);
}

#[test]
fn preferred_backend_goes_first() {
    let calls = CallLog::default();
    let (describer, _) = describer(Ok("blue shirt"));
    let dispatcher = Dispatcher::new(
        Some(describer),
        vec![
            backend(BackendKind::Dalle, Ok("https://dalle/x.png"), &calls),
            backend(BackendKind::Pollinations, Ok("https://poll/x.png"), &calls),
        ],
    );

    assert_eq!(
        dispatcher.order(Some(BackendKind::Pollinations)),
        vec![BackendKind::Pollinations, BackendKind::Dalle]
    );
    assert_eq!(
        dispatcher.order(Some(BackendKind::Replicate)),
        vec![BackendKind::Dalle, BackendKind::Pollinations]
    );

    let outcome = dispatcher
        .generate(&canvas(), "office party", Some(BackendKind::Pollinations))
        .unwrap();
    assert_eq!(outcome.backend, BackendKind::Pollinations);
    assert_eq!(*calls.lock().unwrap(), vec![BackendKind::Pollinations]);
    assert_eq!(outcome.tried(), 1);
}

#[test]
fn description_failure_is_fatal_and_skips_backends() {
    let calls = CallLog::default();
    let (describer, described) = describer(Err(BackendError::Http {
        status: 401,
        body: "bad key".to_string(),
    }));
    let dispatcher = Dispatcher::new(
        Some(describer),
        vec![backend(BackendKind::Dalle, Ok("https://dalle/x.png"), &calls)],
    );

    let err = dispatcher
        .generate(&canvas(), "office party", None)
        .unwrap_err();
    assert_eq!(err.kind(), crate::FailureKind::DescriptionFailed);
    assert_eq!(err.to_string(), "description failed");
    assert_eq!(err.detail(), Some("http status 401: bad key"));
    assert!(calls.lock().unwrap().is_empty());
    assert_eq!(*described.lock().unwrap(), 1);
}

#[test]
fn blank_description_is_a_description_failure() {
    let calls = CallLog::default();
    let (describer, _) = describer(Ok("   "));
    let dispatcher = Dispatcher::new(
        Some(describer),
        vec![backend(BackendKind::Dalle, Ok("https://dalle/x.png"), &calls)],
    );
    let err = dispatcher
        .generate(&canvas(), "office party", None)
        .unwrap_err();
    assert_eq!(err.kind(), crate::FailureKind::DescriptionFailed);
    assert!(calls.lock().unwrap().is_empty());
}

#[test]
fn missing_describer_or_backends_fail_cleanly() {
    let dispatcher = Dispatcher::new(None, Vec::new());
    let err = dispatcher
        .generate(&canvas(), "office party", None)
        .unwrap_err();
    assert_eq!(err.kind(), crate::FailureKind::DescriptionFailed);

    let (describer, _) = describer(Ok("blue shirt"));
    let dispatcher = Dispatcher::new(Some(describer), Vec::new());
    let err = dispatcher
        .generate(&canvas(), "office party", None)
        .unwrap_err();
    assert!(matches!(
        err,
        SeneraError::GenerationFailed {
            attempts: 0,
            last_backend: None,
            ..
        }
    ));
    assert_eq!(err.detail(), Some("no image backend configured"));
}
