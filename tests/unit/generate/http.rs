use super::*;

#[test]
fn shorten_keeps_short_bodies() {
    assert_eq!(shorten("  not found \n"), "not found");
}

#[test]
fn shorten_truncates_long_bodies() {
    let body = "x".repeat(MAX_ERROR_BODY_CHARS + 10);
    let out = shorten(&body);
    assert_eq!(out.chars().count(), MAX_ERROR_BODY_CHARS + 3);
    assert!(out.ends_with("..."));
}

#[test]
fn chat_reads_first_choice() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = std::thread::spawn(move || {
        let request = server.recv().unwrap();
        let url = request.url().to_string();
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"a red top"}}]}"#;
        request
            .respond(tiny_http::Response::from_string(body))
            .unwrap();
        url
    });

    let client = OpenAiClient::new(
        &format!("http://{addr}/v1/"),
        "key",
        Duration::from_secs(5),
    )
    .unwrap();
    let text = client
        .chat("gpt-4o", serde_json::json!("describe"), 10)
        .unwrap();
    assert_eq!(text, "a red top");
    assert_eq!(handle.join().unwrap(), "/v1/chat/completions");
}

#[test]
fn chat_without_choices_is_invalid() {
    let server = tiny_http::Server::http("127.0.0.1:0").unwrap();
    let addr = server.server_addr().to_ip().unwrap();
    let handle = std::thread::spawn(move || {
        let request = server.recv().unwrap();
        request
            .respond(tiny_http::Response::from_string(r#"{"choices":[]}"#))
            .unwrap();
    });

    let client =
        OpenAiClient::new(&format!("http://{addr}"), "key", Duration::from_secs(5)).unwrap();
    let err = client.chat("gpt-4o", serde_json::json!("x"), 10).unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)));
    handle.join().unwrap();
}
