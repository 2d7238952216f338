mod common;

use std::time::{Duration, Instant};

use common::MockService;
use deepl_local::translate::{
    ClientSettings, DeepLClient, ErrorKind, Language, TranslationResult, Translator,
};

#[tokio::test]
async fn auto_detect_end_to_end() {
    let mock = MockService::start(
        200,
        r#"{"translations":[{"text":"Hello","detected_source_language":"KO"}]}"#,
    )
    .await;
    let client = mock.client("test-key:fx");

    let result = client
        .translate("안녕하세요", Language::Auto, Language::English)
        .await;

    assert_eq!(
        result,
        TranslationResult::Success {
            text: "Hello".to_string(),
            detected_source_language: Some("KO".to_string()),
        }
    );

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0].body,
        serde_json::json!({"text": ["안녕하세요"], "target_lang": "EN-US"})
    );
    assert_eq!(
        requests[0].headers.get("authorization").unwrap(),
        "DeepL-Auth-Key test-key:fx"
    );
    assert_eq!(
        requests[0].headers.get("content-type").unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn explicit_source_is_sent() {
    let mock = MockService::start(200, r#"{"translations":[{"text":"Hallo"}]}"#).await;
    let client = mock.client("k");

    let result = client.translate("Hello", Language::English, Language::German).await;
    assert_eq!(result.text(), Some("Hallo"));

    let body = &mock.requests()[0].body;
    assert_eq!(body["source_lang"], "EN-US");
    assert_eq!(body["target_lang"], "DE");
}

#[tokio::test]
async fn first_of_many_entries_wins_and_unknown_fields_are_ignored() {
    let mock = MockService::start(
        200,
        r#"{"billed_characters":5,"translations":[{"text":"first","extra":true},{"text":"second"}]}"#,
    )
    .await;
    let result = mock
        .client("k")
        .translate("x", Language::Auto, Language::French)
        .await;
    assert_eq!(result.text(), Some("first"));
}

#[tokio::test]
async fn empty_translations_is_a_decode_failure() {
    let mock = MockService::start(200, r#"{"translations":[]}"#).await;
    let result = mock
        .client("k")
        .translate("x", Language::Auto, Language::Korean)
        .await;
    match result {
        TranslationResult::Failure { kind, message } => {
            assert_eq!(kind, ErrorKind::Decode);
            assert!(!message.is_empty());
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn malformed_and_missing_field_bodies_are_decode_failures() {
    for body in ["not json at all", r#"{"results":[{"text":"Hello"}]}"#] {
        let mock = MockService::start(200, body).await;
        let result = mock
            .client("k")
            .translate("x", Language::Auto, Language::Japanese)
            .await;
        assert!(
            matches!(result, TranslationResult::Failure { kind: ErrorKind::Decode, .. }),
            "body {:?} gave {:?}",
            body,
            result
        );
    }
}

#[tokio::test]
async fn non_success_status_is_a_protocol_failure() {
    let mock = MockService::start(500, r#"{"message":"Internal server error"}"#).await;
    let result = mock
        .client("k")
        .translate("x", Language::Auto, Language::Spanish)
        .await;
    match result {
        TranslationResult::Failure { kind, message } => {
            assert_eq!(kind, ErrorKind::Protocol);
            assert!(message.contains("500"));
            assert!(message.contains("Internal server error"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn empty_credential_fails_remotely_as_configuration_error() {
    let mock = MockService::start(403, r#"{"message":"Forbidden"}"#).await;
    let result = mock
        .client("")
        .translate("x", Language::Auto, Language::English)
        .await;
    assert!(matches!(
        result,
        TranslationResult::Failure { kind: ErrorKind::Configuration, .. }
    ));
    let auth = mock.requests()[0].headers.get("authorization").unwrap().clone();
    assert_eq!(auth.to_str().unwrap().trim(), "DeepL-Auth-Key");
}

#[tokio::test]
async fn quota_exceeded_has_its_own_message() {
    let mock = MockService::start(456, "{}").await;
    let result = mock
        .client("k")
        .translate("x", Language::Auto, Language::English)
        .await;
    assert_eq!(
        result.error_message(),
        Some("translation quota exceeded for this API key")
    );
}

#[tokio::test]
async fn slow_service_times_out_close_to_configured_timeout() {
    let mock = MockService::start_with_delay(
        200,
        r#"{"translations":[{"text":"late"}]}"#,
        Some(Duration::from_secs(30)),
    )
    .await;
    let client = DeepLClient::with_settings(
        "k",
        ClientSettings {
            request_timeout: Duration::from_millis(300),
            ..mock.settings()
        },
    )
    .unwrap();

    let started = Instant::now();
    let result = client.translate("x", Language::Auto, Language::English).await;
    let elapsed = started.elapsed();

    assert!(matches!(
        result,
        TranslationResult::Failure { kind: ErrorKind::Transport, .. }
    ));
    assert_eq!(result.error_message(), Some("request timed out after 300 ms"));
    assert!(elapsed < Duration::from_secs(5), "took {:?}", elapsed);
}

#[tokio::test]
async fn connection_refused_is_a_transport_failure() {
    // Bind then drop to get a port nobody listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = DeepLClient::with_settings(
        "k",
        ClientSettings {
            endpoint: format!("http://{}/v2/translate", addr),
            use_system_proxy: false,
            ..ClientSettings::default()
        },
    )
    .unwrap();
    let result = client.translate("x", Language::Auto, Language::English).await;
    assert!(matches!(
        result,
        TranslationResult::Failure { kind: ErrorKind::Transport, .. }
    ));
}

#[tokio::test]
async fn release_twice_is_safe() {
    let mock = MockService::start(200, r#"{"translations":[{"text":"ok"}]}"#).await;
    let client = mock.client("k");
    assert!(client.translate("x", Language::Auto, Language::English).await.is_success());

    client.release();
    client.release();

    let result = client.translate("x", Language::Auto, Language::English).await;
    assert!(matches!(
        result,
        TranslationResult::Failure { kind: ErrorKind::Released, .. }
    ));
    assert_eq!(mock.requests().len(), 1);
}
