//! Integration tests for the signed sync client.
//!
//! A `wiremock` server plays the store's module endpoint; each test checks
//! how one kind of answer (or failure) is normalized.

use std::time::Duration;

use grifon_sync::{
    ShopConfig, ShopDirectory, SyncClient, SyncError, SyncSettings, canonical_json,
    status_and_body, verify_signature,
};
use grifon_sync_integration_tests::{
    SYNC_PATH, mock_client, sample_payload, shop, strict_client,
};
use serde_json::json;
use wiremock::matchers::{header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// =============================================================================
// Response Normalization Tests
// =============================================================================

#[tokio::test]
async fn test_success_returns_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ok":true}"#))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    let result = client.sync_customer("shopA", &sample_payload()).await;

    assert_eq!(status_and_body(&result), (200, json!({"ok": true})));
}

#[tokio::test]
async fn test_http_500_with_json_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string(r#"{"error":"x"}"#))
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    let result = client.sync_customer("shopA", &sample_payload()).await;

    assert_eq!(
        status_and_body(&result),
        (
            500,
            json!({"error": "Sync failed with HTTP 500", "details": {"error": "x"}})
        )
    );
}

#[tokio::test]
async fn test_http_error_with_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("Forbidden"))
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    let result = client.sync_customer("shopA", &sample_payload()).await;

    match result {
        Err(SyncError::Http { status, ref details }) => {
            assert_eq!(status, 403);
            assert_eq!(details.clone().into_value(), json!("Forbidden"));
        }
        other => panic!("expected Http error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_non_200_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    let result = client.sync_customer("shopA", &sample_payload()).await;

    assert_eq!(
        status_and_body(&result),
        (
            201,
            json!({"error": "Sync failed with HTTP 201", "details": {"ok": true}})
        )
    );
}

#[tokio::test]
async fn test_200_with_invalid_json() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    let result = client.sync_customer("shopA", &sample_payload()).await;

    assert_eq!(
        status_and_body(&result),
        (
            200,
            json!({"error": "Invalid JSON response", "details": "<html>ok</html>"})
        )
    );
}

#[tokio::test]
async fn test_module_report_is_readable() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ok": true,
            "created": false,
            "updated": true,
            "warnings": [],
            "psCustomerId": 1234,
            "psAddressIds": {"addr_1": 88}
        })))
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    let response = client
        .sync_customer("shopA", &sample_payload())
        .await
        .expect("sync succeeds");

    let report = response.report().expect("report shape");
    assert!(report.ok);
    assert!(report.updated);
    assert_eq!(report.ps_customer_id, Some(1234));
    assert_eq!(report.ps_address_ids.len(), 1);
}

// =============================================================================
// Wire Contract Tests
// =============================================================================

#[tokio::test]
async fn test_request_is_signed_over_exact_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .and(header("Content-Type", "application/json"))
        .and(header_exists("X-Grifon-Timestamp"))
        .and(header_exists("X-Grifon-Signature"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let payload = sample_payload();
    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    client
        .sync_customer("shopA", &payload)
        .await
        .expect("sync succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    let request = requests.first().expect("one request");

    let timestamp: i64 = request
        .headers
        .get("X-Grifon-Timestamp")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse().ok())
        .expect("numeric timestamp");
    let signature = request
        .headers
        .get("X-Grifon-Signature")
        .and_then(|v| v.to_str().ok())
        .expect("signature header");

    assert_eq!(request.body, canonical_json(&payload).expect("serialize"));
    assert_eq!(
        verify_signature(b"SECRET_A", timestamp, &request.body, signature, timestamp, None),
        Ok(())
    );
    assert!(verify_signature(b"SECRET_B", timestamp, &request.body, signature, timestamp, None).is_err());
}

#[tokio::test]
async fn test_body_is_compact_utf8() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    client
        .sync_customer("shopA", &sample_payload())
        .await
        .expect("sync succeeds");

    let requests = server.received_requests().await.expect("recording enabled");
    let body = String::from_utf8(requests.first().expect("one request").body.clone())
        .expect("utf-8 body");

    assert!(body.starts_with(r#"{"externalCustomerId":"cust_123","customer":{"#));
    assert!(body.contains(r#""firstname":"Νίκος""#));
    assert!(!body.contains("\\u"));
    assert!(!body.contains(": "));
}

#[tokio::test]
async fn test_trailing_slash_in_base_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(SYNC_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &format!("{}//", server.uri()), "SECRET_A")]);
    let result = client.sync_customer("shopA", &sample_payload()).await;
    assert!(result.is_ok(), "unexpected: {result:?}");
}

// =============================================================================
// Pre-flight Failure Tests (no request may be sent)
// =============================================================================

#[tokio::test]
async fn test_unknown_store_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client([shop("shopA", &server.uri(), "SECRET_A")]);
    let result = client
        .sync_customer("nonexistent_shop", &sample_payload())
        .await;

    assert_eq!(
        status_and_body(&result),
        (0, json!({"error": "Unknown store_id 'nonexistent_shop'"}))
    );
}

#[tokio::test]
async fn test_plain_http_rejected_by_default() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = strict_client([
        shop("local", &server.uri(), "SECRET_A"),
        shop("insecure", "http://insecure.example", "SECRET_A"),
    ]);

    for store in ["local", "insecure"] {
        let result = client.sync_customer(store, &sample_payload()).await;
        assert_eq!(
            status_and_body(&result),
            (0, json!({"error": "HTTPS is required for base_url"}))
        );
    }
}

#[tokio::test]
async fn test_missing_secret_sends_nothing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let client = mock_client([shop("shopB", &server.uri(), "")]);
    let result = client.sync_customer("shopB", &sample_payload()).await;

    assert_eq!(
        status_and_body(&result),
        (0, json!({"error": "Missing shared secret for store"}))
    );
}

// =============================================================================
// Transport Failure Tests
// =============================================================================

#[tokio::test]
async fn test_connection_refused_is_transport_error() {
    // Bind and release a port so nothing listens on it
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("bind ephemeral port")
        .port();
    let uri = format!("http://127.0.0.1:{port}");

    let client = mock_client([shop("shopA", &uri, "SECRET_A")]);
    let result = client.sync_customer("shopA", &sample_payload()).await;

    let err = result.expect_err("connection must fail");
    assert!(matches!(err, SyncError::Transport(_)));
    assert_eq!(err.status(), 0);
    let message = err.to_json()["error"]
        .as_str()
        .expect("error message")
        .to_string();
    assert!(message.starts_with("Request failed: "), "got: {message}");
}

#[tokio::test]
async fn test_timeout_is_transport_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&server)
        .await;

    let settings = SyncSettings {
        timeout: Duration::from_millis(200),
        allow_plain_http: true,
    };
    let client = SyncClient::new(
        ShopDirectory::new([shop("shopA", &server.uri(), "SECRET_A")]),
        settings,
    )
    .expect("build client");

    let result = client.sync_customer("shopA", &sample_payload()).await;
    assert!(matches!(result, Err(SyncError::Transport(_))));
}

// =============================================================================
// Multi-store Tests
// =============================================================================

#[tokio::test]
async fn test_sync_all_signs_per_store_and_continues_after_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(format!("/a{SYNC_PATH}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(format!("/b{SYNC_PATH}")))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"ok": false, "error": "BAD_SIGNATURE"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let shops: Vec<ShopConfig> = vec![
        shop("shopA", &format!("{}/a", server.uri()), "SECRET_A"),
        shop("shopB", &format!("{}/b", server.uri()), "SECRET_B"),
        shop("shopC", "http://unused.example", ""),
    ];
    let client = mock_client(shops);

    let results = client.sync_all(&sample_payload()).await;
    let summary: Vec<(String, u16)> = results
        .iter()
        .map(|(store, result)| (store.to_string(), status_and_body(result).0))
        .collect();

    assert_eq!(
        summary,
        vec![
            ("shopA".to_string(), 200),
            ("shopB".to_string(), 401),
            ("shopC".to_string(), 0),
        ]
    );

    let requests = server.received_requests().await.expect("recording enabled");
    assert_eq!(requests.len(), 2);
    for request in &requests {
        let secret: &[u8] = if request.url.path().starts_with("/a/") {
            b"SECRET_A"
        } else {
            b"SECRET_B"
        };
        let timestamp: i64 = request
            .headers
            .get("X-Grifon-Timestamp")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok())
            .expect("numeric timestamp");
        let signature = request
            .headers
            .get("X-Grifon-Signature")
            .and_then(|v| v.to_str().ok())
            .expect("signature header");
        assert_eq!(
            verify_signature(secret, timestamp, &request.body, signature, timestamp, None),
            Ok(())
        );
    }
}

#[tokio::test]
async fn test_concurrent_syncs_share_client() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(2)
        .mount(&server)
        .await;

    let client = mock_client([
        shop("shopA", &format!("{}/a", server.uri()), "SECRET_A"),
        shop("shopB", &format!("{}/b", server.uri()), "SECRET_B"),
    ]);
    let payload = sample_payload();

    let (a, b) = tokio::join!(
        client.sync_customer("shopA", &payload),
        client.sync_customer("shopB", &payload),
    );

    assert_eq!(a.expect("shopA ok").status, 200);
    assert_eq!(b.expect("shopB ok").status, 200);
}
