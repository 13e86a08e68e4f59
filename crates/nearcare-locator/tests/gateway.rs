//! Integration tests for `ProviderGateway` failover using wiremock mirrors.
//!
//! Each test stands up one `MockServer` per mirror so call counts can be
//! verified per endpoint. Mocks mounted with `.expect(0)` assert that a mirror
//! was never contacted.

use std::time::{Duration, Instant};

use nearcare_core::{Coordinate, ProviderEndpoint, SearchQuery};
use nearcare_locator::{
    build_http_client, AttemptFailure, CancellationToken, FailureClass, GatewayError,
    ProviderGateway,
};
use serde_json::json;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const INTERPRETER: &str = "/api/interpreter";

fn endpoint(server: &MockServer, priority: u32) -> ProviderEndpoint {
    ProviderEndpoint::new(format!("{}{INTERPRETER}", server.uri()), priority)
}

fn gateway(endpoints: &[ProviderEndpoint], per_attempt: Duration) -> ProviderGateway {
    let client = build_http_client("nearcare-test/0.1").expect("failed to build test client");
    ProviderGateway::new(client, endpoints, per_attempt)
}

fn lagos_query() -> SearchQuery {
    SearchQuery::builder(Coordinate::new(6.5244, 3.3792).unwrap())
        .radius_meters(5000)
        .build()
        .unwrap()
}

fn hospital_body(id: u64) -> serde_json::Value {
    json!({
        "version": 0.6,
        "elements": [{
            "type": "node",
            "id": id,
            "lat": 6.53,
            "lon": 3.38,
            "tags": {"amenity": "hospital", "name": "Test Hospital"}
        }]
    })
}

async fn mount_ok(server: &MockServer, body: serde_json::Value, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(INTERPRETER))
        .respond_with(ResponseTemplate::new(200).set_body_json(&body))
        .expect(expected_calls)
        .mount(server)
        .await;
}

async fn mount_status(server: &MockServer, status: u16, expected_calls: u64) {
    Mock::given(method("POST"))
        .and(path(INTERPRETER))
        .respond_with(ResponseTemplate::new(status))
        .expect(expected_calls)
        .mount(server)
        .await;
}

// ---------------------------------------------------------------------------
// Request shape
// ---------------------------------------------------------------------------

#[tokio::test]
async fn fetch_posts_overpass_ql_as_plain_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(INTERPRETER))
        .and(header("content-type", "text/plain; charset=utf-8"))
        .and(body_string_contains("[out:json]"))
        .and(body_string_contains(
            r#"way["amenity"="clinic"](around:5000,6.5244,3.3792);"#,
        ))
        .and(body_string_contains("out center;"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&hospital_body(1)))
        .expect(1)
        .mount(&server)
        .await;

    let gw = gateway(&[endpoint(&server, 1)], Duration::from_secs(5));
    let raw = gw
        .fetch(&lagos_query(), &CancellationToken::new())
        .await
        .expect("fetch should succeed");

    assert_eq!(raw.elements().len(), 1);
    assert_eq!(raw.served_by, format!("{}{INTERPRETER}", server.uri()));
}

// ---------------------------------------------------------------------------
// Failover
// ---------------------------------------------------------------------------

#[tokio::test]
async fn first_success_stops_iteration() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    mount_ok(&a, hospital_body(1), 1).await;
    mount_ok(&b, hospital_body(2), 0).await;

    let gw = gateway(&[endpoint(&a, 1), endpoint(&b, 2)], Duration::from_secs(5));
    let raw = gw.fetch(&lagos_query(), &CancellationToken::new()).await.unwrap();

    assert_eq!(raw.elements()[0]["id"], 1);
}

#[tokio::test]
async fn bad_status_fails_over_to_next_mirror() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    let c = MockServer::start().await;
    mount_status(&a, 429, 1).await;
    mount_ok(&b, hospital_body(2), 1).await;
    mount_ok(&c, hospital_body(3), 0).await;

    let gw = gateway(
        &[endpoint(&a, 1), endpoint(&b, 2), endpoint(&c, 3)],
        Duration::from_secs(5),
    );
    let raw = gw.fetch(&lagos_query(), &CancellationToken::new()).await.unwrap();

    assert_eq!(raw.elements()[0]["id"], 2);
    assert_eq!(raw.served_by, format!("{}{INTERPRETER}", b.uri()));
}

#[tokio::test]
async fn timeout_fails_over_to_next_mirror() {
    let slow = MockServer::start().await;
    let fast = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&hospital_body(1))
                .set_delay(Duration::from_secs(3)),
        )
        .expect(1)
        .mount(&slow)
        .await;
    mount_ok(&fast, hospital_body(2), 1).await;

    let gw = gateway(&[endpoint(&slow, 1), endpoint(&fast, 2)], Duration::from_millis(200));
    let started = Instant::now();
    let raw = gw.fetch(&lagos_query(), &CancellationToken::new()).await.unwrap();

    assert_eq!(raw.elements()[0]["id"], 2);
    assert!(started.elapsed() < Duration::from_secs(2), "timeout was not enforced");
}

#[tokio::test]
async fn html_body_counts_as_attempt_failure() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>rate limited</html>"))
        .expect(1)
        .mount(&a)
        .await;
    mount_ok(&b, hospital_body(2), 1).await;

    let gw = gateway(&[endpoint(&a, 1), endpoint(&b, 2)], Duration::from_secs(5));
    let raw = gw.fetch(&lagos_query(), &CancellationToken::new()).await.unwrap();
    assert_eq!(raw.elements()[0]["id"], 2);
}

#[tokio::test]
async fn priority_decides_order_not_list_position() {
    let low = MockServer::start().await;
    let high = MockServer::start().await;
    mount_ok(&high, hospital_body(7), 1).await;
    mount_ok(&low, hospital_body(8), 0).await;

    let gw = gateway(&[endpoint(&low, 5), endpoint(&high, 1)], Duration::from_secs(5));
    let raw = gw.fetch(&lagos_query(), &CancellationToken::new()).await.unwrap();
    assert_eq!(raw.elements()[0]["id"], 7);
}

#[tokio::test]
async fn empty_elements_is_a_success() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    mount_ok(&a, json!({"elements": []}), 1).await;
    mount_ok(&b, hospital_body(2), 0).await;

    let gw = gateway(&[endpoint(&a, 1), endpoint(&b, 2)], Duration::from_secs(5));
    let raw = gw.fetch(&lagos_query(), &CancellationToken::new()).await.unwrap();
    assert!(raw.elements().is_empty());
}

// ---------------------------------------------------------------------------
// Exhaustion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn both_504_exhaust_with_bad_response() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    mount_status(&a, 504, 1).await;
    mount_status(&b, 504, 1).await;

    let gw = gateway(&[endpoint(&a, 1), endpoint(&b, 2)], Duration::from_secs(5));
    let err = gw
        .fetch(&lagos_query(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        GatewayError::AllExhausted {
            attempts,
            classification,
            last,
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(classification, FailureClass::BadResponse);
            assert!(matches!(
                *last,
                AttemptFailure::UnexpectedStatus { status: 504, .. }
            ));
            assert_eq!(last.url(), format!("{}{INTERPRETER}", b.uri()));
        }
        other => panic!("expected AllExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn exhaustion_reports_last_failure_classification() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    mount_status(&a, 500, 1).await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&hospital_body(1))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&b)
        .await;

    let gw = gateway(&[endpoint(&a, 1), endpoint(&b, 2)], Duration::from_millis(200));
    let err = gw
        .fetch(&lagos_query(), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(
        matches!(
            err,
            GatewayError::AllExhausted {
                classification: FailureClass::Timeout,
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn malformed_json_and_missing_elements_are_bad_responses() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{\"elements\": [", "application/json"))
        .expect(1)
        .mount(&a)
        .await;
    mount_ok(&b, json!({"version": 0.6}), 1).await;

    let gw = gateway(&[endpoint(&a, 1), endpoint(&b, 2)], Duration::from_secs(5));
    let err = gw
        .fetch(&lagos_query(), &CancellationToken::new())
        .await
        .unwrap_err();

    match err {
        GatewayError::AllExhausted { last, .. } => {
            assert!(matches!(*last, AttemptFailure::MissingElements { .. }), "got {last:?}");
        }
        other => panic!("expected AllExhausted, got {other:?}"),
    }
}

#[tokio::test]
async fn provider_runtime_remark_is_an_attempt_failure() {
    let a = MockServer::start().await;
    let b = MockServer::start().await;
    mount_ok(
        &a,
        json!({"elements": [], "remark": "runtime error: Query run out of memory using about 2048 MB of RAM."}),
        1,
    )
    .await;
    mount_ok(&b, hospital_body(2), 1).await;

    let gw = gateway(&[endpoint(&a, 1), endpoint(&b, 2)], Duration::from_secs(5));
    let raw = gw.fetch(&lagos_query(), &CancellationToken::new()).await.unwrap();
    assert_eq!(raw.elements()[0]["id"], 2);
}

#[tokio::test]
async fn unreachable_mirror_is_classified_unavailable() {
    let gw = gateway(
        &[ProviderEndpoint::new("http://127.0.0.1:1/api/interpreter", 1)],
        Duration::from_secs(5),
    );
    let err = gw
        .fetch(&lagos_query(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            GatewayError::AllExhausted {
                attempts: 1,
                classification: FailureClass::Unavailable,
                ..
            }
        ),
        "got {err:?}"
    );
}

#[tokio::test]
async fn no_endpoints_is_reported() {
    let gw = gateway(&[], Duration::from_secs(5));
    let err = gw
        .fetch(&lagos_query(), &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, GatewayError::NoEndpoints));
}

// ---------------------------------------------------------------------------
// Cancellation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn cancelled_token_sends_no_requests() {
    let a = MockServer::start().await;
    mount_ok(&a, hospital_body(1), 0).await;

    let cancel = CancellationToken::new();
    cancel.cancel();

    let gw = gateway(&[endpoint(&a, 1)], Duration::from_secs(5));
    let err = gw.fetch(&lagos_query(), &cancel).await.unwrap_err();
    assert!(matches!(err, GatewayError::Cancelled));
}

#[tokio::test]
async fn cancel_aborts_in_flight_request() {
    let slow = MockServer::start().await;
    let next = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(&hospital_body(1))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&slow)
        .await;
    mount_ok(&next, hospital_body(2), 0).await;

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        trigger.cancel();
    });

    let gw = gateway(&[endpoint(&slow, 1), endpoint(&next, 2)], Duration::from_secs(30));
    let started = Instant::now();
    let err = gw.fetch(&lagos_query(), &cancel).await.unwrap_err();

    assert!(matches!(err, GatewayError::Cancelled), "got {err:?}");
    assert!(started.elapsed() < Duration::from_secs(3));
}
