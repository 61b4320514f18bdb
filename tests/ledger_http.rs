//! Integration tests for the reqwest transport
//!
//! These tests run the ledger client over real HTTP against a local axum server that mimics the
//! spreadsheet ledger's moods: accepting everything, accepting only JSON, failing, or answering
//! status queries for one action name only.

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode, Uri},
    routing::any,
    Router,
};
use chrono::{TimeZone, Utc};
use snack_ledger::amount::Amount;
use snack_ledger::catalog::fetch_active_menu;
use snack_ledger::ledger::{
    LedgerClient, LedgerSettings, OrderPayload, ReqwestTransport, SubmitOutcome, SubmitStrategy,
};
use snack_ledger::model::{Customer, DateKey, OrderRecord};
use snack_ledger::observability::SubmissionMetrics;
use snack_ledger::status::FulfillmentStatus;
use snack_ledger::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Clone, Copy)]
enum Mode {
    AcceptAll,
    JsonOnly,
    Down,
    TrackOnly,
}

#[derive(Debug, Clone)]
struct Hit {
    method: Method,
    content_type: String,
    query: String,
    body: String,
}

#[derive(Clone)]
struct MockLedger {
    mode: Mode,
    hits: Arc<Mutex<Vec<Hit>>>,
}

async fn handle(
    State(ledger): State<MockLedger>,
    method: Method,
    headers: HeaderMap,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    let content_type = headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let query = uri.query().unwrap_or_default().to_string();
    ledger.hits.lock().await.push(Hit {
        method: method.clone(),
        content_type: content_type.clone(),
        query: query.clone(),
        body,
    });

    match ledger.mode {
        Mode::AcceptAll => (StatusCode::OK, r#"{"result":"success"}"#.to_string()),
        Mode::JsonOnly if content_type.starts_with("application/json") => {
            (StatusCode::OK, r#"{"result":"success"}"#.to_string())
        }
        Mode::JsonOnly => (
            StatusCode::UNSUPPORTED_MEDIA_TYPE,
            "json only".to_string(),
        ),
        Mode::Down => (StatusCode::INTERNAL_SERVER_ERROR, "boom".to_string()),
        Mode::TrackOnly if query.contains("action=track&") => (
            StatusCode::OK,
            r#"{"order": {"Order ID": "7", "Status": "In Kitchen", "Total": 45.5}}"#.to_string(),
        ),
        Mode::TrackOnly if query.contains("action=menu") => (
            StatusCode::OK,
            r#"[{"name": "Tea", "price": 10, "image": "http://img.example/tea.jpg"},
                {"name": "Coffee", "price": 20, "active": "no"}]"#
                .to_string(),
        ),
        Mode::TrackOnly => (StatusCode::NOT_FOUND, String::new()),
    }
}

/// Start a mock ledger and return its endpoint URL.
async fn spawn_ledger(mode: Mode) -> (String, Arc<Mutex<Vec<Hit>>>) {
    let hits = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().route("/exec", any(handle)).with_state(MockLedger {
        mode,
        hits: hits.clone(),
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock ledger");
    let addr = listener.local_addr().expect("Failed to read local address");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock ledger failed");
    });
    (format!("http://{}/exec", addr), hits)
}

fn payload() -> OrderPayload {
    let record = OrderRecord::new(
        7,
        DateKey::parse("2024-01-01").expect("Failed to parse date"),
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
        Customer::new("Asha Rao", "9876543210").with_email("asha@example.com"),
        "Tea x2, Samosa x1",
        Amount::from_paise(4550),
    );
    OrderPayload::from_record(
        &record,
        "appendOrder",
        Utc.with_ymd_and_hms(2024, 1, 1, 9, 1, 0).unwrap(),
        FulfillmentStatus::PaymentVerified,
    )
}

fn client(endpoint: &str) -> LedgerClient<ReqwestTransport> {
    LedgerClient::new(
        ReqwestTransport::new().expect("Failed to build HTTP client"),
        LedgerSettings::new(endpoint),
    )
}

#[derive(Clone, Default)]
struct CountingMetrics {
    attempts: Arc<AtomicUsize>,
    uncertain: Arc<AtomicUsize>,
}

impl SubmissionMetrics for CountingMetrics {
    fn record_attempt(&self, _order_id: u64, _strategy: SubmitStrategy) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
    }

    fn record_uncertain(&self, _order_id: u64, _failed_attempts: usize) {
        self.uncertain.fetch_add(1, Ordering::SeqCst);
    }
}

#[tokio::test]
async fn test_legacy_form_accepted() {
    let (endpoint, hits) = spawn_ledger(Mode::AcceptAll).await;

    let outcome = client(&endpoint)
        .submit(&payload())
        .await
        .expect("Failed to submit");

    assert_eq!(
        outcome,
        SubmitOutcome::Confirmed {
            strategy: SubmitStrategy::LegacyForm,
            failures: vec![]
        }
    );
    let hits = hits.lock().await;
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].method, Method::POST);
    assert_eq!(
        hits[0].content_type,
        "application/x-www-form-urlencoded;charset=UTF-8"
    );
    assert!(hits[0].body.contains("orderId=7"));
    assert!(hits[0].body.contains("total=45.50"));
    assert!(hits[0].body.contains("customerName=Asha+Rao"));
    assert!(!hits[0].body.contains("action="));
}

#[tokio::test]
async fn test_json_fallback_when_forms_rejected() {
    let (endpoint, hits) = spawn_ledger(Mode::JsonOnly).await;

    let outcome = client(&endpoint)
        .submit(&payload())
        .await
        .expect("Failed to submit");

    match outcome {
        SubmitOutcome::Confirmed { strategy, failures } => {
            assert_eq!(strategy, SubmitStrategy::Json);
            assert_eq!(failures.len(), 2);
            assert_eq!(
                failures[0].cause,
                Error::HttpError {
                    status: 415,
                    body: "json only".to_string()
                }
            );
        }
        other => panic!("expected confirmed delivery, got {:?}", other),
    }

    let hits = hits.lock().await;
    assert_eq!(hits.len(), 3);
    assert!(hits[1].body.contains("action=appendOrder"));
    assert!(hits[1].body.contains("phone=9876543210"));
    let json: serde_json::Value =
        serde_json::from_str(&hits[2].body).expect("Failed to parse JSON body");
    assert_eq!(json["orderId"], "7");
    assert_eq!(json["email"], "asha@example.com");
    assert_eq!(json["status"], "payment_verified");
}

#[tokio::test]
async fn test_failing_ledger_is_uncertain() {
    let (endpoint, hits) = spawn_ledger(Mode::Down).await;
    let metrics = CountingMetrics::default();

    let outcome = client(&endpoint)
        .with_metrics(metrics.clone())
        .submit(&payload())
        .await
        .expect("Failed to submit");

    assert!(outcome.is_uncertain());
    assert_eq!(outcome.failures().len(), 4);
    assert_eq!(metrics.attempts.load(Ordering::SeqCst), 5);
    assert_eq!(metrics.uncertain.load(Ordering::SeqCst), 1);

    let hits = hits.lock().await;
    assert_eq!(hits.len(), 5);
    assert_eq!(hits[3].method, Method::GET);
    assert!(hits[3].query.contains("orderDate=2024-01-01"));
    assert_eq!(hits[4].body, hits[0].body);
}

#[tokio::test]
async fn test_unreachable_ledger_is_uncertain() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind");
    let addr = listener.local_addr().expect("Failed to read local address");
    drop(listener);

    let outcome = client(&format!("http://{}/exec", addr))
        .submit(&payload())
        .await
        .expect("Failed to submit");

    assert!(outcome.is_uncertain());
    assert!(outcome
        .failures()
        .iter()
        .all(|failure| matches!(failure.cause, Error::NetworkError(_))));
}

#[tokio::test]
async fn test_fetch_status_over_http() {
    let (endpoint, hits) = spawn_ledger(Mode::TrackOnly).await;
    let date = DateKey::parse("2024-01-01").expect("Failed to parse date");

    let status = client(&endpoint)
        .fetch_status(Some(&date), 7)
        .await
        .expect("Failed to fetch status");

    assert_eq!(status.order_id, 7);
    assert_eq!(status.ledger_status, Some(FulfillmentStatus::Preparing));
    assert_eq!(status.total, Amount::from_paise(4550));

    let hits = hits.lock().await;
    assert_eq!(hits.len(), 2);
    assert!(hits[0].query.starts_with("action=trackOrder&"));
    assert!(hits[1].query.contains("date=2024-01-01"));
}

#[tokio::test]
async fn test_menu_over_http() {
    let (endpoint, _) = spawn_ledger(Mode::TrackOnly).await;
    let transport = ReqwestTransport::new().expect("Failed to build HTTP client");

    let items = fetch_active_menu(&transport, &endpoint)
        .await
        .expect("Failed to fetch menu");

    assert_eq!(items.len(), 1);
    assert_eq!(items[0].name, "Tea");
    assert_eq!(items[0].image, "https://img.example/tea.jpg");
}
