//! Client for the remote, spreadsheet-backed order ledger.
//!
//! [`LedgerClient::submit`] delivers a finalized order through the fallback chain described in
//! [`strategy`]; [`LedgerClient::fetch_status`] asks the ledger what it knows about an order.
//! Both go through a [`LedgerTransport`], so tests can swap the network for a
//! [`ScriptedTransport`].

pub mod payload;
pub mod remote;
pub mod strategy;
pub mod transport;

pub use payload::OrderPayload;
pub use remote::{normalize_tracked_order, parse_track_payload, RemoteOrderStatus};
pub use strategy::{AttemptFailure, SubmitOutcome, SubmitStrategy};
pub use transport::{
    LedgerRequest, LedgerResponse, LedgerTransport, ReqwestTransport, ScriptedTransport,
    SentRequest, FORM_CONTENT_TYPE,
};

use crate::config::is_configured_value;
use crate::error::{Error, Result};
use crate::model::DateKey;
use crate::observability::{NoOpMetrics, SubmissionMetrics};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Default `action` sent with submissions.
pub const DEFAULT_POST_ACTION: &str = "appendOrder";

/// Default first `action` tried by status queries.
pub const DEFAULT_TRACK_ACTION: &str = "trackOrder";

/// Status-query actions tried after the configured one.
pub const FALLBACK_TRACK_ACTIONS: [&str; 2] = ["track", "orderStatus"];

/// Longest response body kept in an attempt failure.
pub const BODY_EXCERPT_CHARS: usize = 200;

/// Where and how to reach the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSettings {
    /// Ledger endpoint URL. `None` or a placeholder value means unconfigured.
    pub endpoint: Option<String>,
    pub post_action: String,
    pub track_action: String,
}

impl Default for LedgerSettings {
    fn default() -> Self {
        LedgerSettings {
            endpoint: None,
            post_action: DEFAULT_POST_ACTION.to_string(),
            track_action: DEFAULT_TRACK_ACTION.to_string(),
        }
    }
}

impl LedgerSettings {
    pub fn new(endpoint: impl Into<String>) -> Self {
        LedgerSettings {
            endpoint: Some(endpoint.into()),
            ..Default::default()
        }
    }

    pub fn with_post_action(mut self, action: impl Into<String>) -> Self {
        self.post_action = action.into();
        self
    }

    pub fn with_track_action(mut self, action: impl Into<String>) -> Self {
        self.track_action = action.into();
        self
    }

    /// Parsed endpoint URL.
    ///
    /// # Errors
    /// Returns `Error::ConfigMissing` if the endpoint is absent, a placeholder, or not an
    /// http(s) URL
    pub fn endpoint_url(&self) -> Result<Url> {
        let raw = match self.endpoint.as_deref() {
            Some(raw) if is_configured_value(raw) => raw.trim(),
            _ => {
                return Err(Error::ConfigMissing(
                    "ledger endpoint is not configured".to_string(),
                ))
            }
        };
        let url = Url::parse(raw).map_err(|e| {
            Error::ConfigMissing(format!("ledger endpoint {:?} is not a URL: {}", raw, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(Error::ConfigMissing(format!(
                "ledger endpoint {:?} is not an http(s) URL",
                raw
            )));
        }
        Ok(url)
    }
}

/// Ledger client over a pluggable transport.
///
/// # Example
///
/// ```
/// use snack_ledger::ledger::{LedgerClient, LedgerSettings, ScriptedTransport};
///
/// let client = LedgerClient::new(
///     ScriptedTransport::new(),
///     LedgerSettings::new("https://ledger.example/exec"),
/// );
/// assert_eq!(client.post_action(), "appendOrder");
/// ```
#[derive(Clone)]
pub struct LedgerClient<T: LedgerTransport> {
    transport: T,
    settings: LedgerSettings,
    metrics: Arc<dyn SubmissionMetrics>,
}

impl<T: LedgerTransport> LedgerClient<T> {
    pub fn new(transport: T, settings: LedgerSettings) -> Self {
        LedgerClient {
            transport,
            settings,
            metrics: Arc::new(NoOpMetrics),
        }
    }

    /// Set custom metrics handler.
    pub fn with_metrics(mut self, metrics: impl SubmissionMetrics + 'static) -> Self {
        self.metrics = Arc::new(metrics);
        self
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn settings(&self) -> &LedgerSettings {
        &self.settings
    }

    /// `action` value to put in submission payloads.
    pub fn post_action(&self) -> &str {
        &self.settings.post_action
    }

    pub fn is_configured(&self) -> bool {
        self.settings.endpoint_url().is_ok()
    }

    /// Deliver `payload` to the ledger.
    ///
    /// Tries each confirmable strategy in order and returns at the first success response.
    /// When all of them fail, the opaque fallback is sent and the outcome is
    /// [`SubmitOutcome::Uncertain`]; a failure of the fallback itself is only logged and
    /// recorded in the attempt log.
    ///
    /// # Errors
    /// Returns `Error::ConfigMissing` if no endpoint is configured. No request is sent in that
    /// case. Every other failure is absorbed into the outcome.
    pub async fn submit(&self, payload: &OrderPayload) -> Result<SubmitOutcome> {
        let url = self.settings.endpoint_url()?;
        let started = Instant::now();
        let mut failures = Vec::new();

        for strategy in SubmitStrategy::CONFIRMABLE {
            self.metrics.record_attempt(payload.order_id, strategy);
            let request = build_request(strategy, &url, payload);
            match self.confirm(&request).await {
                Ok(()) => {
                    info!("Order {} delivered to ledger via {}", payload.order_id, strategy);
                    self.metrics
                        .record_delivered(payload.order_id, strategy, started.elapsed());
                    return Ok(SubmitOutcome::Confirmed { strategy, failures });
                }
                Err(cause) => {
                    warn!(
                        "Order {} {} attempt failed: {}",
                        payload.order_id, strategy, cause
                    );
                    self.metrics.record_failure(payload.order_id, strategy, &cause);
                    failures.push(AttemptFailure { strategy, cause });
                }
            }
        }

        let strategy = SubmitStrategy::OpaqueForm;
        self.metrics.record_attempt(payload.order_id, strategy);
        let request = build_request(strategy, &url, payload);
        if let Err(cause) = self.transport.send_opaque(&request).await {
            warn!(
                "Order {} opaque fallback could not be sent: {}",
                payload.order_id, cause
            );
            self.metrics.record_failure(payload.order_id, strategy, &cause);
            failures.push(AttemptFailure { strategy, cause });
        }

        warn!(
            "Order {} sent without confirmation after {} failed attempts",
            payload.order_id,
            failures.len()
        );
        self.metrics.record_uncertain(payload.order_id, failures.len());
        Ok(SubmitOutcome::Uncertain { failures })
    }

    /// Ask the ledger for the current state of an order.
    ///
    /// Tries the configured track action, then `track` and `orderStatus`. Non-success
    /// responses, empty bodies, non-JSON bodies and payloads without a usable order all move
    /// on to the next action.
    ///
    /// # Errors
    ///
    /// - `Error::ConfigMissing`: no endpoint configured; nothing is sent.
    /// - `Error::InvalidInput`: `order_id` is 0.
    /// - The last `Error::HttpError` or `Error::NetworkError` seen once every action is
    ///   exhausted, or `Error::ParseError` if every response arrived but none was usable.
    pub async fn fetch_status(
        &self,
        date: Option<&DateKey>,
        order_id: u64,
    ) -> Result<RemoteOrderStatus> {
        let url = self.settings.endpoint_url()?;
        if order_id == 0 {
            return Err(Error::InvalidInput("order id must be positive".to_string()));
        }

        let id = order_id.to_string();
        let date = date.map(|d| d.to_string());
        let mut last_error = None;

        for action in self.track_actions() {
            let mut pairs = vec![
                ("action".to_string(), action.to_string()),
                ("orderId".to_string(), id.clone()),
                ("id".to_string(), id.clone()),
            ];
            if let Some(date) = &date {
                pairs.push(("orderDate".to_string(), date.clone()));
                pairs.push(("date".to_string(), date.clone()));
            }
            let request = LedgerRequest::Get {
                url: set_query_pairs(&url, &pairs),
            };

            let response = match self.transport.send(&request).await {
                Ok(response) => response,
                Err(e) => {
                    warn!("Status query {} for order {} failed: {}", action, order_id, e);
                    last_error = Some(e);
                    continue;
                }
            };
            if !response.is_success() {
                debug!(
                    "Status query {} for order {} returned HTTP {}",
                    action, order_id, response.status
                );
                last_error = Some(Error::HttpError {
                    status: response.status,
                    body: excerpt(&response.body),
                });
                continue;
            }

            let body = response.body.trim();
            if body.is_empty() {
                debug!("Status query {} returned an empty body", action);
                continue;
            }
            let payload: serde_json::Value = match serde_json::from_str(body) {
                Ok(payload) => payload,
                Err(e) => {
                    debug!("Status query {} returned non-JSON: {}", action, e);
                    continue;
                }
            };
            if let Some(status) = parse_track_payload(&payload, order_id) {
                debug!(
                    "Ledger reports order {} as {:?}",
                    order_id, status.ledger_status
                );
                return Ok(status);
            }
        }

        Err(last_error.unwrap_or_else(|| {
            Error::ParseError(format!("no usable status for order {} from ledger", order_id))
        }))
    }

    fn track_actions(&self) -> Vec<&str> {
        let mut actions: Vec<&str> = Vec::new();
        let configured = self.settings.track_action.trim();
        for action in std::iter::once(configured).chain(FALLBACK_TRACK_ACTIONS) {
            if !action.is_empty() && !actions.contains(&action) {
                actions.push(action);
            }
        }
        actions
    }

    async fn confirm(&self, request: &LedgerRequest) -> Result<()> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(Error::HttpError {
                status: response.status,
                body: excerpt(&response.body),
            })
        }
    }
}

/// Build the request a strategy sends.
pub fn build_request(strategy: SubmitStrategy, url: &Url, payload: &OrderPayload) -> LedgerRequest {
    match strategy {
        SubmitStrategy::LegacyForm | SubmitStrategy::OpaqueForm => LedgerRequest::PostForm {
            url: url.clone(),
            fields: payload.legacy_fields(),
        },
        SubmitStrategy::FullForm => LedgerRequest::PostForm {
            url: url.clone(),
            fields: payload.full_fields(),
        },
        SubmitStrategy::Json => LedgerRequest::PostJson {
            url: url.clone(),
            body: payload.to_json(),
        },
        SubmitStrategy::QueryString => LedgerRequest::Get {
            url: set_query_pairs(url, &payload.full_fields()),
        },
    }
}

/// Copy of `url` with `pairs` set as query parameters, replacing any existing values for the
/// same names. Other parameters are kept in place.
pub fn set_query_pairs(url: &Url, pairs: &[(String, String)]) -> Url {
    let mut url = url.clone();
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !pairs.iter().any(|(name, _)| *key == name.as_str()))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept.iter())
        .extend_pairs(pairs.iter());
    url
}

/// Trimmed response body capped at [`BODY_EXCERPT_CHARS`] characters.
pub(crate) fn excerpt(body: &str) -> String {
    body.trim().chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::amount::Amount;
    use crate::status::FulfillmentStatus;
    use chrono::{TimeZone, Utc};

    const ENDPOINT: &str = "https://ledger.example/exec";

    fn payload() -> OrderPayload {
        OrderPayload {
            action: DEFAULT_POST_ACTION.to_string(),
            order_id: 7,
            order_date: DateKey::parse("2024-01-01").unwrap(),
            customer_name: "Asha".to_string(),
            customer_email: String::new(),
            customer_phone: "9876543210".to_string(),
            items: "Tea x2".to_string(),
            total: Amount::from_rupees(30),
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            status: FulfillmentStatus::PaymentVerified,
        }
    }

    fn client(transport: ScriptedTransport) -> LedgerClient<ScriptedTransport> {
        LedgerClient::new(transport, LedgerSettings::new(ENDPOINT))
    }

    #[tokio::test]
    async fn test_first_success_short_circuits() {
        let transport = ScriptedTransport::new().then_status(200, "ok");
        let outcome = client(transport.clone()).submit(&payload()).await.unwrap();

        assert_eq!(
            outcome,
            SubmitOutcome::Confirmed {
                strategy: SubmitStrategy::LegacyForm,
                failures: vec![]
            }
        );
        assert_eq!(transport.call_count().await, 1);
    }

    #[tokio::test]
    async fn test_falls_through_to_json() {
        let transport = ScriptedTransport::new()
            .then_status(405, "method not allowed")
            .then_network_error("cors");
        let outcome = client(transport.clone()).submit(&payload()).await.unwrap();

        match outcome {
            SubmitOutcome::Confirmed { strategy, failures } => {
                assert_eq!(strategy, SubmitStrategy::Json);
                assert_eq!(failures.len(), 2);
                assert_eq!(failures[0].strategy, SubmitStrategy::LegacyForm);
                assert_eq!(failures[1].strategy, SubmitStrategy::FullForm);
            }
            other => panic!("unexpected outcome {:?}", other),
        }
        let sent = transport.requests().await;
        assert_eq!(sent.len(), 3);
        assert!(matches!(sent[2].request, LedgerRequest::PostJson { .. }));
    }

    #[tokio::test]
    async fn test_exhaustion_is_uncertain() {
        let transport = ScriptedTransport::new()
            .then_status(500, "a")
            .then_status(500, "b")
            .then_status(500, "c")
            .then_status(500, "d");
        let outcome = client(transport.clone()).submit(&payload()).await.unwrap();

        assert!(outcome.is_uncertain());
        assert_eq!(outcome.failures().len(), 4);
        let sent = transport.requests().await;
        assert_eq!(sent.len(), 5);
        assert!(sent[4].opaque);
        assert_eq!(sent[3].request.method(), "GET");
    }

    #[tokio::test]
    async fn test_opaque_failure_still_uncertain() {
        let transport = ScriptedTransport::new()
            .then_network_error("down")
            .then_network_error("down")
            .then_network_error("down")
            .then_network_error("down")
            .then_network_error("down");
        let outcome = client(transport).submit(&payload()).await.unwrap();

        assert!(outcome.is_uncertain());
        assert_eq!(outcome.failures().len(), 5);
        assert_eq!(outcome.failures()[4].strategy, SubmitStrategy::OpaqueForm);
    }

    #[tokio::test]
    async fn test_unconfigured_endpoint_sends_nothing() {
        for endpoint in [None, Some(""), Some("YOUR_SCRIPT_URL"), Some("<url>"), Some("ftp://x")] {
            let transport = ScriptedTransport::new();
            let settings = LedgerSettings {
                endpoint: endpoint.map(str::to_string),
                ..Default::default()
            };
            let client = LedgerClient::new(transport.clone(), settings);

            assert!(matches!(
                client.submit(&payload()).await,
                Err(Error::ConfigMissing(_))
            ));
            assert!(matches!(
                client.fetch_status(None, 7).await,
                Err(Error::ConfigMissing(_))
            ));
            assert_eq!(transport.call_count().await, 0);
        }
    }

    #[tokio::test]
    async fn test_body_excerpt_is_capped() {
        let long = "x".repeat(500);
        let transport = ScriptedTransport::new().then_status(500, long);
        let outcome = client(transport).submit(&payload()).await.unwrap();

        match &outcome.failures()[0].cause {
            Error::HttpError { status, body } => {
                assert_eq!(*status, 500);
                assert_eq!(body.chars().count(), BODY_EXCERPT_CHARS);
            }
            other => panic!("unexpected cause {:?}", other),
        }
    }

    #[test]
    fn test_query_pairs_replace_existing() {
        let url: Url = "https://ledger.example/exec?action=old&keep=1".parse().unwrap();
        let updated = set_query_pairs(
            &url,
            &[
                ("action".to_string(), "trackOrder".to_string()),
                ("orderId".to_string(), "7".to_string()),
            ],
        );
        let pairs: Vec<(String, String)> = updated.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("keep".to_string(), "1".to_string()),
                ("action".to_string(), "trackOrder".to_string()),
                ("orderId".to_string(), "7".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn test_fetch_status_walks_actions() {
        let transport = ScriptedTransport::new()
            .then_status(404, "")
            .then_status(200, "<html>not json</html>")
            .then_status(200, r#"{"order": {"orderId": 7, "status": "Ready"}}"#);
        let date = DateKey::parse("2024-01-01").unwrap();
        let status = client(transport.clone())
            .fetch_status(Some(&date), 7)
            .await
            .unwrap();

        assert_eq!(status.ledger_status, Some(FulfillmentStatus::ReadyForPickup));
        let sent = transport.requests().await;
        let actions: Vec<Option<String>> =
            sent.iter().map(|s| s.request.field("action")).collect();
        assert_eq!(
            actions,
            vec![
                Some("trackOrder".to_string()),
                Some("track".to_string()),
                Some("orderStatus".to_string())
            ]
        );
        assert_eq!(sent[0].request.field("date"), Some("2024-01-01".to_string()));
        assert_eq!(sent[0].request.field("id"), Some("7".to_string()));
    }

    #[tokio::test]
    async fn test_fetch_status_exhaustion_errors() {
        let transport = ScriptedTransport::new()
            .then_status(200, "")
            .then_status(503, "busy")
            .then_status(200, "[]");
        let err = client(transport).fetch_status(None, 7).await.unwrap_err();
        assert_eq!(
            err,
            Error::HttpError {
                status: 503,
                body: "busy".to_string()
            }
        );

        let transport = ScriptedTransport::new()
            .then_status(200, "")
            .then_status(200, "{}")
            .then_status(200, "nope");
        let err = client(transport).fetch_status(None, 7).await.unwrap_err();
        assert!(matches!(err, Error::ParseError(_)));
    }

    #[tokio::test]
    async fn test_duplicate_track_action_is_skipped() {
        let transport = ScriptedTransport::new()
            .then_status(500, "")
            .then_status(500, "");
        let settings = LedgerSettings::new(ENDPOINT).with_track_action("track");
        let client = LedgerClient::new(transport.clone(), settings);

        assert!(client.fetch_status(None, 3).await.is_err());
        assert_eq!(transport.call_count().await, 2);
    }
}
