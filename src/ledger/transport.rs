//! HTTP transports for the remote ledger.

use crate::error::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use url::Url;

/// Content type used for every form-encoded body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded;charset=UTF-8";

/// One request to the ledger endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerRequest {
    /// POST with a URL-encoded form body.
    PostForm {
        url: Url,
        fields: Vec<(String, String)>,
    },
    /// POST with a JSON body.
    PostJson { url: Url, body: Value },
    /// GET with everything in the query string.
    Get { url: Url },
}

impl LedgerRequest {
    pub fn url(&self) -> &Url {
        match self {
            LedgerRequest::PostForm { url, .. }
            | LedgerRequest::PostJson { url, .. }
            | LedgerRequest::Get { url } => url,
        }
    }

    pub fn method(&self) -> &'static str {
        match self {
            LedgerRequest::Get { .. } => "GET",
            _ => "POST",
        }
    }

    /// Value of a named field, wherever this request carries it.
    pub fn field(&self, name: &str) -> Option<String> {
        match self {
            LedgerRequest::PostForm { fields, .. } => fields
                .iter()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.clone()),
            LedgerRequest::PostJson { body, .. } => body.get(name).map(|value| match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            }),
            LedgerRequest::Get { url } => url
                .query_pairs()
                .find(|(key, _)| key == name)
                .map(|(_, value)| value.into_owned()),
        }
    }

    /// Names of all fields this request carries, in order.
    pub fn field_names(&self) -> Vec<String> {
        match self {
            LedgerRequest::PostForm { fields, .. } => {
                fields.iter().map(|(key, _)| key.clone()).collect()
            }
            LedgerRequest::PostJson { body, .. } => body
                .as_object()
                .map(|map| map.keys().cloned().collect())
                .unwrap_or_default(),
            LedgerRequest::Get { url } => url
                .query_pairs()
                .map(|(key, _)| key.into_owned())
                .collect(),
        }
    }
}

/// A readable ledger response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerResponse {
    pub status: u16,
    pub body: String,
}

impl LedgerResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport seam between the ledger client and the network.
///
/// `send` must return `Ok` for every response that arrived, whatever its status code;
/// `Err` is reserved for transport failures. `send_opaque` delivers a request without
/// exposing the response at all.
#[allow(async_fn_in_trait)]
pub trait LedgerTransport: Send + Sync + Clone {
    /// Send a request and read its response.
    ///
    /// # Errors
    /// Returns `Error::NetworkError` if no response arrived
    async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse>;

    /// Send a request whose response is never inspected.
    ///
    /// # Errors
    /// Returns `Error::NetworkError` if the request could not be handed to the network
    async fn send_opaque(&self, request: &LedgerRequest) -> Result<()> {
        self.send(request).await.map(|_| ())
    }
}

//--------------------------------------   ReqwestTransport   ---------------------------------------------------------

/// Production transport backed by `reqwest`.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: Arc<Client>,
}

impl ReqwestTransport {
    /// Build a transport with a default client.
    ///
    /// # Errors
    /// Returns `Error::Other` if the TLS backend cannot be initialised
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| Error::Other(format!("Could not initialize HTTP client: {}", e)))?;
        Ok(Self::with_client(client))
    }

    /// Wrap an existing client (custom timeouts, proxies).
    pub fn with_client(client: Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }

    fn build(&self, request: &LedgerRequest) -> RequestBuilder {
        match request {
            LedgerRequest::PostForm { url, fields } => {
                let body = url::form_urlencoded::Serializer::new(String::new())
                    .extend_pairs(fields.iter())
                    .finish();
                self.client
                    .post(url.clone())
                    .header(CONTENT_TYPE, FORM_CONTENT_TYPE)
                    .body(body)
            }
            LedgerRequest::PostJson { url, body } => self.client.post(url.clone()).json(body),
            LedgerRequest::Get { url } => self.client.get(url.clone()),
        }
    }
}

impl LedgerTransport for ReqwestTransport {
    async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse> {
        trace!("Sending {} {}", request.method(), request.url());
        let response = self
            .build(request)
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        let status = response.status().as_u16();
        // An unreadable body still carries a usable status code.
        let body = response.text().await.unwrap_or_default();
        trace!("{} {} -> {}", request.method(), request.url(), status);
        Ok(LedgerResponse { status, body })
    }

    async fn send_opaque(&self, request: &LedgerRequest) -> Result<()> {
        trace!("Sending opaque {} {}", request.method(), request.url());
        // The response is dropped unread.
        self.build(request)
            .send()
            .await
            .map_err(|e| Error::NetworkError(e.to_string()))?;
        Ok(())
    }
}

//--------------------------------------   ScriptedTransport   --------------------------------------------------------

/// A request observed by [`ScriptedTransport`].
#[derive(Debug, Clone, PartialEq)]
pub struct SentRequest {
    pub request: LedgerRequest,
    pub opaque: bool,
}

#[derive(Default)]
struct Script {
    replies: VecDeque<Result<LedgerResponse>>,
    sent: Vec<SentRequest>,
}

/// In-process transport replaying scripted replies and recording every request.
///
/// Replies are consumed in order, one per call (opaque calls included). Once the script
/// runs out every call gets `200 ok`. Clones share the same script and log.
///
/// # Example
///
/// ```
/// use snack_ledger::ledger::{LedgerRequest, LedgerTransport, ScriptedTransport};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> snack_ledger::Result<()> {
/// let transport = ScriptedTransport::new().then_status(500, "boom");
/// let request = LedgerRequest::Get { url: "https://ledger.example/exec".parse().unwrap() };
///
/// assert_eq!(transport.send(&request).await?.status, 500);
/// assert_eq!(transport.send(&request).await?.status, 200);
/// assert_eq!(transport.call_count().await, 2);
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    script: Arc<Mutex<Script>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response with the given status and body.
    pub fn then_status(self, status: u16, body: impl Into<String>) -> Self {
        self.then_reply(Ok(LedgerResponse::new(status, body)))
    }

    /// Queue a transport failure.
    pub fn then_network_error(self, message: impl Into<String>) -> Self {
        self.then_reply(Err(Error::NetworkError(message.into())))
    }

    /// Queue an arbitrary reply.
    pub fn then_reply(self, reply: Result<LedgerResponse>) -> Self {
        match self.script.try_lock() {
            Ok(mut script) => script.replies.push_back(reply),
            Err(_) => warn!("Scripted transport busy, reply not queued"),
        }
        self
    }

    /// Queue a reply on a transport already in use.
    pub async fn push_reply(&self, reply: Result<LedgerResponse>) {
        self.script.lock().await.replies.push_back(reply);
    }

    /// Every request seen so far.
    pub async fn requests(&self) -> Vec<SentRequest> {
        self.script.lock().await.sent.clone()
    }

    /// Number of calls seen so far.
    pub async fn call_count(&self) -> usize {
        self.script.lock().await.sent.len()
    }

    async fn record(&self, request: &LedgerRequest, opaque: bool) -> Result<LedgerResponse> {
        let mut script = self.script.lock().await;
        script.sent.push(SentRequest {
            request: request.clone(),
            opaque,
        });
        script
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok(LedgerResponse::new(200, "ok")))
    }
}

impl LedgerTransport for ScriptedTransport {
    async fn send(&self, request: &LedgerRequest) -> Result<LedgerResponse> {
        self.record(request, false).await
    }

    async fn send_opaque(&self, request: &LedgerRequest) -> Result<()> {
        self.record(request, true).await.map(|_| ())
    }
}
