//! Unisphere REST session client.
//!
//! One client owns the authenticated session for a single array endpoint: a
//! cookie store shared across requests, the rotating `EMC-CSRF-TOKEN` learned
//! from responses, and status-code driven error classification.
//!
//! The client never retries. Transport and remote errors propagate to the
//! calling module, whose fixed-interval loop is the retry mechanism.
//!
//! # Thread Safety
//!
//! The client is `Send` and `Sync` and is shared by every module task of one
//! endpoint. The token/authenticated pair is a single mutex-guarded critical
//! section: read the token before a submission, replace it when a response
//! carries a fresh one.

use crate::config::EndpointConfig;
use crate::error::{ExporterError, Result};
use crate::unisphere::request::{QueryOptions, ResourceType};
use crate::unisphere::types::{CreatedResource, ErrorEnvelope, InstanceCollection};
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;

const CSRF_TOKEN_HEADER: &str = "EMC-CSRF-TOKEN";
const REST_CLIENT_HEADER: &str = "X-EMC-REST-CLIENT";

/// A hung array must not wedge a poll cycle or a Prometheus scrape.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

pub struct UnisphereClient {
    endpoint: String,
    username: String,
    password: SecretString,
    session: Mutex<SessionState>,
    http: reqwest::Client,
}

#[derive(Default)]
struct SessionState {
    csrf_token: String,
    authenticated: bool,
}

#[derive(Serialize)]
struct RealtimeQueryRequest<'a> {
    paths: &'a [String],
    interval: u64,
}

impl UnisphereClient {
    /// Build a client for one endpoint. TLS verification and the connection
    /// cap are fixed here and never renegotiated.
    pub fn new(config: &EndpointConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .danger_accept_invalid_certs(config.insecure)
            .cookie_store(true)
            .pool_max_idle_per_host(1)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            endpoint: config.url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
            session: Mutex::new(SessionState::default()),
            http,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Whether the last exchange left the session authenticated.
    pub fn authenticated(&self) -> bool {
        self.session.lock().unwrap().authenticated
    }

    /// Fetch the list of resource instances matching the descriptor.
    ///
    /// An envelope with zero entries, or a body the envelope parser finds no
    /// usable data in, is success with an empty list, not an error.
    pub async fn get_instances(&self, query: &QueryOptions) -> Result<Vec<serde_json::Value>> {
        let body = self.send::<()>(Method::GET, &query.to_path(), None).await?;
        let collection: InstanceCollection = serde_json::from_slice(&body).unwrap_or_default();
        Ok(collection.entries.into_iter().map(|e| e.content).collect())
    }

    /// Create a server-side realtime query for the given catalog paths,
    /// sampled at `interval` (whole seconds).
    ///
    /// Returns the query id. An empty id means the array did not hand one out
    /// and the query must be treated as absent.
    pub async fn create_realtime_query(
        &self,
        paths: &[String],
        interval: Duration,
    ) -> Result<String> {
        let query = QueryOptions::new(ResourceType::MetricRealTimeQuery);
        let request = RealtimeQueryRequest {
            paths,
            interval: interval.as_secs(),
        };
        let body = self
            .send(Method::POST, &query.to_path(), Some(&request))
            .await?;
        let created: CreatedResource = serde_json::from_slice(&body).unwrap_or_default();
        debug!(query_id = %created.content.id, "created metric realtime query");
        Ok(created.content.id)
    }

    /// One HTTP exchange: standard headers, credential or CSRF token, status
    /// classification, token renewal.
    async fn send<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Vec<u8>> {
        let url = format!("{}{}", self.endpoint, path);
        let mut request = self
            .http
            .request(method.clone(), &url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(REST_CLIENT_HEADER, "true");

        if method == Method::GET {
            request = request.basic_auth(&self.username, Some(self.password.expose_secret()));
        } else {
            // The token may still be empty on the very first submission; the
            // array answers 401 with a fresh one and the next call carries it.
            let token = self.session.lock().unwrap().csrf_token.clone();
            request = request.header(CSRF_TOKEN_HEADER, token);
            if let Some(body) = body {
                request = request.json(body);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        let fresh_token = response
            .headers()
            .get(CSRF_TOKEN_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned);
        let body = response.bytes().await?.to_vec();

        match status {
            StatusCode::UNAUTHORIZED => {
                self.session.lock().unwrap().authenticated = false;
            }
            StatusCode::FORBIDDEN => return Err(ExporterError::Forbidden),
            StatusCode::NOT_FOUND => return Err(ExporterError::NotFound),
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::INTERNAL_SERVER_ERROR => {
                return Err(ExporterError::Remote {
                    status: status.as_u16(),
                    message: remote_error_message(&body),
                });
            }
            // Other statuses are not classified; the body still goes to the
            // caller's parser, which may find nothing usable in it.
            _ => {}
        }

        if let Some(token) = fresh_token {
            if !token.is_empty() {
                let mut session = self.session.lock().unwrap();
                session.csrf_token = token;
                session.authenticated = true;
            }
        }

        Ok(body)
    }
}

/// First english localized message of an error envelope, empty when absent.
fn remote_error_message(body: &[u8]) -> String {
    let envelope: ErrorEnvelope = serde_json::from_slice(body).unwrap_or_default();
    envelope
        .error
        .messages
        .into_iter()
        .next()
        .map(|m| m.en_us)
        .unwrap_or_default()
}
