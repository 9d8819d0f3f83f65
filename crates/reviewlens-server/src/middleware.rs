//! Request tagging, bearer auth, and per-client rate limiting for the review
//! API. Each lookup fans out to rate-limited upstream providers, so budgets
//! are tracked per caller rather than for the whole server.

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use reviewlens_core::{AppConfig, Environment};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

const REQUEST_ID_HEADER: &str = "x-request-id";
const MAX_REQUEST_ID_LEN: usize = 128;

/// Expired client windows are pruned once the table reaches this size.
const MAX_TRACKED_CLIENTS: usize = 10_000;

/// Request ID stored as a request extension.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Accepted bearer tokens. An empty set turns auth off.
#[derive(Debug, Clone)]
pub struct AuthState {
    api_keys: Arc<HashSet<String>>,
}

impl AuthState {
    /// Builds auth from `AppConfig::api_keys`.
    ///
    /// # Errors
    ///
    /// Fails outside development when no keys are configured.
    pub fn from_config(config: &AppConfig) -> anyhow::Result<Self> {
        Self::new(
            config.api_keys.iter().cloned(),
            config.env == Environment::Development,
        )
    }

    /// # Errors
    ///
    /// Fails when `keys` holds no usable token and `is_development` is false.
    pub fn new(
        keys: impl IntoIterator<Item = String>,
        is_development: bool,
    ) -> anyhow::Result<Self> {
        let api_keys: HashSet<String> = keys.into_iter().filter(|k| !k.is_empty()).collect();
        if api_keys.is_empty() {
            anyhow::ensure!(
                is_development,
                "REVIEWLENS_API_KEYS is required outside development"
            );
            tracing::warn!("no API keys configured; bearer auth disabled in development");
        }
        Ok(Self {
            api_keys: Arc::new(api_keys),
        })
    }

    fn is_enabled(&self) -> bool {
        !self.api_keys.is_empty()
    }

    fn allows(&self, token: &str) -> bool {
        self.api_keys.contains(token)
    }
}

#[derive(Debug, Clone, Copy)]
struct ClientWindow {
    started_at: Instant,
    count: usize,
}

/// Fixed-window limiter keyed by caller.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    clients: Arc<Mutex<HashMap<String, ClientWindow>>>,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            clients: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// `AppConfig::rate_limit_per_minute` requests per client per minute.
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.rate_limit_per_minute, Duration::from_secs(60))
    }

    /// Counts one request for `client`. A rejection carries the time left
    /// until that client's window resets.
    async fn admit(&self, client: &str) -> Result<(), Duration> {
        let now = Instant::now();
        let window = self.window;
        let mut clients = self.clients.lock().await;

        if clients.len() >= MAX_TRACKED_CLIENTS && !clients.contains_key(client) {
            clients.retain(|_, w| now.duration_since(w.started_at) < window);
        }

        let entry = clients.entry(client.to_owned()).or_insert(ClientWindow {
            started_at: now,
            count: 0,
        });
        if now.duration_since(entry.started_at) >= window {
            *entry = ClientWindow {
                started_at: now,
                count: 0,
            };
        }

        if entry.count >= self.max_requests {
            return Err(window.saturating_sub(now.duration_since(entry.started_at)));
        }
        entry.count += 1;
        Ok(())
    }
}

/// Same `{error, code}` shape handlers emit, minus the envelope meta.
#[derive(Debug, Serialize)]
struct MiddlewareErrorBody {
    error: &'static str,
    code: &'static str,
}

fn reject(status: StatusCode, code: &'static str, error: &'static str) -> Response {
    (status, Json(MiddlewareErrorBody { error, code })).into_response()
}

/// Tags each request with an ID. A well-formed inbound `x-request-id` is
/// reused, anything else is replaced by a `UUIDv4`. The ID is echoed on the
/// response.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|v| is_usable_request_id(v))
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));
    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert(REQUEST_ID_HEADER, val);
    }
    res
}

fn is_usable_request_id(value: &str) -> bool {
    !value.is_empty()
        && value.len() <= MAX_REQUEST_ID_LEN
        && value.bytes().all(|b| b.is_ascii_graphic())
}

pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(req).await;
    }
    match extract_bearer_token(req.headers().get(header::AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => reject(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ),
    }
}

/// Rejects with 429 and `Retry-After` once a client spends its window.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    let client = client_key(req.headers());
    match rate_limit.admit(&client).await {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::debug!(retry_after_ms = retry_after.as_millis(), "client rate limit hit");
            let mut res = reject(
                StatusCode::TOO_MANY_REQUESTS,
                "rate_limited",
                "rate limit exceeded",
            );
            let secs = retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0);
            res.headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs.max(1)));
            res
        }
    }
}

/// Bearer token when present, else the first `x-forwarded-for` hop.
fn client_key(headers: &HeaderMap) -> String {
    if let Some(token) = extract_bearer_token(headers.get(header::AUTHORIZATION)) {
        return format!("key:{token}");
    }
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .map_or_else(|| "anonymous".to_owned(), |ip| format!("ip:{ip}"))
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
