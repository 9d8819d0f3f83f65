mod analysis;
mod places;
mod reviews;

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use reviewlens_core::{ProviderKind, ReviewPeriod};
use reviewlens_providers::{PipelineError, ReviewPipeline};
use reviewlens_summary::Summarizer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<ReviewPipeline>,
    pub summarizer: Option<Arc<dyn Summarizer>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Error payload: a human-readable `error`, a machine `code`, and optional
/// `details` such as per-provider attempt outcomes.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
    pub code: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    providers: Vec<ProviderKind>,
    summarizer: &'static str,
}

/// Body shared by the review-fetching endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct ReviewsRequest {
    pub input: String,
    #[serde(default)]
    pub period: Option<Value>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            details: None,
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    fn status(&self) -> StatusCode {
        match self.code.as_str() {
            "malformed_input" => StatusCode::BAD_REQUEST,
            "not_found" | "no_reviews_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "provider_error" => StatusCode::BAD_GATEWAY,
            "timeout" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status(), Json(self)).into_response()
    }
}

pub(super) fn map_pipeline_error(request_id: String, error: &PipelineError) -> ApiError {
    match error {
        PipelineError::MalformedInput(_) => tracing::debug!(error = %error, "rejected input"),
        _ => tracing::warn!(error = %error, "review pipeline failed"),
    }
    let api_error = ApiError::new(request_id, error.kind().as_str(), error.to_string());
    if error.attempts().is_empty() {
        return api_error;
    }
    match serde_json::to_value(error.attempts()) {
        Ok(attempts) => api_error.with_details(serde_json::json!({ "attempts": attempts })),
        Err(_) => api_error,
    }
}

/// Unwraps a JSON body, turning axum's rejection into a `malformed_input`
/// error in the usual envelope.
pub(super) fn json_body<T>(
    request_id: &str,
    body: Result<Json<T>, JsonRejection>,
) -> Result<T, ApiError> {
    body.map(|Json(value)| value)
        .map_err(|rejection| ApiError::new(request_id, "malformed_input", rejection.body_text()))
}

/// Accepts `"30"`, `30`, or `"all"`; a missing period means 90 days.
pub(super) fn parse_period(request_id: &str, raw: Option<&Value>) -> Result<ReviewPeriod, ApiError> {
    let text = match raw {
        None | Some(Value::Null) => return Ok(ReviewPeriod::Days90),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    };
    text.parse::<ReviewPeriod>()
        .map_err(|e| ApiError::new(request_id, "malformed_input", e.to_string()))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/api/v1/places/resolve", post(places::resolve_place))
        .route("/api/v1/reviews", post(reviews::fetch_reviews))
        .route("/api/v1/analyze", post(analysis::analyze_reviews))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    Json(ApiResponse {
        data: HealthData {
            status: "ok",
            providers: state.pipeline.provider_kinds(),
            summarizer: if state.summarizer.is_some() {
                "configured"
            } else {
                "unconfigured"
            },
        },
        meta: ResponseMeta::new(req_id.0),
    })
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
