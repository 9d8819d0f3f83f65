use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use reviewlens_providers::ReviewFetch;
use reviewlens_summary::{Analysis, SummaryError};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{
    json_body, map_pipeline_error, parse_period, ApiError, ApiResponse, AppState, ResponseMeta,
    ReviewsRequest,
};

/// Reviews plus their summary. A summarizer failure leaves the reviews
/// intact and reports the failure in `analysis_error`.
#[derive(Debug, Serialize)]
pub(super) struct AnalyzedReviews {
    #[serde(flatten)]
    pub fetch: ReviewFetch,
    pub analysis: Option<Analysis>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_error: Option<String>,
}

pub(super) async fn analyze_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ReviewsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AnalyzedReviews>>, ApiError> {
    let request = json_body(&req_id.0, body)?;
    let period = parse_period(&req_id.0, request.period.as_ref())?;

    let fetch = state
        .pipeline
        .resolve_and_fetch(&request.input, period)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    let outcome = match &state.summarizer {
        Some(summarizer) => summarizer.analyze(&fetch.reviews).await,
        None => Err(SummaryError::ConfigurationMissing {
            var: "OPENAI_API_KEY",
        }),
    };

    let (analysis, analysis_error) = match outcome {
        Ok(analysis) => (Some(analysis), None),
        Err(e) => {
            tracing::warn!(error = %e, code = e.kind().as_str(), "summarization failed");
            (None, Some(e.to_string()))
        }
    };

    Ok(Json(ApiResponse {
        data: AnalyzedReviews {
            fetch,
            analysis,
            analysis_error,
        },
        meta: ResponseMeta::new(req_id.0),
    }))
}
