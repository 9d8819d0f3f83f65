use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use reviewlens_providers::ReviewFetch;

use crate::middleware::RequestId;

use super::{
    json_body, map_pipeline_error, parse_period, ApiError, ApiResponse, AppState, ResponseMeta,
    ReviewsRequest,
};

pub(super) async fn fetch_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ReviewsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ReviewFetch>>, ApiError> {
    let request = json_body(&req_id.0, body)?;
    // Validated before any network call.
    let period = parse_period(&req_id.0, request.period.as_ref())?;

    let fetch = state
        .pipeline
        .resolve_and_fetch(&request.input, period)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    tracing::info!(
        provider = %fetch.provider,
        count = fetch.reviews.len(),
        period = period.as_str(),
        "reviews fetched"
    );

    Ok(Json(ApiResponse {
        data: fetch,
        meta: ResponseMeta::new(req_id.0),
    }))
}
