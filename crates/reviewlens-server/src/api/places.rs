use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use reviewlens_providers::ResolutionResult;
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{json_body, map_pipeline_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct ResolveRequest {
    pub input: String,
}

/// Offline normalization first; the place lookup only runs for free text.
/// Lookup failures come back as `data.error`, not as an HTTP error.
pub(super) async fn resolve_place(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<ResolveRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<ResolutionResult>>, ApiError> {
    let request = json_body(&req_id.0, body)?;
    let resolution = state
        .pipeline
        .resolve_place(&request.input)
        .await
        .map_err(|e| map_pipeline_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: resolution,
        meta: ResponseMeta::new(req_id.0),
    }))
}
