//! Scheme listing and search handlers

use axum::{
  extract::{Extension, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};

use crate::server::handlers::{error_response, HandlerResult};
use crate::server::middleware::{AppState, RequestContext};
use crate::server::services::scheme_store::DEFAULT_RESULTS;
use crate::server::types::{
  BaseResponse, ListSchemesResponse, SearchRequest, SearchResponse, SearchResultData,
};

/// GET /schemes - Every indexed scheme
pub async fn list_schemes(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
) -> HandlerResult<ListSchemesResponse> {
  match state.assistant.store().list_all().await {
    Ok(schemes) => {
      let response = ListSchemesResponse { total: schemes.len(), schemes };
      Ok(ResponseJson(BaseResponse::success(response, context.request_id)))
    }
    Err(e) => {
      context.log_error(&format!("Failed to list schemes: {e}"), "schemes-api").await;
      Err(error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "store_unavailable",
        &e.to_string(),
        context.request_id,
      ))
    }
  }
}

/// POST /schemes/search - Ranked schemes for a free-text query
pub async fn search_schemes(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<SearchRequest>,
) -> HandlerResult<SearchResponse> {
  if request.query.trim().is_empty() {
    return Err(error_response(
      StatusCode::BAD_REQUEST,
      "empty_query",
      "Query cannot be empty",
      context.request_id,
    ));
  }

  let k = request.k.unwrap_or(DEFAULT_RESULTS);
  match state.assistant.store().search_scored(&request.query, k).await {
    Ok(hits) => {
      let results: Vec<SearchResultData> = hits
        .into_iter()
        .map(|hit| SearchResultData { scheme: hit.record, score: hit.similarity })
        .collect();
      let count = results.len();
      context.log_info(&format!("Search returned {count} schemes"), "schemes-api").await;
      Ok(ResponseJson(BaseResponse::success(SearchResponse { results, count }, context.request_id)))
    }
    Err(e) => {
      context.log_error(&format!("Search failed: {e}"), "schemes-api").await;
      Err(error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "store_unavailable",
        &e.to_string(),
        context.request_id,
      ))
    }
  }
}
