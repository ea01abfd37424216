//! Chat endpoint handler

use axum::{
  extract::{Extension, Json, State},
  http::StatusCode,
  response::Json as ResponseJson,
};

use crate::errors::ChatError;
use crate::server::handlers::{error_response, HandlerResult};
use crate::server::middleware::{AppState, RequestContext};
use crate::server::services::assistant::Reply;
use crate::server::types::{BaseResponse, ChatRequest, ChatResponse};

/// POST /chat - Answer one question from the indexed schemes
pub async fn chat(
  State(state): State<AppState>,
  Extension(context): Extension<RequestContext>,
  Json(request): Json<ChatRequest>,
) -> HandlerResult<ChatResponse> {
  let transaction_id = context.request_id;

  match state.assistant.respond(&request.message).await {
    Ok(Reply::Answer(text)) => {
      context.log_success("Chat reply generated", "chat-api").await;
      Ok(ResponseJson(BaseResponse::success(ChatResponse { response: text }, transaction_id)))
    }
    Ok(reply @ Reply::BackendFailure(_)) => {
      context.log_warn(&reply.text(), "chat-api").await;
      Err(error_response(StatusCode::BAD_GATEWAY, "llm_backend_failed", &reply.text(), transaction_id))
    }
    Err(ChatError::EmptyMessage) => Err(error_response(
      StatusCode::BAD_REQUEST,
      "empty_message",
      &ChatError::EmptyMessage.to_string(),
      transaction_id,
    )),
    Err(e @ ChatError::Store(_)) => {
      context.log_error(&format!("Chat failed: {e}"), "chat-api").await;
      Err(error_response(
        StatusCode::SERVICE_UNAVAILABLE,
        "store_unavailable",
        &e.to_string(),
        transaction_id,
      ))
    }
  }
}
