//! Health endpoint handler

use axum::response::Json;
use uuid::Uuid;

use crate::server::types::{BaseResponse, HealthResponse};

pub const SERVICE_MESSAGE: &str = "Government Scheme Assistant API";

/// GET / - Health check endpoint
pub async fn health() -> Json<BaseResponse<HealthResponse>> {
  let response = HealthResponse {
    status: "running".to_string(),
    message: SERVICE_MESSAGE.to_string(),
    version: env!("CARGO_PKG_VERSION").to_string(),
  };

  Json(BaseResponse::success(response, Uuid::new_v4()))
}
