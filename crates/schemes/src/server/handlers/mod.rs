//! HTTP endpoint handlers

use axum::{http::StatusCode, response::Json};
use uuid::Uuid;

use crate::server::types::{ApiError, BaseResponse};

pub mod chat;
pub mod logs;
pub mod schemes;
pub mod status;

/// Error half of every fallible handler
pub type HandlerError = (StatusCode, Json<BaseResponse<()>>);

/// Result type shared by handlers returning data of type `T`
pub type HandlerResult<T> = Result<Json<BaseResponse<T>>, HandlerError>;

pub(crate) fn error_response(
  status: StatusCode,
  key: &str,
  message: &str,
  transaction_id: Uuid,
) -> HandlerError {
  let error = ApiError::new(key, message);
  (status, Json(BaseResponse::<()>::error(vec![error], transaction_id)))
}
