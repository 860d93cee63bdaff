//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use quorum_core::Error;
use serde_json::json;

/// An error returned by an API handler. Thin wrapper so the engine's
/// taxonomy can cross the axum boundary with a stable status mapping.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
  fn from(e: Error) -> Self {
    ApiError(e)
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self.0 {
      Error::Unauthenticated       => StatusCode::UNAUTHORIZED,
      Error::PermissionDenied(_)   => StatusCode::FORBIDDEN,
      Error::InvalidArgument(_)    => StatusCode::BAD_REQUEST,
      Error::NotFound(_)           => StatusCode::NOT_FOUND,
      Error::CapacityExceeded { .. } => StatusCode::CONFLICT,
      Error::Unavailable(_)        => StatusCode::SERVICE_UNAVAILABLE,
    };
    if status == StatusCode::SERVICE_UNAVAILABLE {
      tracing::error!(error = %self.0, "backend unavailable");
    }
    (status, Json(json!({ "error": self.0.to_string() }))).into_response()
  }
}
