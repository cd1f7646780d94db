//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as `{"code", "message", "timestamp"}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use chrono::{SecondsFormat, Utc};
use promo_core::ErrorKind;
use serde_json::json;
use thiserror::Error;

/// Challenge sent with every 401.
pub const WWW_AUTHENTICATE: &str = r#"Basic realm="promo""#;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Domain(#[from] promo_core::Error),

  /// Malformed body or query string, or a field that failed validation.
  #[error("{0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthorized,
}

impl ApiError {
  fn status_and_code(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::Domain(e) => match e.kind() {
        ErrorKind::NotFound => (StatusCode::NOT_FOUND, "RESOURCE_NOT_FOUND"),
        ErrorKind::Conflict => (StatusCode::CONFLICT, "CONFLICT"),
        ErrorKind::Validation => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
        ErrorKind::Internal => {
          (StatusCode::INTERNAL_SERVER_ERROR, "SERVER_ERROR")
        }
      },
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<validator::ValidationErrors> for ApiError {
  fn from(errors: validator::ValidationErrors) -> Self {
    ApiError::BadRequest(errors.to_string())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = self.status_and_code();
    let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
      tracing::error!(error = %self, "request failed");
      "internal server error".to_owned()
    } else {
      self.to_string()
    };

    let body = Json(json!({
      "code": code,
      "message": message,
      "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    }));

    if matches!(self, ApiError::Unauthorized) {
      (status, [(header::WWW_AUTHENTICATE, WWW_AUTHENTICATE)], body).into_response()
    } else {
      (status, body).into_response()
    }
  }
}
