//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error body is `{"error": "<message>", "code": "<machine code>"}`.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use murmur_core::CursorError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("authentication required")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("invalid cursor: {0}")]
  InvalidCursor(#[from] CursorError),

  #[error("malformed identifier: {0:?}")]
  MalformedIdentifier(String),

  /// A store call failed or timed out. The request may be retried.
  #[error("store unavailable: {0}")]
  Unavailable(#[source] murmur_core::Error),
}

impl From<murmur_core::Error> for ApiError {
  fn from(err: murmur_core::Error) -> Self {
    match err {
      murmur_core::Error::InvalidCursor(e) => Self::InvalidCursor(e),
      murmur_core::Error::MalformedIdentifier(raw) => Self::MalformedIdentifier(raw),
      other => Self::Unavailable(other),
    }
  }
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) | Self::InvalidCursor(_) | Self::MalformedIdentifier(_) => {
        StatusCode::BAD_REQUEST
      }
      Self::Unauthenticated => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
  }

  pub fn code(&self) -> &'static str {
    match self {
      Self::NotFound(_) => "not_found",
      Self::BadRequest(_) => "bad_request",
      Self::Unauthenticated => "unauthenticated",
      Self::Forbidden(_) => "forbidden",
      Self::InvalidCursor(_) => "invalid_cursor",
      Self::MalformedIdentifier(_) => "malformed_identifier",
      Self::Unavailable(_) => "unavailable",
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let code = self.code();

    let message = match &self {
      // Store details stay in the logs.
      Self::Unavailable(e) => {
        error!(error = %e, "request failed on the store");
        "the service is temporarily unavailable, retry shortly".to_owned()
      }
      other => other.to_string(),
    };

    let mut res = (status, Json(json!({ "error": message, "code": code }))).into_response();
    if status == StatusCode::SERVICE_UNAVAILABLE {
      res.headers_mut().insert(header::RETRY_AFTER, HeaderValue::from_static("1"));
    }
    res
  }
}
