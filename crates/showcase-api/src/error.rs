//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use showcase_core::{Error as CoreError, StoreError};
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("missing or invalid session")]
  Unauthorized,

  #[error("{0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  /// The record exists but is in the wrong lifecycle state (already
  /// deleted, not deleted, restore window closed).
  #[error("{0}")]
  InvalidState(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a backend error, surfacing the domain error behind it if any.
  pub fn store<E: StoreError>(err: E) -> Self {
    match err.as_core() {
      Some(core) => Self::from_core(core),
      None => Self::Store(Box::new(err)),
    }
  }

  fn from_core(err: &CoreError) -> Self {
    let message = err.to_string();
    match err {
      CoreError::NotFound(..) => Self::NotFound(message),
      CoreError::AlreadyDeleted(..)
      | CoreError::NotDeleted(..)
      | CoreError::WindowExpired(..) => Self::InvalidState(message),
      CoreError::Forbidden(_) => Self::Forbidden(message),
      CoreError::Conflict(_) => Self::Conflict(message),
      CoreError::InvalidInput(_) => Self::BadRequest(message),
    }
  }
}

impl From<CoreError> for ApiError {
  fn from(err: CoreError) -> Self { Self::from_core(&err) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::InvalidState(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        StatusCode::INTERNAL_SERVER_ERROR
      }
    };

    let mut res = (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res
        .headers_mut()
        .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
    }
    res
  }
}
