//! `POST /reports`: any signed-in user can flag a project, user or message.
//! Body: `{"target":{"kind":"project","id":…},"reason":…}`.

use axum::{
  Extension, Json,
  extract::State,
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use showcase_core::{ActorContext, moderation::NewReport, store::Platform};

use crate::{AppState, error::ApiError};

/// `POST /reports`
pub async fn file<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Json(body): Json<NewReport>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Platform,
{
  let report = state
    .store
    .file_report(actor.id, body, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(report)))
}
