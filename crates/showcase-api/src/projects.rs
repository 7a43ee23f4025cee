//! Handlers for `/projects` and `/comments` endpoints.
//!
//! | Method          | Path | Notes |
//! |-----------------|------|-------|
//! | `GET`           | `/projects` | `?owner_id=&tag=&text=&limit=&offset=`; live projects only |
//! | `POST`          | `/projects` | Body: [`NewProject`] |
//! | `GET`           | `/projects/deleted` | Caller's soft-deleted projects with `time_remaining_ms` |
//! | `GET`           | `/projects/{id}` | 404 if deleted |
//! | `POST`          | `/projects/{id}/delete` | Owner only |
//! | `POST`          | `/projects/{id}/restore` | Whoever deleted it, within 24h |
//! | `POST`/`DELETE` | `/projects/{id}/like` | Returns `{"like_count":n}` |
//! | `POST`          | `/projects/{id}/share` | Returns `{"share_count":n}` |
//! | `GET`/`POST`    | `/projects/{id}/comments` | Body: `{"body":…}` |
//! | `DELETE`        | `/comments/{id}` | Author or admin, 204 |

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use showcase_core::{
  ActorContext, Authority,
  lifecycle::Trashed,
  project::{Comment, NewProject, Project, ProjectQuery},
  store::Platform,
};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

// ─── Read ────────────────────────────────────────────────────────────────────

/// `GET /projects`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(query): Query<ProjectQuery>,
) -> Result<Json<Vec<Project>>, ApiError>
where
  S: Platform,
{
  let projects = state
    .store
    .list_projects(query)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(projects))
}

/// `GET /projects/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: Platform,
{
  let project = state
    .store
    .get_project(id, false)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("project not found: {id}")))?;
  Ok(Json(project))
}

/// `GET /projects/deleted`
pub async fn list_deleted<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
) -> Result<Json<Vec<Trashed<Project>>>, ApiError>
where
  S: Platform,
{
  let now = Utc::now();
  let projects = state
    .store
    .list_deleted_projects(Some(actor.id))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(
    projects
      .into_iter()
      .filter_map(|p| Trashed::new(p, now))
      .collect(),
  ))
}

// ─── Write ───────────────────────────────────────────────────────────────────

/// `POST /projects`
pub async fn create<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Json(body): Json<NewProject>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Platform,
{
  let project = state
    .store
    .create_project(actor.id, body, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(project)))
}

/// `POST /projects/{id}/delete`
pub async fn soft_delete<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: Platform,
{
  let project = state
    .store
    .soft_delete_project(id, actor, Authority::Owner, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(project))
}

/// `POST /projects/{id}/restore`
pub async fn restore<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: Platform,
{
  let project = state
    .store
    .restore_project(id, actor, Authority::Owner, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(project))
}

// ─── Engagement ──────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct LikeCount {
  pub like_count: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShareCount {
  pub share_count: u64,
}

/// `POST /projects/{id}/like`
pub async fn like<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<LikeCount>, ApiError>
where
  S: Platform,
{
  let like_count = state
    .store
    .like_project(id, actor.id, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(LikeCount { like_count }))
}

/// `DELETE /projects/{id}/like`
pub async fn unlike<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<LikeCount>, ApiError>
where
  S: Platform,
{
  let like_count = state
    .store
    .unlike_project(id, actor.id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(LikeCount { like_count }))
}

/// `POST /projects/{id}/share`
pub async fn share<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<ShareCount>, ApiError>
where
  S: Platform,
{
  let share_count = state
    .store
    .share_project(id, actor.id, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(ShareCount { share_count }))
}

// ─── Comments ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CommentBody {
  pub body: String,
}

/// `GET /projects/{id}/comments`
pub async fn list_comments<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Comment>>, ApiError>
where
  S: Platform,
{
  let comments = state
    .store
    .list_comments(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(comments))
}

/// `POST /projects/{id}/comments`
pub async fn add_comment<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
  Json(body): Json<CommentBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Platform,
{
  let comment = state
    .store
    .add_comment(id, actor.id, body.body, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

/// `DELETE /comments/{id}`
pub async fn delete_comment<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Platform,
{
  state
    .store
    .delete_comment(id, actor)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}
