//! Admin console. Every route here sits behind [`crate::auth::require_admin`];
//! purges and role changes additionally require a super-admin, which the
//! store enforces.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/admin/reports` | `?status=open\|resolved\|dismissed` |
//! | `POST`   | `/admin/reports/{id}/resolve` | Body: `{"status","note"?}` |
//! | `GET`    | `/admin/projects/deleted` | Every soft-deleted project |
//! | `POST`   | `/admin/projects/{id}/delete`, `/restore` | Moderator path, audited |
//! | `DELETE` | `/admin/projects/{id}/permanent` | Super-admin, 204 |
//! | `POST`   | `/admin/messages/{id}/delete` | Moderator path; returns the restoration token |
//! | `POST`   | `/admin/messages/restore` | Moderator path. Body: `{"restoration_token":…}` |
//! | `DELETE` | `/admin/messages/{id}/permanent` | Super-admin, 204 |
//! | `GET`    | `/admin/activity` | `?limit=` (default 100) |
//! | `PUT`    | `/admin/users/{id}/role` | Super-admin. Body: `{"role":…}` |

use axum::{
  Extension, Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use chrono::Utc;
use serde::Deserialize;
use showcase_core::{
  ActorContext, Authority, Role,
  chat::{ChatMessage, DeletedMessage},
  lifecycle::Trashed,
  moderation::{ActivityEntry, Report, ReportStatus},
  project::Project,
  store::Platform,
  user::User,
};
use uuid::Uuid;

use crate::{AppState, chats::RestoreBody, error::ApiError};

const DEFAULT_ACTIVITY_LIMIT: usize = 100;

// ─── Reports ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReportFilter {
  pub status: Option<ReportStatus>,
}

/// `GET /admin/reports`
pub async fn list_reports<S>(
  State(state): State<AppState<S>>,
  Query(filter): Query<ReportFilter>,
) -> Result<Json<Vec<Report>>, ApiError>
where
  S: Platform,
{
  let reports = state
    .store
    .list_reports(filter.status)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(reports))
}

#[derive(Debug, Deserialize)]
pub struct ResolveBody {
  pub status: ReportStatus,
  pub note:   Option<String>,
}

/// `POST /admin/reports/{id}/resolve`
pub async fn resolve_report<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
  Json(body): Json<ResolveBody>,
) -> Result<Json<Report>, ApiError>
where
  S: Platform,
{
  let report = state
    .store
    .resolve_report(id, actor, body.status, body.note, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(report))
}

// ─── Projects ────────────────────────────────────────────────────────────────

/// `GET /admin/projects/deleted`
pub async fn list_deleted_projects<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<Vec<Trashed<Project>>>, ApiError>
where
  S: Platform,
{
  let now = Utc::now();
  let projects = state
    .store
    .list_deleted_projects(None)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(
    projects
      .into_iter()
      .filter_map(|p| Trashed::new(p, now))
      .collect(),
  ))
}

/// `POST /admin/projects/{id}/delete`
pub async fn delete_project<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: Platform,
{
  let project = state
    .store
    .soft_delete_project(id, actor, Authority::Moderator, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(project))
}

/// `POST /admin/projects/{id}/restore`
pub async fn restore_project<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<Project>, ApiError>
where
  S: Platform,
{
  let project = state
    .store
    .restore_project(id, actor, Authority::Moderator, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(project))
}

/// `DELETE /admin/projects/{id}/permanent`
pub async fn purge_project<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Platform,
{
  state
    .store
    .purge_project(id, actor, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Messages ────────────────────────────────────────────────────────────────

/// `POST /admin/messages/{id}/delete`
pub async fn delete_message<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<Json<DeletedMessage>, ApiError>
where
  S: Platform,
{
  let deleted = state
    .store
    .delete_message(id, actor, Authority::Moderator, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(deleted))
}

/// `POST /admin/messages/restore`
pub async fn restore_message<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Json(body): Json<RestoreBody>,
) -> Result<Json<ChatMessage>, ApiError>
where
  S: Platform,
{
  let message = state
    .store
    .restore_message(body.restoration_token, actor, Authority::Moderator, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(message))
}

/// `DELETE /admin/messages/{id}/permanent`
pub async fn purge_message<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Platform,
{
  state
    .store
    .purge_message(id, actor, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

// ─── Audit log & roles ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActivityParams {
  pub limit: Option<usize>,
}

/// `GET /admin/activity`
pub async fn list_activity<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ActivityParams>,
) -> Result<Json<Vec<ActivityEntry>>, ApiError>
where
  S: Platform,
{
  let entries = state
    .store
    .list_activity(params.limit.unwrap_or(DEFAULT_ACTIVITY_LIMIT))
    .await
    .map_err(ApiError::store)?;
  Ok(Json(entries))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  pub role: Role,
}

/// `PUT /admin/users/{id}/role`
pub async fn set_role<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
  Json(body): Json<RoleBody>,
) -> Result<Json<User>, ApiError>
where
  S: Platform,
{
  let user = state
    .store
    .set_role(id, body.role, actor, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(user))
}
