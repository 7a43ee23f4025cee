//! Handlers for `/users` endpoints.
//!
//! | Method          | Path | Notes |
//! |-----------------|------|-------|
//! | `POST`          | `/users` | Register. Body: `{"username","password","display_name"?,"bio"?}` |
//! | `GET`           | `/users/{id}` | Profile with counters |
//! | `POST`/`DELETE` | `/users/{id}/follow` | Idempotent, 204 |
//! | `GET`           | `/users/{id}/followers`, `/users/{id}/following` | |

use axum::{
  Extension, Json,
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use showcase_core::{
  ActorContext, Role,
  store::Platform,
  user::{NewUser, User, UserProfile},
};
use uuid::Uuid;

use crate::{AppState, auth::hash_password, error::ApiError};

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub username:     String,
  pub password:     String,
  pub display_name: Option<String>,
  pub bio:          Option<String>,
}

/// `POST /users`
pub async fn register<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: Platform,
{
  let username = body.username.trim().to_owned();
  if username.is_empty() || body.password.is_empty() {
    return Err(ApiError::BadRequest(
      "username and password are required".to_owned(),
    ));
  }

  let user = state
    .store
    .add_user(
      NewUser {
        display_name:  body.display_name.unwrap_or_else(|| username.clone()),
        username,
        bio:           body.bio,
        password_hash: hash_password(&body.password)?,
        role:          Role::User,
      },
      Utc::now(),
    )
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Profile ─────────────────────────────────────────────────────────────────

/// `GET /users/{id}`
pub async fn profile<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<UserProfile>, ApiError>
where
  S: Platform,
{
  let profile = state
    .store
    .profile(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("user not found: {id}")))?;
  Ok(Json(profile))
}

// ─── Follow graph ────────────────────────────────────────────────────────────

/// `POST /users/{id}/follow`
pub async fn follow<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Platform,
{
  state
    .store
    .follow(actor.id, id, Utc::now())
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /users/{id}/follow`
pub async fn unfollow<S>(
  State(state): State<AppState<S>>,
  Extension(actor): Extension<ActorContext>,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: Platform,
{
  state
    .store
    .unfollow(actor.id, id)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

/// `GET /users/{id}/followers`
pub async fn followers<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: Platform,
{
  let users = state
    .store
    .list_followers(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(users))
}

/// `GET /users/{id}/following`
pub async fn following<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<User>>, ApiError>
where
  S: Platform,
{
  let users = state
    .store
    .list_following(id)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(users))
}
