//! Bearer-token sessions: password hashing, token issue, and the middleware
//! that turns an `Authorization` header into an [`ActorContext`].
//!
//! | Method   | Path        | Notes |
//! |----------|-------------|-------|
//! | `POST`   | `/sessions` | Body: `{"username":…,"password":…}` |
//! | `DELETE` | `/sessions` | Ends the caller's session, 204 |

use argon2::{
  Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
  Extension, Json,
  extract::{Request, State},
  http::{HeaderMap, StatusCode, header},
  middleware::Next,
  response::Response,
};
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, TimeDelta, Utc};
use rand_core::{OsRng, RngCore};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use showcase_core::{
  ActorContext, Role,
  store::Platform,
  user::{Session, User},
};

use crate::{AppState, error::ApiError};

// ─── Secrets ─────────────────────────────────────────────────────────────────

/// Hash a password into an argon2 PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
  let salt = SaltString::generate(&mut OsRng);
  Argon2::default()
    .hash_password(password.as_bytes(), &salt)
    .map(|h| h.to_string())
    .map_err(|e| ApiError::Store(format!("argon2 error: {e}").into()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
  let Ok(parsed) = PasswordHash::new(phc) else {
    return false;
  };
  Argon2::default()
    .verify_password(password.as_bytes(), &parsed)
    .is_ok()
}

/// A fresh session token: 32 random bytes, base64url without padding.
pub fn issue_token() -> String {
  let mut bytes = [0u8; 32];
  OsRng.fill_bytes(&mut bytes);
  URL_SAFE_NO_PAD.encode(bytes)
}

/// What the store keeps in place of the token itself.
pub fn hash_token(token: &str) -> String { hex::encode(Sha256::digest(token.as_bytes())) }

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
  headers
    .get(header::AUTHORIZATION)
    .and_then(|v| v.to_str().ok())
    .and_then(|v| v.strip_prefix("Bearer "))
    .map(str::trim)
    .filter(|t| !t.is_empty())
}

// ─── Middleware ──────────────────────────────────────────────────────────────

/// Resolve the bearer token and attach the caller's [`ActorContext`] to the
/// request. Rejects with 401 when the token is missing, unknown or expired.
pub async fn require_session<S>(
  State(state): State<AppState<S>>,
  mut req: Request,
  next: Next,
) -> Result<Response, ApiError>
where
  S: Platform,
{
  let token_hash = bearer_token(req.headers())
    .map(hash_token)
    .ok_or(ApiError::Unauthorized)?;

  let actor = state
    .store
    .resolve_session(token_hash, Utc::now())
    .await
    .map_err(ApiError::store)?;

  let Some(actor) = actor else {
    tracing::warn!(path = %req.uri().path(), "rejected unknown or expired session");
    return Err(ApiError::Unauthorized);
  };

  req.extensions_mut().insert(actor);
  Ok(next.run(req).await)
}

/// Role gate for the admin console. Runs inside [`require_session`].
pub async fn require_admin(
  Extension(actor): Extension<ActorContext>,
  req: Request,
  next: Next,
) -> Result<Response, ApiError> {
  if let Err(e) = actor.require(Role::Admin) {
    tracing::warn!(actor = %actor.id, path = %req.uri().path(), "non-admin on admin route");
    return Err(e.into());
  }
  Ok(next.run(req).await)
}

// ─── Login / logout ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct LoginBody {
  pub username: String,
  pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
  pub token:      String,
  pub user:       User,
  pub expires_at: DateTime<Utc>,
}

/// `POST /sessions`
pub async fn login<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<LoginBody>,
) -> Result<Json<LoginResponse>, ApiError>
where
  S: Platform,
{
  let credentials = state
    .store
    .find_credentials(body.username.clone())
    .await
    .map_err(ApiError::store)?;

  let Some((user, _)) =
    credentials.filter(|(_, phc)| verify_password(&body.password, phc))
  else {
    tracing::warn!(username = %body.username, "failed login");
    return Err(ApiError::Unauthorized);
  };

  let token = issue_token();
  let now = Utc::now();
  let expires_at = now + TimeDelta::hours(state.settings.session_ttl_hours);

  state
    .store
    .open_session(Session {
      token_hash: hash_token(&token),
      user_id:    user.user_id,
      created_at: now,
      expires_at,
    })
    .await
    .map_err(ApiError::store)?;

  tracing::info!(user_id = %user.user_id, "session opened");
  Ok(Json(LoginResponse {
    token,
    user,
    expires_at,
  }))
}

/// `DELETE /sessions`
pub async fn logout<S>(
  State(state): State<AppState<S>>,
  headers: HeaderMap,
) -> Result<StatusCode, ApiError>
where
  S: Platform,
{
  let token_hash = bearer_token(&headers)
    .map(hash_token)
    .ok_or(ApiError::Unauthorized)?;

  state
    .store
    .close_session(token_hash)
    .await
    .map_err(ApiError::store)?;
  Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
  use axum::http::HeaderValue;

  use super::*;

  #[test]
  fn tokens_are_unique_and_url_safe() {
    let a = issue_token();
    let b = issue_token();
    assert_ne!(a, b);
    assert_eq!(a.len(), 43);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
  }

  #[test]
  fn token_hash_is_sha256_hex() {
    let h = hash_token("abc");
    assert_eq!(
      h,
      "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
  }

  #[test]
  fn password_round_trip() {
    let phc = hash_password("hunter2").unwrap();
    assert!(verify_password("hunter2", &phc));
    assert!(!verify_password("hunter3", &phc));
    assert!(!verify_password("hunter2", "not a phc string"));
  }

  #[test]
  fn bearer_parsing() {
    let mut headers = HeaderMap::new();
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic abc"));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
    assert_eq!(bearer_token(&headers), None);

    headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer tok"));
    assert_eq!(bearer_token(&headers), Some("tok"));
  }
}
