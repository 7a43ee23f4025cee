//! JSON REST API for Showcase.
//!
//! Exposes an axum [`Router`] backed by any [`Platform`] store. Bearer
//! sessions are resolved by [`auth::require_session`]; everything under
//! `/admin` additionally passes through [`auth::require_admin`].
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", showcase_api::api_router(state))
//! ```

pub mod admin;
pub mod auth;
pub mod chats;
pub mod error;
pub mod projects;
pub mod reports;
pub mod users;

use std::sync::Arc;

use axum::{
  Router, middleware,
  routing::{delete, get, post, put},
};
use showcase_core::store::Platform;

pub use error::ApiError;

// ─── Application state ────────────────────────────────────────────────────────

/// Knobs the handlers need from the server configuration.
#[derive(Debug, Clone)]
pub struct Settings {
  pub session_ttl_hours: i64,
}

impl Default for Settings {
  fn default() -> Self { Self { session_ttl_hours: 24 * 7 } }
}

/// Shared state threaded through all handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub settings: Arc<Settings>,
}

impl<S> AppState<S> {
  pub fn new(store: S, settings: Settings) -> Self {
    Self {
      store:    Arc::new(store),
      settings: Arc::new(settings),
    }
  }
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      settings: Arc::clone(&self.settings),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: Platform + 'static,
{
  let admin = Router::new()
    .route("/admin/reports", get(admin::list_reports::<S>))
    .route("/admin/reports/{id}/resolve", post(admin::resolve_report::<S>))
    .route("/admin/projects/deleted", get(admin::list_deleted_projects::<S>))
    .route("/admin/projects/{id}/delete", post(admin::delete_project::<S>))
    .route("/admin/projects/{id}/restore", post(admin::restore_project::<S>))
    .route("/admin/projects/{id}/permanent", delete(admin::purge_project::<S>))
    .route("/admin/messages/{id}/delete", post(admin::delete_message::<S>))
    .route("/admin/messages/restore", post(admin::restore_message::<S>))
    .route("/admin/messages/{id}/permanent", delete(admin::purge_message::<S>))
    .route("/admin/activity", get(admin::list_activity::<S>))
    .route("/admin/users/{id}/role", put(admin::set_role::<S>))
    .route_layer(middleware::from_fn(auth::require_admin));

  let authenticated = Router::new()
    // Users
    .route("/users/{id}", get(users::profile::<S>))
    .route(
      "/users/{id}/follow",
      post(users::follow::<S>).delete(users::unfollow::<S>),
    )
    .route("/users/{id}/followers", get(users::followers::<S>))
    .route("/users/{id}/following", get(users::following::<S>))
    // Projects
    .route("/projects", get(projects::list::<S>).post(projects::create::<S>))
    .route("/projects/deleted", get(projects::list_deleted::<S>))
    .route("/projects/{id}", get(projects::get_one::<S>))
    .route("/projects/{id}/delete", post(projects::soft_delete::<S>))
    .route("/projects/{id}/restore", post(projects::restore::<S>))
    .route(
      "/projects/{id}/like",
      post(projects::like::<S>).delete(projects::unlike::<S>),
    )
    .route("/projects/{id}/share", post(projects::share::<S>))
    .route(
      "/projects/{id}/comments",
      get(projects::list_comments::<S>).post(projects::add_comment::<S>),
    )
    .route("/comments/{id}", delete(projects::delete_comment::<S>))
    // Chats
    .route("/chats", get(chats::list::<S>).post(chats::create::<S>))
    .route(
      "/chats/{id}/messages",
      get(chats::list_messages::<S>).post(chats::send_message::<S>),
    )
    .route(
      "/chats/{id}/messages/{message_id}/delete",
      post(chats::delete_message::<S>),
    )
    .route("/chat/deleted-messages", get(chats::list_deleted_messages::<S>))
    .route("/chat/restore-message", post(chats::restore_message::<S>))
    // Reports
    .route("/reports", post(reports::file::<S>))
    .merge(admin)
    .route_layer(middleware::from_fn_with_state(
      state.clone(),
      auth::require_session::<S>,
    ));

  Router::new()
    .route("/users", post(users::register::<S>))
    .route("/sessions", post(auth::login::<S>).delete(auth::logout::<S>))
    .merge(authenticated)
    .with_state(state)
}
