//! Storage traits, one per entity family.
//!
//! Backends (e.g. `showcase-store-sqlite`) implement all four; higher layers
//! depend on the [`Platform`] bound rather than any concrete backend.
//!
//! Every mutation takes the request time as `at` so callers (and tests)
//! control the clock. Soft-delete transitions must be applied as a single
//! conditional update so that concurrent callers observe exactly one winner.

use std::future::Future;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{
  actor::{ActorContext, Authority, Role},
  chat::{Chat, ChatMessage, DeletedMessage},
  error::StoreError,
  moderation::{ActivityEntry, NewReport, Report, ReportStatus},
  project::{Comment, NewProject, Project, ProjectQuery},
  user::{NewUser, Session, User, UserProfile},
};

/// Shared supertrait carrying the backend error type.
pub trait Store: Send + Sync {
  type Error: StoreError;
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub trait UserStore: Store {
  /// Fails with `Conflict` if the username is taken.
  fn add_user(
    &self,
    input: NewUser,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Look up a user by username together with their password hash.
  fn find_credentials(
    &self,
    username: String,
  ) -> impl Future<Output = Result<Option<(User, String)>, Self::Error>> + Send + '_;

  fn open_session(
    &self,
    session: Session,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// The actor behind a live session, or `None` if unknown or expired.
  fn resolve_session(
    &self,
    token_hash: String,
    now: DateTime<Utc>,
  ) -> impl Future<Output = Result<Option<ActorContext>, Self::Error>> + Send + '_;

  fn close_session(
    &self,
    token_hash: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Idempotent. Following yourself is `InvalidInput`.
  fn follow(
    &self,
    follower: Uuid,
    followee: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Idempotent.
  fn unfollow(
    &self,
    follower: Uuid,
    followee: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn list_followers(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn list_following(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  fn profile(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Option<UserProfile>, Self::Error>> + Send + '_;
}

// ─── Projects ────────────────────────────────────────────────────────────────

pub trait ProjectStore: Store {
  fn create_project(
    &self,
    owner_id: Uuid,
    input: NewProject,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Soft-deleted projects are only returned when `include_deleted` is set.
  fn get_project(
    &self,
    id: Uuid,
    include_deleted: bool,
  ) -> impl Future<Output = Result<Option<Project>, Self::Error>> + Send + '_;

  /// Live projects only, newest first.
  fn list_projects(
    &self,
    query: ProjectQuery,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + '_;

  /// Soft-deleted projects, optionally restricted to those deleted by one
  /// actor. Never-deleted projects are never included.
  fn list_deleted_projects(
    &self,
    deleted_by: Option<Uuid>,
  ) -> impl Future<Output = Result<Vec<Project>, Self::Error>> + Send + '_;

  /// Errors: `NotFound`, `AlreadyDeleted`, `Forbidden`. The moderator path
  /// appends an audit entry in the same transaction.
  fn soft_delete_project(
    &self,
    id: Uuid,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Errors: `NotFound`, `NotDeleted`, `Forbidden`, `WindowExpired`.
  fn restore_project(
    &self,
    id: Uuid,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Project, Self::Error>> + Send + '_;

  /// Irreversibly remove a project and everything attached to it. Requires
  /// [`Role::SuperAdmin`].
  fn purge_project(
    &self,
    id: Uuid,
    actor: ActorContext,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Idempotent; returns the like count afterwards.
  fn like_project(
    &self,
    id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Idempotent; returns the like count afterwards.
  fn unlike_project(
    &self,
    id: Uuid,
    user_id: Uuid,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Returns the share count afterwards.
  fn share_project(
    &self,
    id: Uuid,
    user_id: Uuid,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  fn add_comment(
    &self,
    project_id: Uuid,
    author_id: Uuid,
    body: String,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  /// Oldest first.
  fn list_comments(
    &self,
    project_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Comment>, Self::Error>> + Send + '_;

  /// The author or an admin may delete a comment.
  fn delete_comment(
    &self,
    comment_id: Uuid,
    actor: ActorContext,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Chats ───────────────────────────────────────────────────────────────────

pub trait ChatStore: Store {
  /// `participants` need not include `creator`; it is added.
  fn create_chat(
    &self,
    creator: Uuid,
    participants: Vec<Uuid>,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Chat, Self::Error>> + Send + '_;

  fn get_chat(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Chat>, Self::Error>> + Send + '_;

  fn list_chats(
    &self,
    user_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Chat>, Self::Error>> + Send + '_;

  /// Only participants may post.
  fn send_message(
    &self,
    chat_id: Uuid,
    sender: ActorContext,
    body: String,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<ChatMessage, Self::Error>> + Send + '_;

  /// Any message by id, deleted or not.
  fn get_message(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<ChatMessage>, Self::Error>> + Send + '_;

  /// Live messages in position order. Participants (and admins) only.
  fn list_messages(
    &self,
    chat_id: Uuid,
    actor: ActorContext,
  ) -> impl Future<Output = Result<Vec<ChatMessage>, Self::Error>> + Send + '_;

  /// Soft-delete a message in place and issue a restoration token. The owner
  /// path requires the actor to be the sender.
  fn delete_message(
    &self,
    message_id: Uuid,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<DeletedMessage, Self::Error>> + Send + '_;

  /// Consume a restoration token. On the owner path the actor must be the one
  /// who deleted the message and must still be a participant of its chat
  /// (admins are exempt from the participant check). The moderator path skips
  /// both checks and is audited. A consumed token is `NotFound`.
  fn restore_message(
    &self,
    restoration_token: String,
    actor: ActorContext,
    authority: Authority,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<ChatMessage, Self::Error>> + Send + '_;

  fn list_deleted_messages(
    &self,
    deleted_by: Uuid,
  ) -> impl Future<Output = Result<Vec<DeletedMessage>, Self::Error>> + Send + '_;

  /// Requires [`Role::SuperAdmin`].
  fn purge_message(
    &self,
    message_id: Uuid,
    actor: ActorContext,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;
}

// ─── Moderation ──────────────────────────────────────────────────────────────

pub trait ModerationStore: Store {
  fn file_report(
    &self,
    reporter_id: Uuid,
    input: NewReport,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_reports(
    &self,
    status: Option<ReportStatus>,
  ) -> impl Future<Output = Result<Vec<Report>, Self::Error>> + Send + '_;

  /// Admin only; `status` must not be `Open`. Logged.
  fn resolve_report(
    &self,
    report_id: Uuid,
    actor: ActorContext,
    status: ReportStatus,
    note: Option<String>,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<Report, Self::Error>> + Send + '_;

  /// Newest first.
  fn list_activity(
    &self,
    limit: usize,
  ) -> impl Future<Output = Result<Vec<ActivityEntry>, Self::Error>> + Send + '_;

  /// Requires [`Role::SuperAdmin`]. Logged.
  fn set_role(
    &self,
    user_id: Uuid,
    role: Role,
    actor: ActorContext,
    at: DateTime<Utc>,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;
}

/// Everything the HTTP layer needs from a backend.
pub trait Platform: UserStore + ProjectStore + ChatStore + ModerationStore {}

impl<T> Platform for T where T: UserStore + ProjectStore + ChatStore + ModerationStore {}
